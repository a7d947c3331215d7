//! Interactive controls: buttons, progress bars, sliders, toggles, edit boxes
//!
//! Several controls are drawn by child nodes the runtime widget creates on its
//! own (slider handle, toggle background and check mark, progress bar fill).
//! Those children are read for their properties and left out of the output.

use serde_json::Value;

use super::base::{start, walk_children};
use super::props::{copy, copy_all, enum_name, number_value, Kind};
use crate::classify::Variant;
use crate::context::ConversionContext;
use crate::document::CanonicalNode;
use crate::error::Result;
use crate::record::Record;

const RETURN_TYPES: &[&str] = &["Default", "Done", "Send", "Search", "Go"];
const INPUT_FLAGS: &[&str] = &[
    "Password",
    "Sensitive",
    "InitialCapsWord",
    "InitialCapsSentence",
    "InitialCapsAllCharacters",
    "LowercaseAllCharacters",
];
const INPUT_MODES: &[&str] = &["Any", "EmailAddress", "Numeric", "PhoneNumber", "URL", "Decime", "SingleLine"];

const TRANSITION_COLOR: i64 = 1;
const TRANSITION_SPRITE: i64 = 2;
const TRANSITION_SCALE: i64 = 3;

/// Frame lookup name for a uuid-reference field of a component.
fn frame_name(ctx: &mut ConversionContext<'_, '_>, component: &Record, field: &str) -> Option<String> {
    component.uuid_ref(field).and_then(|uuid| ctx.sprite_frame_name(uuid))
}

/// Same as [`frame_name`] with the asset prefix in front.
fn prefixed_frame(ctx: &mut ConversionContext<'_, '_>, component: &Record, field: &str) -> Option<String> {
    frame_name(ctx, component, field).map(|name| ctx.prefixed(&name))
}

/// `_N$progress` as a percentage.
fn percent(component: &Record, out: &mut CanonicalNode) {
    if let Some(progress) = component.f64_field("_N$progress") {
        out.set("percent", number_value(progress * 100.0));
    }
}

fn without(children: Vec<usize>, removed: &[usize]) -> Vec<usize> {
    children.into_iter().filter(|c| !removed.contains(c)).collect()
}

pub(super) fn build_button(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::Button)?;
    let records = ctx.records();

    out.set("ignoreContentAdaptWithSize", false);
    if let Some(sprite) = records.component(record, "cc.Sprite") {
        if let Some(name) = frame_name(ctx, sprite, "_spriteFrame") {
            out.set("spriteFrameName", name);
        }
    }

    if let Some(button) = ctx.require_component(index, record, Variant::Button, "cc.Button") {
        copy(button, "transition", "transition", Kind::Value, &mut out.properties);
        match button.i64_field("transition") {
            Some(TRANSITION_COLOR) => log::info!("button {}: color transition is not supported", index),
            Some(TRANSITION_SCALE) => copy(button, "zoomScale", "zoomScale", Kind::Value, &mut out.properties),
            Some(TRANSITION_SPRITE) => {
                if let Some(name) = frame_name(ctx, button, "pressedSprite") {
                    out.set("pressedSpriteFrameName", name);
                }
                if let Some(name) = frame_name(ctx, button, "_N$disabledSprite") {
                    out.set("disabledSpriteFrameName", name);
                }
            }
            _ => {}
        }
    }

    let children = records.children(record);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

pub(super) fn build_progress_bar(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::ProgressBar)?;
    let records = ctx.records();
    let mut consumed = Vec::new();

    if let Some(background) = records.component(record, "cc.Sprite") {
        if let Some(name) = prefixed_frame(ctx, background, "_spriteFrame") {
            out.set("backgroundSpriteFrameName", name);
        }
    }

    if let Some(bar) = ctx.require_component(index, record, Variant::ProgressBar, "cc.ProgressBar") {
        percent(bar, &mut out);
        if let Some((_, bar_sprite)) = records.follow(bar, "_N$barSprite") {
            if let Some(name) = prefixed_frame(ctx, bar_sprite, "_spriteFrame") {
                out.set("barSpriteFrameName", name);
            }
            copy(bar_sprite, "_type", "barSpriteType", Kind::Value, &mut out.properties);
            if let Some(node) = bar_sprite.index_ref("node") {
                consumed.push(node);
            }
        }
        copy(bar, "_N$reverse", "reverse", Kind::Value, &mut out.properties);
    }

    let children = without(records.children(record), &consumed);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

pub(super) fn build_slider(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::Slider)?;
    let records = ctx.records();
    let mut consumed = Vec::new();

    if let Some(slider) = ctx.require_component(index, record, Variant::Slider, "cc.Slider") {
        percent(slider, &mut out);
        match records.follow(slider, "_N$handle") {
            Some((_, handle_button)) => {
                for (field, key) in [
                    ("_N$normalSprite", "normalTexturePath"),
                    ("_N$disabledSprite", "disabledTexturePath"),
                    ("pressedSprite", "pressedTexturePath"),
                ] {
                    if let Some(path) = prefixed_frame(ctx, handle_button, field) {
                        out.set(key, path);
                    }
                }
                match records.follow(handle_button, "_N$target") {
                    Some((handle, handle_node)) => {
                        copy(handle_node, "_contentSize", "ballSize", Kind::Size, &mut out.properties);
                        consumed.push(handle);
                    }
                    None => ctx.incomplete(index, Variant::Slider, "handle button has no target node"),
                }
            }
            None => ctx.incomplete(index, Variant::Slider, "missing handle reference"),
        }
    }

    let children = without(records.children(record), &consumed);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

pub(super) fn build_toggle(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::Toggle)?;
    let records = ctx.records();
    let mut consumed = Vec::new();

    if let Some(toggle) = ctx.require_component(index, record, Variant::Toggle, "cc.Toggle") {
        copy_all(
            toggle,
            &[
                ("interactable", "_N$interactable"),
                ("enableAutoGrayEffect", "_N$enableAutoGrayEffect"),
                ("isChecked", "_N$isChecked"),
            ],
            &mut out.properties,
        );

        match records.follow(toggle, "_N$target") {
            Some((background, background_node)) => {
                // background sprite is the first component, check mark the first child's
                if let Some(&first) = records.components(background_node).first() {
                    if let Some(path) = prefixed_frame(ctx, first, "_spriteFrame") {
                        out.set("backgroundSpritePath", path);
                    }
                }
                let check_mark = records
                    .children(background_node)
                    .first()
                    .and_then(|&i| records.get(i).ok())
                    .and_then(|node| records.components(node).first().copied());
                match check_mark {
                    Some(component) => {
                        if let Some(path) = prefixed_frame(ctx, component, "_spriteFrame") {
                            out.set("checkMarkSpritePath", path);
                        }
                    }
                    None => ctx.incomplete(index, Variant::Toggle, "background has no check mark child"),
                }
                consumed.push(background);
            }
            None => ctx.incomplete(index, Variant::Toggle, "missing background target"),
        }
    }

    let children = without(records.children(record), &consumed);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

pub(super) fn build_toggle_group(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::ToggleGroup)?;
    let records = ctx.records();

    if let Some(group) = ctx.require_component(index, record, Variant::ToggleGroup, "cc.ToggleGroup") {
        copy(group, "allowSwitchOff", "allowSwitchOff", Kind::Value, &mut out.properties);
    }

    let mut toggles = Vec::new();
    let mut remaining = Vec::new();
    for child in records.children(record) {
        let node = records.get(child)?;
        if records.component(node, "cc.Toggle").is_some() {
            toggles.push(Value::Object(build_toggle(ctx, child)?.object()));
        } else {
            remaining.push(child);
        }
    }
    out.set("toggles", Value::Array(toggles));

    walk_children(ctx, &mut out.children, &remaining, None)?;
    Ok(out)
}

pub(super) fn build_edit_box(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::EditBox)?;

    if let Some(edit_box) = ctx.require_component(index, record, Variant::EditBox, "cc.EditBox") {
        if edit_box.uuid_ref("_N$backgroundImage").is_none() {
            ctx.incomplete(index, Variant::EditBox, "a background image is required");
        }
        if let Some(name) = frame_name(ctx, edit_box, "_N$backgroundImage") {
            out.set("backgroundImage", name);
        }
        for (key, field, names) in [
            ("returnType", "_N$returnType", RETURN_TYPES),
            ("inputFlag", "_N$inputFlag", INPUT_FLAGS),
            ("inputMode", "_N$inputMode", INPUT_MODES),
        ] {
            if let Some(name) = enum_name(edit_box, field, names) {
                out.set(key, name);
            }
        }
        copy(edit_box, "_N$fontSize", "fontSize", Kind::Value, &mut out.properties);
        copy(edit_box, "_N$fontColor", "fontColor", Kind::Rgb, &mut out.properties);
        copy(edit_box, "_N$placeholder", "placeholder", Kind::Value, &mut out.properties);
        copy(edit_box, "_N$placeholderFontSize", "placeholderFontSize", Kind::Value, &mut out.properties);
        copy(edit_box, "_N$placeholderFontColor", "placeholderFontColor", Kind::Rgb, &mut out.properties);
        copy(edit_box, "_N$maxLength", "maxLength", Kind::Value, &mut out.properties);
        copy(edit_box, "_string", "text", Kind::Value, &mut out.properties);
    }

    let children = ctx.records().children(record);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::assets::{AssetEntry, MemoryAssetIndex};
    use crate::context::{ConversionContext, ConversionState};
    use crate::document::CanonicalNode;
    use crate::record::RecordStore;
    use crate::resolver::{sub_meta_table, ResourceResolver};
    use serde_json::{json, Value};

    fn frame_index() -> MemoryAssetIndex {
        let mut index = MemoryAssetIndex::new();
        index.insert_asset(
            "tex",
            AssetEntry::new("/p/assets/ui/btn.png", "/p/assets")
                .with_sub_metas(sub_meta_table([("btn", json!({ "uuid": "frame", "width": 8, "height": 8 }))])),
        );
        index.insert_asset("frame", AssetEntry::new("/p/assets/ui/btn.png", "/p/assets").with_import("/lib/frame.json"));
        index.insert_json("/lib/frame.json", &json!({ "content": { "texture": "tex", "atlas": "" } }));
        index
    }

    /// Build record 0 with asset prefix `res`; returns the node and the warning count.
    fn build(index: &MemoryAssetIndex, records: Value) -> (CanonicalNode, usize) {
        let records = RecordStore::from_value(records).unwrap();
        let mut state = ConversionState::new(ResourceResolver::new(index), "res");
        let node = {
            let mut ctx = ConversionContext::new(&records, &mut state);
            crate::nodes::build_node(&mut ctx, 0).unwrap()
        };
        (node, state.warnings.len())
    }

    #[test]
    fn test_button_sprite_transition() {
        let index = frame_index();
        let (node, warnings) = build(
            &index,
            json!([
                { "__type__": "cc.Node", "_components": [{ "__id__": 1 }, { "__id__": 2 }] },
                { "__type__": "cc.Sprite", "_spriteFrame": { "__uuid__": "frame" } },
                { "__type__": "cc.Button", "transition": 2, "pressedSprite": { "__uuid__": "frame" } }
            ]),
        );
        assert_eq!(node.get("ignoreContentAdaptWithSize"), Some(&json!(false)));
        assert_eq!(node.get("spriteFrameName"), Some(&json!("ui/btn.png")));
        assert_eq!(node.get("pressedSpriteFrameName"), Some(&json!("ui/btn.png")));
        assert_eq!(node.get("transition"), Some(&json!(2)));
        assert!(node.get("zoomScale").is_none());
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_progress_bar_consumes_bar_child() {
        let index = frame_index();
        let (node, warnings) = build(
            &index,
            json!([
                { "__type__": "cc.Node", "_components": [{ "__id__": 1 }, { "__id__": 2 }],
                  "_children": [{ "__id__": 3 }, { "__id__": 5 }] },
                { "__type__": "cc.ProgressBar", "_N$progress": 0.5, "_N$barSprite": { "__id__": 4 }, "_N$reverse": false },
                { "__type__": "cc.Sprite", "_spriteFrame": { "__uuid__": "frame" } },
                { "__type__": "cc.Node", "_name": "bar", "_components": [{ "__id__": 4 }] },
                { "__type__": "cc.Sprite", "node": { "__id__": 3 }, "_spriteFrame": { "__uuid__": "frame" }, "_type": 3 },
                { "__type__": "cc.Node", "_name": "caption" }
            ]),
        );
        assert_eq!(node.get("percent"), Some(&json!(50)));
        assert_eq!(node.get("backgroundSpriteFrameName"), Some(&json!("res/ui/btn.png")));
        assert_eq!(node.get("barSpriteFrameName"), Some(&json!("res/ui/btn.png")));
        assert_eq!(node.get("barSpriteType"), Some(&json!(3)));
        assert_eq!(node.get("reverse"), Some(&json!(false)));
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].base["name"], "caption");
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_slider_consumes_handle() {
        let index = frame_index();
        let (node, warnings) = build(
            &index,
            json!([
                { "__type__": "cc.Node", "_components": [{ "__id__": 1 }], "_children": [{ "__id__": 2 }] },
                { "__type__": "cc.Slider", "_N$progress": 0.25, "_N$handle": { "__id__": 3 } },
                { "__type__": "cc.Node", "_name": "handle", "_contentSize": { "width": 20, "height": 20 },
                  "_components": [{ "__id__": 3 }] },
                { "__type__": "cc.Button", "_N$normalSprite": { "__uuid__": "frame" }, "_N$target": { "__id__": 2 } }
            ]),
        );
        assert_eq!(node.get("percent"), Some(&json!(25)));
        assert_eq!(node.get("normalTexturePath"), Some(&json!("res/ui/btn.png")));
        assert_eq!(node.get("ballSize"), Some(&json!({ "w": 20, "h": 20 })));
        assert!(node.children.is_empty());
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_toggle_reads_background_and_check_mark() {
        let index = frame_index();
        let (node, warnings) = build(
            &index,
            json!([
                { "__type__": "cc.Node", "_components": [{ "__id__": 1 }], "_children": [{ "__id__": 2 }] },
                { "__type__": "cc.Toggle", "_N$isChecked": true, "_N$target": { "__id__": 2 } },
                { "__type__": "cc.Node", "_name": "Background", "_components": [{ "__id__": 3 }],
                  "_children": [{ "__id__": 4 }] },
                { "__type__": "cc.Sprite", "_spriteFrame": { "__uuid__": "frame" } },
                { "__type__": "cc.Node", "_name": "checkmark", "_components": [{ "__id__": 5 }] },
                { "__type__": "cc.Sprite", "_spriteFrame": { "__uuid__": "frame" } }
            ]),
        );
        assert_eq!(node.get("isChecked"), Some(&json!(true)));
        assert_eq!(node.get("backgroundSpritePath"), Some(&json!("res/ui/btn.png")));
        assert_eq!(node.get("checkMarkSpritePath"), Some(&json!("res/ui/btn.png")));
        assert!(node.children.is_empty());
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_toggle_group_collects_toggles() {
        let index = frame_index();
        let (node, _) = build(
            &index,
            json!([
                { "__type__": "cc.Node", "_components": [{ "__id__": 1 }],
                  "_children": [{ "__id__": 2 }, { "__id__": 3 }] },
                { "__type__": "cc.ToggleGroup", "allowSwitchOff": true },
                { "__type__": "cc.Node", "_name": "t1", "_components": [{ "__id__": 4 }] },
                { "__type__": "cc.Node", "_name": "plain" },
                { "__type__": "cc.Toggle", "_N$isChecked": true }
            ]),
        );
        assert_eq!(node.get("allowSwitchOff"), Some(&json!(true)));
        let toggles = node.get("toggles").and_then(Value::as_array).unwrap();
        assert_eq!(toggles.len(), 1);
        assert_eq!(toggles[0]["node"]["name"], "t1");
        assert_eq!(toggles[0]["isChecked"], true);
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].base["name"], "plain");
    }

    #[test]
    fn test_edit_box_enums_and_missing_background() {
        let index = frame_index();
        let (node, warnings) = build(
            &index,
            json!([
                { "__type__": "cc.Node", "_components": [{ "__id__": 1 }] },
                { "__type__": "cc.EditBox", "_N$returnType": 3, "_N$inputMode": 2, "_string": "hi", "_N$maxLength": 8 }
            ]),
        );
        assert_eq!(node.get("returnType"), Some(&json!("Search")));
        assert_eq!(node.get("inputMode"), Some(&json!("Numeric")));
        assert_eq!(node.get("text"), Some(&json!("hi")));
        assert_eq!(node.get("maxLength"), Some(&json!(8)));
        assert!(node.get("backgroundImage").is_none());
        assert_eq!(warnings, 1);
    }
}
