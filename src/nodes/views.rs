//! Canvas, scroll views and page views

use serde_json::{json, Value};

use super::base::{base_properties, start, walk_children};
use super::props::{copy, number_value, Kind};
use crate::classify::Variant;
use crate::context::ConversionContext;
use crate::document::{CanonicalNode, FitPolicy, Properties};
use crate::error::Result;
use crate::record::Record;
use crate::resolver::Size;

const SPRITE_SLICED: i64 = 1;

/// Plain container that also sets the document's design resolution.
pub(super) fn build_canvas(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::Canvas)?;

    if let Some(canvas) = ctx.require_component(index, record, Variant::Canvas, "cc.Canvas") {
        if let Some(resolution) = canvas.field("_designResolution") {
            let dim = |key: &str| resolution.get(key).and_then(Value::as_f64).unwrap_or(0.0);
            ctx.state.design_resolution = Some(Size { w: dim("width"), h: dim("height") });
        }
        ctx.state.fit_policy = Some(FitPolicy {
            fit_width: canvas.bool_field("_fitWidth").unwrap_or(false),
            fit_height: canvas.bool_field("_fitHeight").unwrap_or(false),
        });
    }

    let children = ctx.records().children(record);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

/// Scroll view whose children are those of its content holder.
pub(super) fn build_scroll_view(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::ScrollView)?;
    let records = ctx.records();

    copy(record, "_color", "backgroundImageColor", Kind::Rgb, &mut out.properties);
    if let Some(sprite) = records.component(record, "cc.Sprite") {
        if let Some(name) = sprite.uuid_ref("_spriteFrame").and_then(|uuid| ctx.sprite_frame_name(uuid)) {
            out.set("backgroundImage", name);
        }
        out.set("backgroundImageScale9Enabled", sprite.i64_field("_type") == Some(SPRITE_SLICED));
    }

    let Some(scroll) = ctx.require_component(index, record, Variant::ScrollView, "cc.ScrollView") else {
        return Ok(out);
    };
    let horizontal = scroll.bool_field("horizontal").unwrap_or(false);
    let vertical = scroll.bool_field("vertical").unwrap_or(false);
    let direction = match (horizontal, vertical) {
        (true, true) => "Both",
        (true, false) => "Horizontal",
        (false, true) => "Vertical",
        (false, false) => "None",
    };
    out.set("direction", direction);
    copy(scroll, "elastic", "bounceEnabled", Kind::Value, &mut out.properties);

    let Some((_, content)) = records.follow(scroll, "content") else {
        ctx.incomplete(index, Variant::ScrollView, "content node reference missing");
        return Ok(out);
    };
    copy(content, "_contentSize", "innerContainerSize", Kind::Size, &mut out.properties);

    let offset = content_offset(content);
    let translate = move |child: &mut CanonicalNode| {
        if let Some(Value::Object(position)) = child.base.get_mut("position") {
            for (axis, delta) in [("x", offset.0), ("y", offset.1)] {
                if let Some(v) = position.get(axis).and_then(Value::as_f64) {
                    position.insert(axis.to_string(), number_value(v + delta));
                }
            }
        }
    };
    let children = records.children(content);
    walk_children(ctx, &mut out.children, &children, Some(&translate))?;
    Ok(out)
}

/// `contentSize * anchorPoint` of the content holder.
fn content_offset(content: &Record) -> (f64, f64) {
    let get = |field: &str, key: &str| {
        content.field(field).and_then(|v| v.get(key)).and_then(Value::as_f64).unwrap_or(0.0)
    };
    (
        get("_contentSize", "width") * get("_anchorPoint", "x"),
        get("_contentSize", "height") * get("_anchorPoint", "y"),
    )
}

/// Frame reference as `{spriteFrame, spriteFrameFromTP}`; standalone frames
/// are loaded by path and get the asset prefix.
fn page_frame(ctx: &mut ConversionContext<'_, '_>, uuid: &str, into: &mut Properties) {
    let Some(name) = ctx.sprite_frame_name(uuid) else {
        return;
    };
    let from_atlas = ctx.is_atlas_frame(uuid).unwrap_or(false);
    let name = if from_atlas { name } else { ctx.prefixed(&name) };
    into.insert("spriteFrame".to_string(), json!(name));
    into.insert("spriteFrameFromTP".to_string(), json!(from_atlas));
}

pub(super) fn build_page_view(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::PageView)?;
    let records = ctx.records();
    let mut consumed = Vec::new();

    if let Some(page_view) = ctx.require_component(index, record, Variant::PageView, "cc.PageView") {
        copy(page_view, "inertia", "inertia", Kind::Value, &mut out.properties);
        copy(page_view, "elastic", "bounceEnabled", Kind::Value, &mut out.properties);
        let direction = if page_view.i64_field("_N$direction") == Some(0) { "Horizontal" } else { "Vertical" };
        out.set("direction", direction);

        // indicator
        match records.follow(page_view, "_N$indicator") {
            Some((_, indicator)) => {
                let mut props = Properties::new();
                copy(indicator, "spacing", "space", Kind::Value, &mut props);
                if let Some((node_index, node)) = records.follow(indicator, "node") {
                    let size = |key: &str| {
                        out.base.get("contentSize").and_then(|s| s.get(key)).and_then(Value::as_f64).unwrap_or(0.0)
                    };
                    let position = |key: &str| {
                        node.field("_position").and_then(|p| p.get(key)).and_then(Value::as_f64).unwrap_or(0.0)
                    };
                    let (w, h) = (size("w"), size("h"));
                    if w != 0.0 && h != 0.0 {
                        props.insert(
                            "positionAnchor".to_string(),
                            json!({ "x": 0.5 + position("x") / w, "y": 0.5 + position("y") / h }),
                        );
                    }
                    consumed.push(node_index);
                }
                match indicator.uuid_ref("spriteFrame") {
                    Some(uuid) => page_frame(ctx, uuid, &mut props),
                    None => log::info!("page view {}: indicator has no sprite frame", index),
                }
                out.set("indicator", Value::Object(props));
            }
            None => ctx.incomplete(index, Variant::PageView, "missing indicator reference"),
        }

        // pages
        match records.follow(page_view, "content") {
            Some((_, content)) => {
                let mut pages = Vec::new();
                for page_index in records.children(content) {
                    let page_node = records.get(page_index)?;
                    let mut page = Properties::new();
                    if let Some(sprite) = records.component(page_node, "cc.Sprite") {
                        page.insert("scale9Enabled".to_string(), json!(sprite.i64_field("_type") == Some(SPRITE_SLICED)));
                        match sprite.uuid_ref("_spriteFrame") {
                            Some(uuid) => page_frame(ctx, uuid, &mut page),
                            None => log::info!("page view {}: page {} has no sprite frame", index, page_index),
                        }
                    }
                    page.insert("node".to_string(), Value::Object(base_properties(ctx, page_node)));
                    pages.push(Value::Object(page));
                }
                out.set("pages", Value::Array(pages));
                if let Some(view) = content.index_ref("_parent") {
                    consumed.push(view);
                }
            }
            None => ctx.incomplete(index, Variant::PageView, "content node reference missing"),
        }

        // the first child is taken as the background
        if let Some(&background) = records.children(record).first() {
            let background_node = records.get(background)?;
            if let Some(uuid) = records
                .component(background_node, "cc.Sprite")
                .and_then(|sprite| sprite.uuid_ref("_spriteFrame"))
            {
                let mut props = Properties::new();
                page_frame(ctx, uuid, &mut props);
                if !props.is_empty() {
                    out.set("background", Value::Object(props));
                }
            }
            consumed.push(background);
        }
    }

    let children: Vec<usize> = records.children(record).into_iter().filter(|c| !consumed.contains(c)).collect();
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::assets::{AssetEntry, MemoryAssetIndex};
    use crate::context::{ConversionContext, ConversionState};
    use crate::document::{CanonicalNode, FitPolicy};
    use crate::record::RecordStore;
    use crate::resolver::{sub_meta_table, ResourceResolver, Size};
    use serde_json::{json, Value};

    fn frame_index() -> MemoryAssetIndex {
        let mut index = MemoryAssetIndex::new();
        index.insert_asset(
            "tex",
            AssetEntry::new("/p/assets/ui/page.png", "/p/assets")
                .with_sub_metas(sub_meta_table([("page", json!({ "uuid": "frame", "width": 8, "height": 8 }))])),
        );
        index.insert_asset("frame", AssetEntry::new("/p/assets/ui/page.png", "/p/assets").with_import("/lib/frame.json"));
        index.insert_json("/lib/frame.json", &json!({ "content": { "texture": "tex", "atlas": "" } }));
        index
    }

    fn build(index: &MemoryAssetIndex, records: Value) -> (CanonicalNode, ConversionState<'_>) {
        let records = RecordStore::from_value(records).unwrap();
        let mut state = ConversionState::new(ResourceResolver::new(index), "res");
        let node = {
            let mut ctx = ConversionContext::new(&records, &mut state);
            crate::nodes::build_node(&mut ctx, 0).unwrap()
        };
        (node, state)
    }

    #[test]
    fn test_canvas_records_resolution() {
        let index = MemoryAssetIndex::new();
        let (node, state) = build(
            &index,
            json!([
                { "__type__": "cc.Node", "_name": "Canvas", "_components": [{ "__id__": 1 }] },
                { "__type__": "cc.Canvas", "_designResolution": { "width": 960, "height": 640 }, "_fitWidth": true }
            ]),
        );
        assert_eq!(node.variant.object_type(), "Node");
        assert_eq!(state.design_resolution, Some(Size { w: 960.0, h: 640.0 }));
        assert_eq!(state.fit_policy, Some(FitPolicy { fit_width: true, fit_height: false }));
    }

    #[test]
    fn test_scroll_view_without_content() {
        let index = MemoryAssetIndex::new();
        let (node, state) = build(
            &index,
            json!([
                { "__type__": "cc.Node", "_components": [{ "__id__": 1 }], "_children": [{ "__id__": 2 }] },
                { "__type__": "cc.ScrollView", "horizontal": true, "vertical": true, "elastic": true },
                { "__type__": "cc.Node", "_name": "view" }
            ]),
        );
        assert_eq!(node.get("direction"), Some(&json!("Both")));
        assert_eq!(node.get("bounceEnabled"), Some(&json!(true)));
        assert!(node.children.is_empty());
        assert_eq!(state.warnings.len(), 1);
    }

    #[test]
    fn test_page_view_consumes_structure() {
        let index = frame_index();
        let (node, state) = build(
            &index,
            json!([
                { "__type__": "cc.Node", "_contentSize": { "width": 200, "height": 100 },
                  "_components": [{ "__id__": 1 }],
                  "_children": [{ "__id__": 2 }, { "__id__": 3 }, { "__id__": 6 }, { "__id__": 10 }] },
                { "__type__": "cc.PageView", "_N$direction": 0, "inertia": true,
                  "content": { "__id__": 4 }, "_N$indicator": { "__id__": 7 } },
                { "__type__": "cc.Node", "_name": "background", "_components": [{ "__id__": 8 }] },
                { "__type__": "cc.Node", "_name": "view", "_children": [{ "__id__": 4 }] },
                { "__type__": "cc.Node", "_name": "content", "_parent": { "__id__": 3 }, "_children": [{ "__id__": 5 }] },
                { "__type__": "cc.Node", "_name": "p1", "_components": [{ "__id__": 9 }] },
                { "__type__": "cc.Node", "_name": "indicator", "_position": { "x": 0, "y": -25 },
                  "_components": [{ "__id__": 7 }] },
                { "__type__": "cc.PageViewIndicator", "node": { "__id__": 6 }, "spacing": 5,
                  "spriteFrame": { "__uuid__": "frame" } },
                { "__type__": "cc.Sprite", "_spriteFrame": { "__uuid__": "frame" } },
                { "__type__": "cc.Sprite", "_spriteFrame": { "__uuid__": "frame" }, "_type": 1 },
                { "__type__": "cc.Node", "_name": "overlay" }
            ]),
        );

        assert_eq!(node.get("direction"), Some(&json!("Horizontal")));
        assert_eq!(node.get("inertia"), Some(&json!(true)));

        let indicator = node.get("indicator").unwrap();
        assert_eq!(indicator["space"], 5);
        assert_eq!(indicator["positionAnchor"], json!({ "x": 0.5, "y": 0.25 }));
        assert_eq!(indicator["spriteFrame"], "res/ui/page.png");
        assert_eq!(indicator["spriteFrameFromTP"], false);

        let pages = node.get("pages").and_then(Value::as_array).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0]["scale9Enabled"], true);
        assert_eq!(pages[0]["node"]["name"], "p1");

        assert_eq!(node.get("background"), Some(&json!({ "spriteFrame": "res/ui/page.png", "spriteFrameFromTP": false })));
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].base["name"], "overlay");
        assert!(state.warnings.is_empty());
    }
}
