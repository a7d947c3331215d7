//! Base node properties and the shared child walk

use serde_json::{json, Value};

use super::props::{copy, Kind};
use crate::classify::Variant;
use crate::context::ConversionContext;
use crate::document::{CanonicalNode, Properties};
use crate::error::Result;
use crate::record::{Record, RecordStore};

/// Output name, source field and shape of every base property.
const NODE_FIELDS: &[(&str, &str, Kind)] = &[
    ("contentSize", "_contentSize", Kind::Size),
    ("enabled", "_active", Kind::Value),
    ("name", "_name", Kind::Value),
    ("anchorPoint", "_anchorPoint", Kind::Vec2),
    ("cascadeOpacityEnabled", "_cascadeOpacityEnabled", Kind::Value),
    ("color", "_color", Kind::Rgb),
    ("globalZOrder", "_globalZOrder", Kind::Value),
    ("localZOrder", "_localZOrder", Kind::Value),
    ("opacity", "_opacity", Kind::Value),
    ("opacityModifyRGB", "_opacityModifyRGB", Kind::Value),
    ("position", "_position", Kind::Vec2),
    ("rotationSkewX", "_rotationX", Kind::Value),
    ("rotationSkewY", "_rotationY", Kind::Value),
    ("scaleX", "_scaleX", Kind::Value),
    ("scaleY", "_scaleY", Kind::Value),
    ("skewX", "_skewX", Kind::Value),
    ("skewY", "_skewY", Kind::Value),
    ("tag", "_tag", Kind::Value),
    ("groupIndex", "groupIndex", Kind::Value),
];

const COLLIDER_TYPES: &[&str] = &["cc.BoxCollider", "cc.CircleCollider", "cc.PolygonCollider"];

/// Base properties of a node record, plus `anim` and `colliders` when the
/// node carries those components.
pub fn base_properties(ctx: &mut ConversionContext<'_, '_>, node: &Record) -> Properties {
    let mut props = Properties::new();
    for (target, source, kind) in NODE_FIELDS {
        copy(node, source, target, *kind, &mut props);
    }

    if let Some(anim) = animation(ctx, node) {
        props.insert("anim".to_string(), anim);
    }
    let colliders = colliders(ctx.records(), node);
    if !colliders.is_empty() {
        props.insert("colliders".to_string(), Value::Array(colliders));
    }
    props
}

fn animation(ctx: &mut ConversionContext<'_, '_>, node: &Record) -> Option<Value> {
    let component = ctx.records().component(node, "cc.Animation")?;

    let clips: Vec<Value> = component
        .uuid_refs("_clips")
        .into_iter()
        .filter_map(|uuid| ctx.clip_name(uuid))
        .map(Value::String)
        .collect();

    let mut anim = Properties::new();
    if let Some(play_on_load) = component.field("playOnLoad") {
        anim.insert("playOnLoad".to_string(), play_on_load.clone());
    }
    anim.insert("clips".to_string(), Value::Array(clips));
    if let Some(name) = component.uuid_ref("_defaultClip").and_then(|uuid| ctx.clip_name(uuid)) {
        anim.insert("defaultClip".to_string(), Value::String(name));
    }
    Some(Value::Object(anim))
}

fn colliders(records: &RecordStore, node: &Record) -> Vec<Value> {
    COLLIDER_TYPES
        .iter()
        .flat_map(|t| records.components_of_type(node, t))
        .map(collider)
        .collect()
}

fn collider(component: &Record) -> Value {
    let mut out = Properties::new();
    let offset = component.field("_offset").and_then(|v| super::convert(v, Kind::Vec2));
    out.insert("offset".to_string(), offset.unwrap_or_else(|| json!({ "x": 0, "y": 0 })));

    match component.record_type.as_str() {
        "cc.CircleCollider" => {
            out.insert("type".to_string(), json!("CircleCollider"));
            out.insert("radius".to_string(), component.field("_radius").cloned().unwrap_or(Value::Null));
        }
        "cc.PolygonCollider" => {
            out.insert("type".to_string(), json!("PolygonCollider"));
            let points: Vec<Value> = component
                .field("points")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|p| super::convert(p, Kind::Vec2))
                .collect();
            out.insert("points".to_string(), Value::Array(points));
        }
        _ => {
            out.insert("type".to_string(), json!("BoxCollider"));
            if let Some(size) = component.field("_size").and_then(|v| super::convert(v, Kind::Size)) {
                out.insert("size".to_string(), size);
            }
        }
    }
    Value::Object(out)
}

/// Record at `index` and a fresh node of `variant` carrying its base properties.
pub(super) fn start<'c>(
    ctx: &mut ConversionContext<'c, '_>,
    index: usize,
    variant: Variant,
) -> Result<(&'c Record, CanonicalNode)> {
    let record = ctx.records().get(index)?;
    let base = base_properties(ctx, record);
    Ok((record, CanonicalNode::new(variant, base)))
}

/// Generic container: base properties and every child.
pub(super) fn build_container(ctx: &mut ConversionContext<'_, '_>, index: usize, variant: Variant) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, variant)?;
    let children = ctx.records().children(record);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

/// Build every `cc.Node` among `children` into `out`, in order.
///
/// `adjust` runs on each built child. A child that also carries a motion
/// streak gets a MotionStreak node as its following sibling.
pub fn walk_children(
    ctx: &mut ConversionContext<'_, '_>,
    out: &mut Vec<CanonicalNode>,
    children: &[usize],
    adjust: Option<&dyn Fn(&mut CanonicalNode)>,
) -> Result<()> {
    let records = ctx.records();
    for &child in children {
        let record = records.get(child)?;
        if record.record_type != "cc.Node" {
            continue;
        }

        let mut built = super::build_node(ctx, child)?;
        if let Some(adjust) = adjust {
            adjust(&mut built);
        }
        out.push(built);

        if records.component(record, "cc.MotionStreak").is_some() {
            out.push(super::build_variant(ctx, child, Variant::MotionStreak)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetEntry, MemoryAssetIndex};
    use crate::context::ConversionState;
    use crate::error::ConvertError;
    use crate::resolver::ResourceResolver;

    fn with_ctx<T>(index: &MemoryAssetIndex, records: Value, f: impl FnOnce(&mut ConversionContext<'_, '_>) -> T) -> T {
        let records = RecordStore::from_value(records).unwrap();
        let mut state = ConversionState::new(ResourceResolver::new(index), "");
        let mut ctx = ConversionContext::new(&records, &mut state);
        f(&mut ctx)
    }

    #[test]
    fn test_base_field_table() {
        let index = MemoryAssetIndex::new();
        let props = with_ctx(
            &index,
            json!([{
                "__type__": "cc.Node",
                "_name": "hero",
                "_active": true,
                "_contentSize": { "__type__": "cc.Size", "width": 100, "height": 50 },
                "_anchorPoint": { "__type__": "cc.Vec2", "x": 0.5, "y": 0 },
                "_color": { "__type__": "cc.Color", "r": 255, "g": 128, "b": 0, "a": 255 },
                "_position": { "__type__": "cc.Vec2", "x": 10, "y": 20 },
                "_rotationX": 45,
                "groupIndex": 2
            }]),
            |ctx| {
                let node = ctx.records().get(0).unwrap();
                base_properties(ctx, node)
            },
        );
        assert_eq!(props["name"], "hero");
        assert_eq!(props["enabled"], true);
        assert_eq!(props["contentSize"], json!({ "w": 100, "h": 50 }));
        assert_eq!(props["color"], json!({ "r": 255, "g": 128, "b": 0 }));
        assert_eq!(props["position"], json!({ "x": 10, "y": 20 }));
        assert_eq!(props["rotationSkewX"], 45);
        assert_eq!(props["groupIndex"], 2);
        assert!(!props.contains_key("opacity"));
        assert!(!props.contains_key("anim"));
        assert!(!props.contains_key("colliders"));
    }

    #[test]
    fn test_colliders_in_type_order() {
        let index = MemoryAssetIndex::new();
        let props = with_ctx(
            &index,
            json!([
                { "__type__": "cc.Node", "_components": [{ "__id__": 1 }, { "__id__": 2 }, { "__id__": 3 }] },
                { "__type__": "cc.PolygonCollider", "_offset": { "x": 1, "y": 1 }, "points": [{ "x": 0, "y": 0 }, { "x": 5, "y": 0 }] },
                { "__type__": "cc.CircleCollider", "_offset": { "x": 0, "y": 0 }, "_radius": 8 },
                { "__type__": "cc.BoxCollider", "_offset": { "x": 0, "y": 2 }, "_size": { "width": 4, "height": 6 } }
            ]),
            |ctx| {
                let node = ctx.records().get(0).unwrap();
                base_properties(ctx, node)
            },
        );
        let colliders = props["colliders"].as_array().unwrap();
        assert_eq!(colliders[0], json!({ "offset": { "x": 0, "y": 2 }, "type": "BoxCollider", "size": { "w": 4, "h": 6 } }));
        assert_eq!(colliders[1]["radius"], 8);
        assert_eq!(colliders[2]["points"], json!([{ "x": 0, "y": 0 }, { "x": 5, "y": 0 }]));
    }

    #[test]
    fn test_animation_component() {
        let mut index = MemoryAssetIndex::new();
        index.insert_asset("walk", AssetEntry::new("/p/assets/walk.anim", "/p/assets").with_import("/lib/walk.json"));
        index.insert_json("/lib/walk.json", &json!({ "_name": "walk", "curveData": {} }));

        let (props, clips, warnings) = {
            let records = RecordStore::from_value(json!([
                { "__type__": "cc.Node", "_components": [{ "__id__": 1 }] },
                { "__type__": "cc.Animation", "playOnLoad": true,
                  "_clips": [{ "__uuid__": "walk" }, { "__uuid__": "gone" }],
                  "_defaultClip": { "__uuid__": "walk" } }
            ]))
            .unwrap();
            let mut state = ConversionState::new(ResourceResolver::new(&index), "");
            let mut ctx = ConversionContext::new(&records, &mut state);
            let node = records.get(0).unwrap();
            let props = base_properties(&mut ctx, node);
            (props, state.clips.len(), state.warnings.len())
        };
        assert_eq!(props["anim"], json!({ "playOnLoad": true, "clips": ["walk"], "defaultClip": "walk" }));
        assert_eq!(clips, 1);
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_child_cycle_is_malformed() {
        let index = MemoryAssetIndex::new();
        let result = with_ctx(
            &index,
            json!([
                { "__type__": "cc.Node", "_name": "root", "_children": [{ "__id__": 1 }] },
                { "__type__": "cc.Node", "_name": "loop", "_children": [{ "__id__": 0 }] }
            ]),
            |ctx| crate::nodes::build_node(ctx, 0),
        );
        assert!(matches!(result, Err(ConvertError::MalformedInput { index: Some(0), .. })));

        let result = with_ctx(
            &index,
            json!([{ "__type__": "cc.Node", "_children": [{ "__id__": 0 }] }]),
            |ctx| crate::nodes::build_node(ctx, 0),
        );
        assert!(matches!(result, Err(ConvertError::MalformedInput { index: Some(0), .. })));
    }

    #[test]
    fn test_shared_child_is_not_a_cycle() {
        let index = MemoryAssetIndex::new();
        let node = with_ctx(
            &index,
            json!([
                { "__type__": "cc.Node", "_children": [{ "__id__": 1 }, { "__id__": 2 }] },
                { "__type__": "cc.Node", "_children": [{ "__id__": 3 }] },
                { "__type__": "cc.Node", "_children": [{ "__id__": 3 }] },
                { "__type__": "cc.Node", "_name": "leaf" }
            ]),
            |ctx| crate::nodes::build_node(ctx, 0).unwrap(),
        );
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[1].children[0].base["name"], "leaf");
    }
}
