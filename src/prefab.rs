//! Prefab instance inlining
//!
//! A node with a `_prefab` marker and no `_components` field stands for a
//! copy of a prefab asset. The prefab file is a record array of its own; its
//! root is built under a context scoped to those records, then a small set
//! of instance properties (placement and naming) replaces the prefab's.

use crate::classify::Variant;
use crate::context::ConversionContext;
use crate::document::CanonicalNode;
use crate::error::{ConvertError, Result};
use crate::nodes::{self, convert, Kind};
use crate::record::RecordStore;

/// Base properties an instance overrides, as `(output, source, kind)`.
const INSTANCE_OVERRIDES: &[(&str, &str, Kind)] = &[
    ("contentSize", "_contentSize", Kind::Size),
    ("enabled", "_active", Kind::Value),
    ("name", "_name", Kind::Value),
    ("globalZOrder", "_globalZOrder", Kind::Value),
    ("localZOrder", "_localZOrder", Kind::Value),
    ("position", "_position", Kind::Vec2),
    ("rotationSkewX", "_rotationX", Kind::Value),
    ("rotationSkewY", "_rotationY", Kind::Value),
];

/// Build the prefab instanced by the node at `index`.
///
/// A prefab that cannot be loaded is reported and the instance is emitted as
/// a plain node; a prefab that instances itself fails the conversion.
pub fn inline_prefab(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let records = ctx.records();
    let instance = records.get(index)?;

    let asset = records
        .follow(instance, "_prefab")
        .and_then(|(_, info)| info.uuid_ref("asset"))
        .map(str::to_string);
    let Some(asset) = asset else {
        ctx.incomplete(index, Variant::Prefab, "prefab info has no asset");
        return fallback(ctx, index);
    };

    let prefab = match load_prefab(ctx, &asset) {
        Ok(prefab) => prefab,
        Err(e) => {
            ctx.warn(e);
            return fallback(ctx, index);
        }
    };
    let Some(root) = prefab.prefab_root() else {
        ctx.warn(ConvertError::sidecar(&asset, "prefab has no root node"));
        return fallback(ctx, index);
    };

    ctx.enter_prefab(&asset)?;
    log::debug!("inlining prefab {} at record {}", asset, index);
    let built = {
        let mut scoped = ctx.scoped(&prefab);
        nodes::build_node(&mut scoped, root)
    };
    ctx.exit_prefab();
    let mut node = built?;

    for (target, source, kind) in INSTANCE_OVERRIDES {
        if let Some(value) = instance.field(source).and_then(|v| convert(v, *kind)) {
            node.base.insert(target.to_string(), value);
        }
    }
    Ok(node)
}

fn load_prefab(ctx: &ConversionContext<'_, '_>, uuid: &str) -> Result<RecordStore> {
    let bytes = ctx.state.resolver.read_asset(uuid)?;
    RecordStore::load(&bytes).map_err(|e| ConvertError::sidecar(uuid, format!("invalid prefab: {}", e)))
}

/// The instance record built as a generic container.
fn fallback(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    nodes::build_variant(ctx, index, Variant::Node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetEntry, MemoryAssetIndex};
    use crate::context::ConversionState;
    use crate::resolver::ResourceResolver;
    use serde_json::{json, Value};

    fn scene_with_instance() -> RecordStore {
        RecordStore::from_value(json!([
            { "__type__": "cc.Node", "_name": "enemy-1", "_position": { "x": 10, "y": 20 },
              "_prefab": { "__id__": 1 } },
            { "__type__": "cc.PrefabInfo", "asset": { "__uuid__": "enemy" } }
        ]))
        .unwrap()
    }

    fn enemy_prefab() -> Value {
        json!([
            { "__type__": "cc.Prefab", "data": { "__id__": 1 } },
            { "__type__": "cc.Node", "_name": "Enemy", "_position": { "x": 1, "y": 2 }, "_opacity": 200,
              "_children": [{ "__id__": 2 }] },
            { "__type__": "cc.Node", "_name": "eye" }
        ])
    }

    #[test]
    fn test_instance_overrides_win() {
        let mut index = MemoryAssetIndex::new();
        index.insert_asset("enemy", AssetEntry::new("/p/assets/enemy.prefab", "/p/assets"));
        index.insert_json("/p/assets/enemy.prefab", &enemy_prefab());

        let records = scene_with_instance();
        let mut state = ConversionState::new(ResourceResolver::new(&index), "");
        let mut ctx = ConversionContext::new(&records, &mut state);
        let node = inline_prefab(&mut ctx, 0).unwrap();

        assert_eq!(node.variant, Variant::Node);
        assert_eq!(node.base["name"], "enemy-1");
        assert_eq!(node.base["position"], json!({ "x": 10, "y": 20 }));
        assert_eq!(node.base["opacity"], 200);
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].base["name"], "eye");
        assert!(state.warnings.is_empty());
    }

    #[test]
    fn test_missing_prefab_degrades() {
        let index = MemoryAssetIndex::new();
        let records = scene_with_instance();
        let mut state = ConversionState::new(ResourceResolver::new(&index), "");
        let mut ctx = ConversionContext::new(&records, &mut state);
        let node = inline_prefab(&mut ctx, 0).unwrap();

        assert_eq!(node.variant, Variant::Node);
        assert_eq!(node.base["name"], "enemy-1");
        assert_eq!(state.warnings.len(), 1);
    }

    #[test]
    fn test_self_instancing_prefab_is_fatal() {
        let mut index = MemoryAssetIndex::new();
        index.insert_asset("loop", AssetEntry::new("/p/assets/loop.prefab", "/p/assets"));
        index.insert_json(
            "/p/assets/loop.prefab",
            &json!([
                { "__type__": "cc.Prefab", "data": { "__id__": 1 } },
                { "__type__": "cc.Node", "_children": [{ "__id__": 2 }] },
                { "__type__": "cc.Node", "_prefab": { "__id__": 3 } },
                { "__type__": "cc.PrefabInfo", "asset": { "__uuid__": "loop" } }
            ]),
        );
        let records = RecordStore::from_value(json!([
            { "__type__": "cc.Node", "_prefab": { "__id__": 1 } },
            { "__type__": "cc.PrefabInfo", "asset": { "__uuid__": "loop" } }
        ]))
        .unwrap();
        let mut state = ConversionState::new(ResourceResolver::new(&index), "");
        let mut ctx = ConversionContext::new(&records, &mut state);
        let err = inline_prefab(&mut ctx, 0).unwrap_err();
        assert!(err.is_fatal());
    }
}
