//! Node classification
//!
//! A node's semantic variant is decided by the components attached to it. The
//! first entry of [`PRECEDENCE`] present on the node wins, so a scroll view
//! whose background is drawn by a `cc.Sprite` is still a scroll view.

use std::fmt;

use crate::record::{Record, RecordStore};

/// Semantic kind of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Node,
    Scene,
    Canvas,
    Sprite,
    Label,
    RichText,
    Button,
    ProgressBar,
    Slider,
    Toggle,
    ToggleGroup,
    ScrollView,
    PageView,
    EditBox,
    TiledMap,
    ParticleSystem,
    SpineSkeleton,
    VideoPlayer,
    WebView,
    Mask,
    MotionStreak,
    DragonBones,
    Prefab,
}

/// Component tags in classification order.
pub const PRECEDENCE: &[(&str, Variant)] = &[
    ("cc.Button", Variant::Button),
    ("cc.ProgressBar", Variant::ProgressBar),
    ("cc.ScrollView", Variant::ScrollView),
    ("cc.EditBox", Variant::EditBox),
    ("cc.Label", Variant::Label),
    ("sp.Skeleton", Variant::SpineSkeleton),
    ("cc.Sprite", Variant::Sprite),
    ("cc.ParticleSystem", Variant::ParticleSystem),
    ("cc.TiledMap", Variant::TiledMap),
    ("cc.Canvas", Variant::Canvas),
    ("cc.RichText", Variant::RichText),
    ("cc.VideoPlayer", Variant::VideoPlayer),
    ("cc.WebView", Variant::WebView),
    ("cc.Slider", Variant::Slider),
    ("cc.Toggle", Variant::Toggle),
    ("cc.ToggleGroup", Variant::ToggleGroup),
    ("cc.PageView", Variant::PageView),
    ("cc.Mask", Variant::Mask),
    ("dragonBones.ArmatureDisplay", Variant::DragonBones),
];

impl Variant {
    /// Value of `object_type` in the output document.
    pub fn object_type(self) -> &'static str {
        match self {
            Variant::Node | Variant::Canvas => "Node",
            Variant::Scene => "Scene",
            Variant::Sprite => "Sprite",
            Variant::Label => "Label",
            Variant::RichText => "RichText",
            Variant::Button => "Button",
            Variant::ProgressBar => "ProgressBar",
            Variant::Slider => "Slider",
            Variant::Toggle => "Toggle",
            Variant::ToggleGroup => "ToggleGroup",
            Variant::ScrollView => "ScrollView",
            Variant::PageView => "PageView",
            Variant::EditBox => "EditBox",
            Variant::TiledMap => "TileMap",
            Variant::ParticleSystem => "Particle",
            Variant::SpineSkeleton => "SpineSkeleton",
            Variant::VideoPlayer => "VideoPlayer",
            Variant::WebView => "WebView",
            Variant::Mask => "Mask",
            Variant::MotionStreak => "MotionStreak",
            Variant::DragonBones => "DragonBones",
            Variant::Prefab => "Prefab",
        }
    }

    /// Whether variant properties sit beside a nested `node` object holding
    /// the base properties (every variant but the plain containers).
    pub fn nests_base_properties(self) -> bool {
        !matches!(self, Variant::Node | Variant::Scene | Variant::Canvas)
    }

    /// Component tag that selects this variant, if any.
    pub fn component_type(self) -> Option<&'static str> {
        if self == Variant::MotionStreak {
            return Some("cc.MotionStreak");
        }
        PRECEDENCE.iter().find(|(_, v)| *v == self).map(|(tag, _)| *tag)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Classify a node record by its attached components.
pub fn classify(node: &Record, records: &RecordStore) -> Variant {
    let tags: Vec<&str> = records.components(node).iter().map(|c| c.record_type.as_str()).collect();
    // Nodes inside a prefab carry `_prefab` too; only a bare instance lacks `_components`
    let is_instance = node.has("_prefab") && !node.has("_components");
    let variant = classify_tags(&tags, is_instance);
    log::debug!("classified {:?} as {} from {:?}", node.str_field("_name"), variant, tags);
    variant
}

/// Classify from component tags alone.
///
/// With no components at all the node is a prefab instance when it is marked
/// as one and a plain container otherwise.
pub fn classify_tags(tags: &[&str], is_prefab_instance: bool) -> Variant {
    if tags.is_empty() {
        return if is_prefab_instance { Variant::Prefab } else { Variant::Node };
    }
    PRECEDENCE
        .iter()
        .find(|(tag, _)| tags.contains(tag))
        .map(|(_, variant)| *variant)
        .unwrap_or(Variant::Node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scroll_view_beats_sprite_in_any_order() {
        assert_eq!(classify_tags(&["cc.ScrollView", "cc.Sprite"], false), Variant::ScrollView);
        assert_eq!(classify_tags(&["cc.Sprite", "cc.ScrollView"], false), Variant::ScrollView);
    }

    #[test]
    fn test_button_beats_sprite_and_label() {
        assert_eq!(classify_tags(&["cc.Sprite", "cc.Label", "cc.Button"], false), Variant::Button);
    }

    #[test]
    fn test_unknown_components_fall_back_to_node() {
        assert_eq!(classify_tags(&["cc.Widget", "cc.Layout"], false), Variant::Node);
        assert_eq!(classify_tags(&["cc.Widget"], true), Variant::Node);
    }

    #[test]
    fn test_no_components() {
        assert_eq!(classify_tags(&[], false), Variant::Node);
        assert_eq!(classify_tags(&[], true), Variant::Prefab);
    }

    #[test]
    fn test_motion_streak_alone_is_a_node() {
        assert_eq!(classify_tags(&["cc.MotionStreak"], false), Variant::Node);
    }

    #[test]
    fn test_classify_record() {
        let store = RecordStore::from_value(json!([
            { "__type__": "cc.Node", "_components": [{ "__id__": 1 }, { "__id__": 2 }] },
            { "__type__": "cc.Widget" },
            { "__type__": "cc.Canvas" },
            { "__type__": "cc.Node", "_prefab": { "__id__": 4 } },
            { "__type__": "cc.PrefabInfo" }
        ]))
        .unwrap();
        assert_eq!(classify(store.get(0).unwrap(), &store), Variant::Canvas);
        assert_eq!(classify(store.get(3).unwrap(), &store), Variant::Prefab);
    }

    #[test]
    fn test_prefab_member_with_empty_components_is_a_node() {
        let store = RecordStore::from_value(json!([
            { "__type__": "cc.Node", "_components": [], "_prefab": { "__id__": 1 } },
            { "__type__": "cc.PrefabInfo", "asset": { "__id__": 0 } }
        ]))
        .unwrap();
        assert_eq!(classify(store.get(0).unwrap(), &store), Variant::Node);
    }

    #[test]
    fn test_object_types() {
        assert_eq!(Variant::Canvas.object_type(), "Node");
        assert_eq!(Variant::TiledMap.object_type(), "TileMap");
        assert_eq!(Variant::ParticleSystem.object_type(), "Particle");
        assert!(!Variant::Scene.nests_base_properties());
        assert!(Variant::Sprite.nests_base_properties());
    }

    #[test]
    fn test_component_type_lookup() {
        assert_eq!(Variant::Sprite.component_type(), Some("cc.Sprite"));
        assert_eq!(Variant::MotionStreak.component_type(), Some("cc.MotionStreak"));
        assert_eq!(Variant::Node.component_type(), None);
    }
}
