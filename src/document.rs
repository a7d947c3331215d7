//! Canonical scene document
//!
//! The document is what the runtime loader reads: a tree of
//! `{object_type, object, children}` nodes plus side tables for sprite
//! frames, animation clips and the collision matrix.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::animation::AnimationClip;
use crate::classify::Variant;
use crate::resolver::{ResourceManifest, Size, SpriteFrameDescriptor};

/// Version written into every document.
pub const FORMAT_VERSION: &str = "0.4.0";

/// Ordered property map of a node.
pub type Properties = Map<String, Value>;

/// A node of the canonical tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalNode {
    pub variant: Variant,
    /// Base node properties (position, size, color, ...)
    pub base: Properties,
    /// Variant specific properties
    pub properties: Properties,
    pub children: Vec<CanonicalNode>,
}

impl CanonicalNode {
    pub fn new(variant: Variant, base: Properties) -> Self {
        Self { variant, base, properties: Properties::new(), children: Vec::new() }
    }

    /// Set a variant property.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }

    /// Variant property by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// The `object` of the serialized node.
    pub fn object(&self) -> Properties {
        if !self.variant.nests_base_properties() {
            let mut object = self.base.clone();
            object.extend(self.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
            return object;
        }
        let mut object = Properties::new();
        object.insert("node".to_string(), Value::Object(self.base.clone()));
        object.extend(self.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        object
    }

    /// Number of nodes in this subtree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(CanonicalNode::count).sum::<usize>()
    }
}

impl Serialize for CanonicalNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut node = serializer.serialize_struct("CanonicalNode", 3)?;
        node.serialize_field("object_type", self.variant.object_type())?;
        node.serialize_field("object", &self.object())?;
        node.serialize_field("children", &self.children)?;
        node.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitPolicy {
    pub fit_width: bool,
    pub fit_height: bool,
}

/// One row of the collision matrix.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CollisionRow {
    pub value: Vec<bool>,
}

/// Parse a project's `collision-matrix` setting.
pub fn collision_matrix(settings: &Value) -> Vec<CollisionRow> {
    settings
        .get("collision-matrix")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| CollisionRow {
                    value: row
                        .as_array()
                        .map(|cells| cells.iter().map(|c| c.as_bool().unwrap_or(false)).collect())
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The converted scene.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub version: &'static str,
    pub root: CanonicalNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_resolution: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_fit_policy: Option<FitPolicy>,
    /// Frames with texture paths already carrying the asset prefix
    pub sprite_frames: Vec<SpriteFrameDescriptor>,
    pub animation_clips: Vec<AnimationClip>,
    pub collision_matrix: Vec<CollisionRow>,
}

impl SceneDocument {
    pub fn new(root: CanonicalNode) -> Self {
        Self {
            version: FORMAT_VERSION,
            root,
            design_resolution: None,
            resolution_fit_policy: None,
            sprite_frames: Vec::new(),
            animation_clips: Vec::new(),
            collision_matrix: Vec::new(),
        }
    }
}

/// Serialize any document part, tab-indented or compact.
pub fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if !pretty {
        return serde_json::to_string(value);
    }
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write a document to disk, creating parent directories.
pub fn write_document(document: &SceneDocument, path: &Path, pretty: bool) -> std::io::Result<()> {
    write_json(document, path, pretty)
}

/// Write a resource manifest to disk, creating parent directories.
pub fn write_manifest(manifest: &ResourceManifest, path: &Path, pretty: bool) -> std::io::Result<()> {
    write_json(manifest, path, pretty)
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path, pretty: bool) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = to_json(value, pretty).map_err(std::io::Error::other)?;
    fs::write(path, json)
}
