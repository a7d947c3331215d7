//! Animation clip normalization
//!
//! Clip documents store keyframes per property, either for the animated node
//! itself (`curveData.props`) or for a descendant addressed by path
//! (`curveData.paths.<path>.props`). Normalized clips flatten both into a list
//! of per-property tracks with uniform keyframes.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{ConvertError, Result};
use crate::resolver::ResourceResolver;

/// Source property name and the name tracks use for it.
const SCALAR_PROPERTIES: &[(&str, &str)] = &[
    ("rotation", "rotation"),
    ("x", "positionX"),
    ("y", "positionY"),
    ("anchorX", "anchorX"),
    ("anchorY", "anchorY"),
    ("scaleX", "scaleX"),
    ("scaleY", "scaleY"),
    ("skewX", "skewX"),
    ("skewY", "skewY"),
    ("opacity", "opacity"),
];

/// A normalized animation clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationClip {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_mode: Option<i64>,
    pub curve_tracks: Vec<CurveTrack>,
}

/// Keyframes of one property of one (possibly nested) node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveTrack {
    /// Path of the animated descendant; absent for the node owning the clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    pub property: String,
    pub keyframes: Vec<Keyframe>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    pub frame: f64,
    pub value: Value,
    /// Named easing (e.g. `constant`, `quadIn`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve_type: Option<String>,
    /// Bezier control points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve_data: Option<Vec<Value>>,
}

/// Normalize a raw clip document.
pub fn normalize_clip(uuid: &str, document: &Value) -> Result<AnimationClip> {
    let clip = document.as_object().ok_or_else(|| ConvertError::clip(uuid, "clip is not a JSON object"))?;

    let mut curve_tracks = Vec::new();
    match clip.get("curveData") {
        None | Some(Value::Null) => {}
        Some(Value::Object(curve_data)) => {
            if let Some(paths) = curve_data.get("paths") {
                let paths = paths
                    .as_object()
                    .ok_or_else(|| ConvertError::clip(uuid, "curveData.paths is not an object"))?;
                for (path, entry) in paths {
                    if let Some(props) = entry.get("props").and_then(Value::as_object) {
                        curve_tracks.extend(normalize_props(uuid, Some(path), props)?);
                    }
                }
            }
            if let Some(props) = curve_data.get("props") {
                let props = props
                    .as_object()
                    .ok_or_else(|| ConvertError::clip(uuid, "curveData.props is not an object"))?;
                curve_tracks.extend(normalize_props(uuid, None, props)?);
            }
        }
        Some(_) => return Err(ConvertError::clip(uuid, "curveData is not an object")),
    }

    Ok(AnimationClip {
        name: clip.get("_name").and_then(Value::as_str).unwrap_or(uuid).to_string(),
        duration: clip.get("_duration").and_then(Value::as_f64),
        sample_rate: clip.get("sample").and_then(Value::as_f64),
        speed: clip.get("speed").and_then(Value::as_f64),
        wrap_mode: clip.get("wrapMode").and_then(Value::as_i64),
        curve_tracks,
    })
}

fn normalize_props(uuid: &str, path: Option<&str>, props: &Map<String, Value>) -> Result<Vec<CurveTrack>> {
    let mut tracks = Vec::new();
    let mut track = |property: &str, source: &Value, convert: fn(&Value) -> Value| -> Result<()> {
        tracks.push(CurveTrack {
            target_path: path.map(str::to_string),
            property: property.to_string(),
            keyframes: keyframes(uuid, property, source, convert)?,
        });
        Ok(())
    };

    for (source, property) in SCALAR_PROPERTIES {
        if let Some(frames) = props.get(*source).filter(|v| is_truthy(v)) {
            track(property, frames, Value::clone)?;
        }
    }
    if let Some(frames) = props.get("position").filter(|v| is_truthy(v)) {
        track("position", frames, position_value)?;
    }
    if let Some(frames) = props.get("color").filter(|v| is_truthy(v)) {
        track("color", frames, color_value)?;
    }

    for key in props.keys() {
        let known = SCALAR_PROPERTIES.iter().any(|(s, _)| s == key) || key == "position" || key == "color";
        if !known {
            log::debug!("clip {}: skipping unsupported property '{}'", uuid, key);
        }
    }

    Ok(tracks)
}

fn keyframes(uuid: &str, property: &str, source: &Value, convert: fn(&Value) -> Value) -> Result<Vec<Keyframe>> {
    let items = source
        .as_array()
        .ok_or_else(|| ConvertError::clip(uuid, format!("keyframes of '{}' are not a list", property)))?;

    items
        .iter()
        .map(|item| {
            let frame = item
                .get("frame")
                .and_then(Value::as_f64)
                .ok_or_else(|| ConvertError::clip(uuid, format!("keyframe of '{}' has no frame", property)))?;
            let value = item.get("value").map(convert).unwrap_or(Value::Null);

            let (curve_type, curve_data) = match item.get("curve") {
                Some(Value::String(s)) if !s.is_empty() => (Some(s.clone()), None),
                Some(Value::Array(points)) => (None, Some(points.clone())),
                _ => (None, None),
            };
            Ok(Keyframe { frame, value, curve_type, curve_data })
        })
        .collect()
}

/// `[x, y]` becomes `{x, y}`.
fn position_value(value: &Value) -> Value {
    match value.as_array() {
        Some(pair) if pair.len() >= 2 => json!({ "x": pair[0], "y": pair[1] }),
        _ => value.clone(),
    }
}

fn color_value(value: &Value) -> Value {
    match value.as_object() {
        Some(c) => json!({
            "r": c.get("r").cloned().unwrap_or(Value::Null),
            "g": c.get("g").cloned().unwrap_or(Value::Null),
            "b": c.get("b").cloned().unwrap_or(Value::Null),
            "a": c.get("a").cloned().unwrap_or(Value::Null),
        }),
        None => value.clone(),
    }
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Normalized clips of one conversion, deduplicated by uuid.
#[derive(Debug, Default)]
pub struct ClipLibrary {
    clips: IndexMap<String, AnimationClip>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized clip for a uuid, reading its document on first use.
    pub fn load(&mut self, uuid: &str, resolver: &ResourceResolver<'_>) -> Result<&AnimationClip> {
        if !self.clips.contains_key(uuid) {
            let document = resolver.read_document(uuid).map_err(|e| match e {
                ConvertError::MalformedSidecar { message, .. } => ConvertError::clip(uuid, message),
                other => other,
            })?;
            let clip = normalize_clip(uuid, &document)?;
            log::debug!("normalized clip '{}' ({} tracks)", clip.name, clip.curve_tracks.len());
            self.clips.insert(uuid.to_string(), clip);
        }
        self.clips.get(uuid).ok_or_else(|| ConvertError::clip(uuid, "clip vanished from cache"))
    }

    pub fn get(&self, uuid: &str) -> Option<&AnimationClip> {
        self.clips.get(uuid)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn into_clips(self) -> Vec<AnimationClip> {
        self.clips.into_values().collect()
    }
}
