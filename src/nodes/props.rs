//! Field conversion helpers shared by the node builders

use serde_json::{json, Value};

use crate::document::Properties;
use crate::record::Record;

/// Shape a source field is converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Copied unchanged
    Value,
    /// `{width, height}` to `{w, h}`
    Size,
    /// `{x, y}`
    Vec2,
    /// `{r, g, b}` as integers
    Rgb,
    /// `{r, g, b, a}` as integers
    Rgba,
}

/// Convert a raw field value; `None` when it lacks the expected shape.
pub fn convert(value: &Value, kind: Kind) -> Option<Value> {
    match kind {
        Kind::Value => Some(value.clone()),
        Kind::Size => {
            let obj = value.as_object()?;
            Some(json!({ "w": number(obj.get("width")), "h": number(obj.get("height")) }))
        }
        Kind::Vec2 => {
            let obj = value.as_object()?;
            Some(json!({ "x": number(obj.get("x")), "y": number(obj.get("y")) }))
        }
        Kind::Rgb => {
            let obj = value.as_object()?;
            Some(json!({ "r": channel(obj.get("r")), "g": channel(obj.get("g")), "b": channel(obj.get("b")) }))
        }
        Kind::Rgba => {
            let obj = value.as_object()?;
            Some(json!({
                "r": channel(obj.get("r")),
                "g": channel(obj.get("g")),
                "b": channel(obj.get("b")),
                "a": channel(obj.get("a")),
            }))
        }
    }
}

fn number(value: Option<&Value>) -> Value {
    value.cloned().unwrap_or(Value::Null)
}

fn channel(value: Option<&Value>) -> Value {
    match value {
        Some(v) => match v.as_i64() {
            Some(i) => json!(i),
            None => v.as_f64().map(|f| json!(f.trunc() as i64)).unwrap_or(Value::Null),
        },
        None => Value::Null,
    }
}

/// Copy `source` of a record into `props[target]`, skipping absent fields.
pub fn copy(record: &Record, source: &str, target: &str, kind: Kind, props: &mut Properties) {
    if let Some(value) = record.field(source).and_then(|v| convert(v, kind)) {
        props.insert(target.to_string(), value);
    }
}

/// Copy a table of `(target, source)` plain fields.
pub fn copy_all(record: &Record, fields: &[(&str, &str)], props: &mut Properties) {
    for (target, source) in fields {
        copy(record, source, target, Kind::Value, props);
    }
}

/// A computed number, written as an integer when it has no fraction.
pub fn number_value(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// Name of an enumerated field, if its index is in range.
pub fn enum_name(record: &Record, field: &str, names: &[&'static str]) -> Option<&'static str> {
    let index = record.i64_field(field)?;
    usize::try_from(index).ok().and_then(|i| names.get(i)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordStore;

    fn record(value: Value) -> Record {
        let store = RecordStore::from_value(json!([value])).unwrap();
        store.get(0).unwrap().clone()
    }

    #[test]
    fn test_convert_shapes() {
        assert_eq!(
            convert(&json!({ "__type__": "cc.Size", "width": 10, "height": 20 }), Kind::Size),
            Some(json!({ "w": 10, "h": 20 }))
        );
        assert_eq!(
            convert(&json!({ "r": 255.0, "g": 12.7, "b": 0, "a": 128 }), Kind::Rgb),
            Some(json!({ "r": 255, "g": 12, "b": 0 }))
        );
        assert_eq!(convert(&json!(3), Kind::Vec2), None);
    }

    #[test]
    fn test_copy_skips_absent() {
        let r = record(json!({ "__type__": "cc.Node", "_name": "a" }));
        let mut props = Properties::new();
        copy_all(&r, &[("name", "_name"), ("tag", "_tag")], &mut props);
        assert_eq!(props.len(), 1);
        assert_eq!(props["name"], "a");
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(50.0), json!(50));
        assert_eq!(number_value(12.5), json!(12.5));
    }

    #[test]
    fn test_enum_name() {
        let r = record(json!({ "__type__": "cc.Sprite", "_type": 1, "_sizeMode": 7, "_neg": -1 }));
        assert_eq!(enum_name(&r, "_type", &["Simple", "Sliced"]), Some("Sliced"));
        assert_eq!(enum_name(&r, "_sizeMode", &["Custom"]), None);
        assert_eq!(enum_name(&r, "_neg", &["Custom"]), None);
        assert_eq!(enum_name(&r, "_missing", &["Custom"]), None);
    }
}
