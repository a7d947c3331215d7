//! Record store for serialized scene and prefab files
//!
//! A Creator scene file is a JSON array of typed records. Records point at each
//! other with `{"__id__": n}` (an index into the same array) and at external
//! assets with `{"__uuid__": "..."}`. The store validates every index reference
//! up front so later lookups never go out of bounds.

use serde_json::{Map, Value};

use crate::error::{ConvertError, Result};

/// Field holding a record's type tag.
pub const TYPE_FIELD: &str = "__type__";
/// Key of an index reference object.
pub const ID_KEY: &str = "__id__";
/// Key of a uuid reference object.
pub const UUID_KEY: &str = "__uuid__";

/// A reference value found in a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// Index of another record in the same file
    Index(usize),
    /// Opaque identifier of an external asset
    Uuid(&'a str),
}

impl<'a> Reference<'a> {
    /// Interpret a value as a reference, if it is one.
    pub fn from_value(value: &'a Value) -> Option<Reference<'a>> {
        let obj = value.as_object()?;
        if let Some(id) = obj.get(ID_KEY) {
            return id.as_u64().map(|i| Reference::Index(i as usize));
        }
        obj.get(UUID_KEY).and_then(Value::as_str).map(Reference::Uuid)
    }
}

/// One typed record of a scene file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Value of the `__type__` field (e.g. `cc.Node`, `cc.Sprite`)
    pub record_type: String,
    /// Every other field of the record
    pub fields: Map<String, Value>,
}

impl Record {
    /// Raw field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether the record carries a field, whatever its value.
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Target index of an index-reference field.
    pub fn index_ref(&self, name: &str) -> Option<usize> {
        match self.field(name).and_then(Reference::from_value) {
            Some(Reference::Index(i)) => Some(i),
            _ => None,
        }
    }

    /// Target uuid of a uuid-reference field.
    pub fn uuid_ref(&self, name: &str) -> Option<&str> {
        match self.field(name).and_then(Reference::from_value) {
            Some(Reference::Uuid(u)) => Some(u),
            _ => None,
        }
    }

    /// Index references held in an array field, skipping null entries.
    pub fn index_refs(&self, name: &str) -> Vec<usize> {
        self.array_refs(name)
            .filter_map(|r| match r {
                Reference::Index(i) => Some(i),
                Reference::Uuid(_) => None,
            })
            .collect()
    }

    /// Uuid references held in an array field, skipping null entries.
    pub fn uuid_refs(&self, name: &str) -> Vec<&str> {
        self.array_refs(name)
            .filter_map(|r| match r {
                Reference::Uuid(u) => Some(u),
                Reference::Index(_) => None,
            })
            .collect()
    }

    fn array_refs(&self, name: &str) -> impl Iterator<Item = Reference<'_>> {
        self.field(name)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Reference::from_value)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn f64_field(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(Value::as_f64)
    }

    pub fn i64_field(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(Value::as_i64)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(Value::as_bool)
    }
}

/// All records of one scene or prefab file.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    /// Parse and validate the raw bytes of a scene or prefab file.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ConvertError::malformed(None, format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Build a store from an already parsed JSON document.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(ConvertError::malformed(None, "expected a JSON array of records"));
        };

        let len = items.len();
        let mut records = Vec::with_capacity(len);
        for (index, item) in items.into_iter().enumerate() {
            let Value::Object(mut fields) = item else {
                return Err(ConvertError::malformed(index, "record is not a JSON object"));
            };
            let record_type = match fields.remove(TYPE_FIELD) {
                Some(Value::String(t)) => t,
                _ => return Err(ConvertError::malformed(index, "record has no string __type__")),
            };
            for value in fields.values() {
                check_references(value, index, len)?;
            }
            records.push(Record { record_type, fields });
        }

        Ok(Self { records })
    }

    /// Record at `index`.
    pub fn get(&self, index: usize) -> Result<&Record> {
        self.records.get(index).ok_or_else(|| {
            ConvertError::malformed(index, format!("index out of bounds ({} records)", self.len()))
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Root node of a scene file (`cc.SceneAsset.scene`).
    pub fn scene_root(&self) -> Option<usize> {
        self.records
            .iter()
            .find(|r| r.record_type == "cc.SceneAsset")
            .and_then(|r| r.index_ref("scene"))
    }

    /// Root node of a prefab file (`data` of the `cc.Prefab` record at index 0).
    pub fn prefab_root(&self) -> Option<usize> {
        self.records
            .first()
            .filter(|r| r.record_type == "cc.Prefab")
            .and_then(|r| r.index_ref("data"))
    }

    /// Component records attached to a node, in declaration order.
    pub fn components(&self, node: &Record) -> Vec<&Record> {
        node.index_refs("_components")
            .into_iter()
            .filter_map(|i| self.records.get(i))
            .collect()
    }

    /// First component of the given type attached to a node.
    pub fn component<'s>(&'s self, node: &Record, component_type: &str) -> Option<&'s Record> {
        self.components(node).into_iter().find(|c| c.record_type == component_type)
    }

    /// Every component of the given type attached to a node.
    pub fn components_of_type<'s>(&'s self, node: &Record, component_type: &str) -> Vec<&'s Record> {
        self.components(node)
            .into_iter()
            .filter(|c| c.record_type == component_type)
            .collect()
    }

    /// Indices of a node's children, in source order.
    pub fn children(&self, node: &Record) -> Vec<usize> {
        node.index_refs("_children")
    }

    /// Follow an index-reference field of `record` to its target.
    pub fn follow(&self, record: &Record, field: &str) -> Option<(usize, &Record)> {
        let index = record.index_ref(field)?;
        self.records.get(index).map(|r| (index, r))
    }
}

fn check_references(value: &Value, index: usize, len: usize) -> Result<()> {
    match value {
        Value::Object(obj) => {
            if let Some(id) = obj.get(ID_KEY) {
                match id.as_u64() {
                    Some(target) if (target as usize) < len => {}
                    Some(target) => {
                        return Err(ConvertError::malformed(
                            index,
                            format!("reference to record {} out of bounds ({} records)", target, len),
                        ))
                    }
                    None => {
                        return Err(ConvertError::malformed(index, "__id__ is not an index"));
                    }
                }
            }
            for nested in obj.values() {
                check_references(nested, index, len)?;
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(|v| check_references(v, index, len)),
        _ => Ok(()),
    }
}
