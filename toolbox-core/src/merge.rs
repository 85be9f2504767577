//! Deep clone and deep merge of JSON settings values
//!
//! Merging persisted settings onto a freshly generated default document is
//! the only schema-migration mechanism: new sub-plugins and new settings
//! fields appear with their defaults while user edits are kept.

use serde_json::{Map, Value};
use thiserror::Error;

/// Default and override have incompatible container shapes at `path`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot merge {base} with {overlay} at '{path}'")]
pub struct MergeConflict {
    /// Dotted key path, empty for the document root
    pub path: String,
    pub base: &'static str,
    pub overlay: &'static str,
}

/// Structurally independent copy of `value`.
///
/// `Value` owns all of its children, so the copy never aliases the input.
pub fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(deep_clone).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), deep_clone(item)))
                .collect(),
        ),
        primitive => primitive.clone(),
    }
}

/// Merge `overlay` onto `base` without mutating either.
///
/// `None` stands for an absent value:
/// - one side absent: the other side, cloned
/// - either side primitive or null: `overlay` wins
/// - both arrays: `overlay` wins wholesale
/// - array against object: [`MergeConflict`]
/// - both objects: union of keys, merged key by key
pub fn deep_merge(
    base: Option<&Value>,
    overlay: Option<&Value>,
) -> Result<Option<Value>, MergeConflict> {
    let mut path = Vec::new();
    merge_at(&mut path, base, overlay)
}

fn merge_at(
    path: &mut Vec<String>,
    base: Option<&Value>,
    overlay: Option<&Value>,
) -> Result<Option<Value>, MergeConflict> {
    let (base, overlay) = match (base, overlay) {
        (None, None) => return Ok(None),
        (Some(base), None) => return Ok(Some(deep_clone(base))),
        (None, Some(overlay)) => return Ok(Some(deep_clone(overlay))),
        (Some(base), Some(overlay)) => (base, overlay),
    };

    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = Map::new();
            let keys = base_map
                .keys()
                .chain(overlay_map.keys().filter(|key| !base_map.contains_key(*key)));
            for key in keys {
                path.push(key.clone());
                let value = merge_at(path, base_map.get(key), overlay_map.get(key))?;
                path.pop();
                if let Some(value) = value {
                    merged.insert(key.clone(), value);
                }
            }
            Ok(Some(Value::Object(merged)))
        }
        (Value::Array(_), Value::Array(_)) => Ok(Some(deep_clone(overlay))),
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => {
            Err(MergeConflict {
                path: path.join("."),
                base: kind(base),
                overlay: kind(overlay),
            })
        }
        _ => Ok(Some(deep_clone(overlay))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
