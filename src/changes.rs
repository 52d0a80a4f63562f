//! Declared-field change detection
//!
//! Declared specs are compared through their serialized JSON form, addressed
//! by the same dotted paths the update-mask tables use. A field that is absent
//! and a field that is `null` are the same thing.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// Resolve a dotted path; numeric segments index into arrays
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current).filter(|v| !v.is_null())
}

/// Whether the field at `path` differs between two serialized specs
pub fn has_change(old: &Value, new: &Value, path: &str) -> bool {
    lookup(old, path) != lookup(new, path)
}

/// Declared fields of `table` whose values differ, in table order
pub fn changed_fields(table: &[(&'static str, &'static str)], old: &Value, new: &Value) -> Vec<&'static str> {
    table
        .iter()
        .map(|(field, _)| *field)
        .filter(|field| has_change(old, new, field))
        .collect()
}

/// Declared fields of `table` that differ between two specs
pub fn changed_spec_fields<T: Serialize>(
    table: &[(&'static str, &'static str)],
    old: &T,
    new: &T,
) -> Result<Vec<&'static str>> {
    let old = serde_json::to_value(old)?;
    let new = serde_json::to_value(new)?;
    Ok(changed_fields(table, &old, &new))
}

/// Which of `paths` differ between two specs, in the given order
pub fn changed_paths<T: Serialize>(paths: &[&'static str], old: &T, new: &T) -> Result<Vec<&'static str>> {
    let old = serde_json::to_value(old)?;
    let new = serde_json::to_value(new)?;
    Ok(paths
        .iter()
        .copied()
        .filter(|path| has_change(&old, &new, path))
        .collect())
}

/// Copy the value at `path` from `source` into `target`, creating
/// intermediate objects. A missing source value removes the target field.
pub fn copy_field(target: &mut Value, source: &Value, path: &str) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = target;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        match lookup(source, path) {
            Some(value) => {
                map.insert(last.to_string(), value.clone());
            }
            None => {
                map.remove(*last);
            }
        }
    }
}

/// Apply one declared field of `desired` onto `applied`
pub fn apply_field<T>(applied: &mut T, desired: &T, path: &str) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let mut target = serde_json::to_value(&*applied)?;
    let source = serde_json::to_value(desired)?;
    copy_field(&mut target, &source, path);
    *applied = serde_json::from_value(target)?;
    Ok(())
}
