//! Field projection helpers used by the optimizer
//!
//! All of these work on one record or element-wise on an array. Scalars and
//! nulls pass through untouched.

use serde_json::{Map, Value};

use crate::summarizer::truncate_content;

/// String fields that description truncation applies to
const DESCRIPTION_FIELDS: &[&str] = &["desc", "description"];

fn map_records<F>(data: &Value, f: F) -> Value
where
    F: Fn(&Map<String, Value>) -> Map<String, Value> + Copy,
{
    match data {
        Value::Array(items) => Value::Array(items.iter().map(|v| map_records(v, f)).collect()),
        Value::Object(obj) => Value::Object(f(obj)),
        other => other.clone(),
    }
}

/// Keep exactly `fields` (top level), in the given order
pub fn select_fields(data: &Value, fields: &[String]) -> Value {
    map_records(data, |obj| {
        fields
            .iter()
            .filter_map(|f| obj.get(f).map(|v| (f.clone(), v.clone())))
            .collect()
    })
}

/// Drop `fields` (top level), keeping record order
pub fn drop_fields(data: &Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return data.clone();
    }
    map_records(data, |obj| {
        obj.iter()
            .filter(|(k, _)| !fields.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    })
}

/// Truncate `desc`/`description` strings at any depth.
///
/// A truncated field gains a `<field>OriginalLength` sibling; untouched
/// fields do not.
pub fn truncate_descriptions(data: &Value, limit: usize) -> Value {
    match data {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| truncate_descriptions(v, limit))
                .collect(),
        ),
        Value::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            for (key, value) in obj {
                match value {
                    Value::String(text) if DESCRIPTION_FIELDS.contains(&key.as_str()) => {
                        let result = truncate_content(text.as_str(), limit);
                        if result.is_truncated {
                            out.insert(key.clone(), Value::String(result.truncated));
                            out.insert(
                                format!("{}OriginalLength", key),
                                Value::from(result.original_length),
                            );
                        } else {
                            out.insert(key.clone(), value.clone());
                        }
                    }
                    Value::Array(_) | Value::Object(_) => {
                        out.insert(key.clone(), truncate_descriptions(value, limit));
                    }
                    _ => {
                        out.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}
