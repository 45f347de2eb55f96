//! Cache key derivation
//!
//! Keys are `operation[:params][:variant]` where params and variant are
//! canonical JSON (object keys sorted recursively), so `{"a":1,"b":2}` and
//! `{"b":2,"a":1}` address the same entry.

use serde_json::{Map, Value};
use std::fmt;

use crate::Result;

/// Re-serialize a JSON value with every object's keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(obj.len());
            for key in keys {
                if let Some(v) = obj.get(key) {
                    sorted.insert(key.clone(), canonicalize(v));
                }
            }
            Value::Object(sorted)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonical JSON text for a value
pub fn canonical_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(&canonicalize(value))?)
}

/// Cache key for an optimized response
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: String,
    key: String,
}

impl CacheKey {
    /// `variant` fingerprints the shaping applied to the stored value.
    /// Null params or variant are left out of the key.
    pub fn new(operation: &str, params: &Value, variant: &Value) -> Result<Self> {
        let mut key = operation.to_string();
        for part in [params, variant] {
            if !part.is_null() {
                key.push(':');
                key.push_str(&canonical_json(part)?);
            }
        }

        Ok(Self {
            operation: operation.to_string(),
            key,
        })
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_independent() {
        let a = CacheKey::new("get_card", &json!({"id": "1", "fields": "all"}), &Value::Null)
            .unwrap();
        let b = CacheKey::new("get_card", &json!({"fields": "all", "id": "1"}), &Value::Null)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), r#"get_card:{"fields":"all","id":"1"}"#);
    }

    #[test]
    fn test_nested_objects_sorted() {
        let value = json!({"z": {"b": 1, "a": [ {"y": 1, "x": 2} ]}, "a": null});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"a":null,"z":{"a":[{"x":2,"y":1}],"b":1}}"#
        );
    }

    #[test]
    fn test_variant_distinguishes() {
        let params = json!({"id": "1"});
        let minimal = CacheKey::new("get_card", &params, &json!({"level": "minimal"})).unwrap();
        let standard = CacheKey::new("get_card", &params, &json!({"level": "standard"})).unwrap();
        assert_ne!(minimal, standard);
        assert_eq!(minimal.operation(), "get_card");
    }

    #[test]
    fn test_null_parts_omitted() {
        let key = CacheKey::new("get_me", &Value::Null, &Value::Null).unwrap();
        assert_eq!(key.to_string(), "get_me");
    }
}
