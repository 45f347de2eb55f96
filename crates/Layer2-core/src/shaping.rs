//! ShapingConfig - per-call response shaping
//!
//! Passed by reference into the optimizer and never mutated there. Usually
//! built from tool-call arguments:
//!
//! ```json
//! { "detailLevel": "minimal", "fields": ["id", "name"], "maxItems": 10 }
//! ```

use pare_foundation::config::lenient;
use pare_foundation::{DetailLevel, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::operations::default_level_for;

/// Per-call shaping options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapingConfig {
    /// Overrides the configured default level
    #[serde(
        alias = "detailLevel",
        deserialize_with = "lenient::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<DetailLevel>,

    /// Explicit top-level field whitelist; replaces the preset entirely
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    /// Top-level fields dropped after the preset
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_fields: Vec<String>,

    /// Keep only the first N array elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    /// Replace arrays with a summary object
    pub summarize: bool,

    /// Character limit for `desc`/`description` strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncate_descriptions: Option<usize>,

    /// Flatten nested objects into `parent_child` keys
    pub flatten_nested: bool,

    /// Pagination hints for the fetch layer; the optimizer does not slice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ShapingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse tool-call arguments. Unknown keys are ignored.
    pub fn from_args(args: &Value) -> Result<Self> {
        if args.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(args.clone())?)
    }

    /// Like [`from_args`](Self::from_args), but an absent level becomes the
    /// operation's kind default (`minimal` for lists, `standard` for reads...)
    pub fn for_operation(operation: &str, args: &Value) -> Result<Self> {
        let mut config = Self::from_args(args)?;
        if config.level.is_none() {
            config.level = Some(default_level_for(operation));
        }
        Ok(config)
    }

    // ========================================================================
    // Builders
    // ========================================================================

    pub fn level(mut self, level: DetailLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    pub fn summarize(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }

    pub fn truncate_descriptions(mut self, limit: usize) -> Self {
        self.truncate_descriptions = Some(limit);
        self
    }

    pub fn flatten_nested(mut self, flatten: bool) -> Self {
        self.flatten_nested = flatten;
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    // ========================================================================
    // Cache fingerprint
    // ========================================================================

    /// Everything that can change the optimized output, with the level
    /// already resolved. Pagination is included since the fetch layer may
    /// read it from here rather than from the request params.
    pub fn cache_variant(&self, resolved_level: DetailLevel) -> Value {
        json!({
            "level": resolved_level,
            "fields": self.fields,
            "excludeFields": self.exclude_fields,
            "maxItems": self.max_items,
            "summarize": self.summarize,
            "truncateDescriptions": self.truncate_descriptions,
            "flattenNested": self.flatten_nested,
            "offset": self.offset,
            "limit": self.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_args_camel_case() {
        let config = ShapingConfig::from_args(&json!({
            "detailLevel": "minimal",
            "fields": ["id", "name"],
            "maxItems": 10,
            "summarize": true,
            "truncateDescriptions": 50,
            "cardId": "abc"
        }))
        .unwrap();

        assert_eq!(config.level, Some(DetailLevel::Minimal));
        assert_eq!(config.fields, vec!["id", "name"]);
        assert_eq!(config.max_items, Some(10));
        assert!(config.summarize);
        assert_eq!(config.truncate_descriptions, Some(50));
        assert!(!config.flatten_nested);
    }

    #[test]
    fn test_invalid_level_is_dropped() {
        let config = ShapingConfig::from_args(&json!({"level": "verbose"})).unwrap();
        assert_eq!(config.level, None);

        let config = ShapingConfig::from_args(&Value::Null).unwrap();
        assert_eq!(config, ShapingConfig::default());
    }

    #[test]
    fn test_for_operation_defaults() {
        let list = ShapingConfig::for_operation("get_boards", &json!({})).unwrap();
        assert_eq!(list.level, Some(DetailLevel::Minimal));

        let explicit =
            ShapingConfig::for_operation("get_boards", &json!({"detailLevel": "full"})).unwrap();
        assert_eq!(explicit.level, Some(DetailLevel::Full));

        let admin = ShapingConfig::for_operation("update_card", &json!({})).unwrap();
        assert_eq!(admin.level, Some(DetailLevel::Detailed));
    }

    #[test]
    fn test_cache_variant_tracks_shaping() {
        let base = ShapingConfig::new();
        let a = base.cache_variant(DetailLevel::Standard);

        assert_ne!(a, base.cache_variant(DetailLevel::Minimal));
        assert_ne!(a, base.clone().fields(["id"]).cache_variant(DetailLevel::Standard));
        assert_ne!(a, base.clone().max_items(3).cache_variant(DetailLevel::Standard));
        assert_ne!(a, base.clone().summarize(true).cache_variant(DetailLevel::Standard));
        assert_ne!(a, base.clone().page(10, 5).cache_variant(DetailLevel::Standard));

        assert_eq!(a, ShapingConfig::new().cache_variant(DetailLevel::Standard));
        assert_eq!(a["level"], "standard");
    }
}
