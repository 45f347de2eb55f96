//! Preset Registry - per-operation field selection rules
//!
//! Each operation maps every non-full [`DetailLevel`] to a [`FieldPreset`]:
//! either a whitelist (`include`) or a blacklist (`exclude`), never both.
//!
//! ```json
//! {
//!   "get_card": {
//!     "minimal":  { "include": ["id", "name"] },
//!     "standard": { "include": ["id", "name", "desc", "due"] },
//!     "detailed": { "exclude": ["badges", "limits"] }
//!   }
//! }
//! ```
//!
//! The same shape loads from TOML (`[get_card.minimal] include = [...]`).

use pare_foundation::{DetailLevel, Error, JsonStore, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error};

const BUILTIN_PRESETS: &str = include_str!("builtin.json");

// ============================================================================
// FieldPreset
// ============================================================================

/// Field-selection rule for one (operation, level) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPreset {
    /// Keep only these fields, in this order
    Include(Vec<String>),
    /// Keep everything except these fields
    Exclude(Vec<String>),
}

impl FieldPreset {
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldPreset::Include(fields.into_iter().map(Into::into).collect())
    }

    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldPreset::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Apply to a record, or element-wise to an array. Scalars pass through.
    pub fn apply(&self, data: &Value) -> Value {
        match data {
            Value::Array(items) => Value::Array(items.iter().map(|v| self.apply(v)).collect()),
            Value::Object(obj) => Value::Object(self.apply_object(obj)),
            other => other.clone(),
        }
    }

    fn apply_object(&self, obj: &Map<String, Value>) -> Map<String, Value> {
        match self {
            FieldPreset::Include(fields) => fields
                .iter()
                .filter_map(|field| obj.get(field).map(|v| (field.clone(), v.clone())))
                .collect(),
            FieldPreset::Exclude(fields) => obj
                .iter()
                .filter(|(key, _)| !fields.iter().any(|f| f == *key))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

// ============================================================================
// OperationPresets
// ============================================================================

/// Presets for every non-full level of one operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationPresets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimal: Option<FieldPreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<FieldPreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed: Option<FieldPreset>,
}

impl OperationPresets {
    pub fn new(minimal: FieldPreset, standard: FieldPreset, detailed: FieldPreset) -> Self {
        Self {
            minimal: Some(minimal),
            standard: Some(standard),
            detailed: Some(detailed),
        }
    }

    /// `None` for `Full` or for a level the table leaves out
    pub fn for_level(&self, level: DetailLevel) -> Option<&FieldPreset> {
        match level {
            DetailLevel::Minimal => self.minimal.as_ref(),
            DetailLevel::Standard => self.standard.as_ref(),
            DetailLevel::Detailed => self.detailed.as_ref(),
            DetailLevel::Full => None,
        }
    }
}

// ============================================================================
// PresetRegistry
// ============================================================================

/// Operation name → per-level presets. Read-only once handed to the optimizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetRegistry {
    operations: BTreeMap<String, OperationPresets>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled table for the board/list/card/member API.
    ///
    /// Falls back to an empty registry (everything passes through) if the
    /// bundled table cannot be parsed.
    pub fn builtin() -> Self {
        match Self::try_builtin() {
            Ok(registry) => registry,
            Err(e) => {
                error!(error = %e, "Built-in preset table is invalid");
                Self::new()
            }
        }
    }

    pub fn try_builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_PRESETS)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a `.json` or `.toml` preset file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        let registry = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text)?,
            Some("toml") => Self::from_toml_str(&text)?,
            _ => {
                return Err(Error::preset(format!(
                    "Unsupported preset file format: {}",
                    path.display()
                )))
            }
        };

        debug!(
            path = %path.display(),
            operations = registry.len(),
            "Loaded preset table"
        );
        Ok(registry)
    }

    /// Load from a config store directory (`.pare/presets.json`, ...)
    pub fn from_store(store: &JsonStore, filename: &str) -> Result<Self> {
        Self::load(store.file_path(filename))
    }

    /// Add or replace an operation's presets
    pub fn insert(&mut self, operation: impl Into<String>, presets: OperationPresets) {
        self.operations.insert(operation.into(), presets);
    }

    pub fn with_operation(mut self, operation: impl Into<String>, presets: OperationPresets) -> Self {
        self.insert(operation, presets);
        self
    }

    /// Overlay `other` on top of this registry, operation by operation
    pub fn merge(&mut self, other: PresetRegistry) {
        self.operations.extend(other.operations);
    }

    pub fn get(&self, operation: &str) -> Option<&OperationPresets> {
        self.operations.get(operation)
    }

    pub fn get_preset(&self, operation: &str, level: DetailLevel) -> Option<&FieldPreset> {
        self.get(operation)?.for_level(level)
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.operations.contains_key(operation)
    }

    /// Registered operation names, sorted
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
