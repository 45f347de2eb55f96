//! Text truncation, object flattening and the size heuristic

use pare_foundation::serialized_len;
use serde::Serialize;
use serde_json::{Map, Value};

/// Limit used when a caller passes 0
pub const DEFAULT_DESCRIPTION_LENGTH: usize = 100;

/// Default depth for [`flatten_object`]
pub const DEFAULT_FLATTEN_DEPTH: usize = 2;

/// Arrays keep this many elements when flattened
const FLATTEN_ARRAY_SAMPLE: usize = 3;

/// Marker left where an object sits past the flatten depth
pub const OBJECT_PLACEHOLDER: &str = "[object]";

/// Default byte threshold for [`should_summarize`]
pub const DEFAULT_SUMMARIZE_THRESHOLD: usize = 1_000;

/// Arrays longer than this are summarization candidates
const SUMMARIZE_ARRAY_LEN: usize = 10;

const ELLIPSIS: &str = "...";

// ============================================================================
// Truncation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TruncationResult {
    pub original: String,
    pub truncated: String,
    pub is_truncated: bool,
    /// Length of `original` in characters
    pub original_length: usize,
}

/// Shorten `content` to `limit` characters plus an ellipsis.
///
/// Prefers to cut at the last space at or before `limit` when that space
/// sits in the final fifth of the allowed length. Missing or empty input
/// gives an empty, non-truncated result.
pub fn truncate_content<'a>(content: impl Into<Option<&'a str>>, limit: usize) -> TruncationResult {
    let content = match content.into() {
        Some(s) if !s.is_empty() => s,
        _ => {
            return TruncationResult {
                original: String::new(),
                truncated: String::new(),
                is_truncated: false,
                original_length: 0,
            }
        }
    };

    let limit = if limit == 0 {
        DEFAULT_DESCRIPTION_LENGTH
    } else {
        limit
    };
    let chars: Vec<char> = content.chars().collect();
    let original_length = chars.len();

    if original_length <= limit {
        return TruncationResult {
            original: content.to_string(),
            truncated: content.to_string(),
            is_truncated: false,
            original_length,
        };
    }

    let word_boundary = (0..=limit)
        .rev()
        .find(|&i| chars[i] == ' ')
        .filter(|&pos| pos as f64 >= limit as f64 * 0.8);
    let cut = word_boundary.unwrap_or(limit);

    let mut truncated: String = chars[..cut].iter().collect();
    truncated.push_str(ELLIPSIS);

    TruncationResult {
        original: content.to_string(),
        truncated,
        is_truncated: true,
        original_length,
    }
}

// ============================================================================
// Flattening
// ============================================================================

/// Flatten nested objects into `parent_child` keys.
///
/// - nested objects within `max_depth` merge into the parent with a prefix
/// - objects at the depth limit become `"[object]"`
/// - arrays keep 3 elements, with `<key>Count` added when longer
///
/// Non-objects are returned unchanged.
pub fn flatten_object(value: &Value, max_depth: usize) -> Value {
    match value {
        Value::Object(obj) if max_depth > 0 => Value::Object(flatten_map(obj, 0, max_depth)),
        other => other.clone(),
    }
}

fn flatten_map(obj: &Map<String, Value>, depth: usize, max_depth: usize) -> Map<String, Value> {
    let mut result = Map::with_capacity(obj.len());

    for (key, value) in obj {
        match value {
            Value::Array(items) => {
                let sample = items.iter().take(FLATTEN_ARRAY_SAMPLE).cloned().collect();
                result.insert(key.clone(), Value::Array(sample));
                if items.len() > FLATTEN_ARRAY_SAMPLE {
                    result.insert(format!("{}Count", key), Value::from(items.len()));
                }
            }
            Value::Object(nested) => {
                if depth + 1 < max_depth {
                    for (sub_key, sub_value) in flatten_map(nested, depth + 1, max_depth) {
                        result.insert(format!("{}_{}", key, sub_key), sub_value);
                    }
                } else {
                    result.insert(key.clone(), Value::String(OBJECT_PLACEHOLDER.to_string()));
                }
            }
            other => {
                result.insert(key.clone(), other.clone());
            }
        }
    }

    result
}

// ============================================================================
// Size heuristic
// ============================================================================

/// Arrays longer than 10 elements, or anything whose serialized size exceeds
/// `threshold` bytes, are worth summarizing.
pub fn should_summarize(data: &Value, threshold: usize) -> bool {
    if let Value::Array(items) = data {
        if items.len() > SUMMARIZE_ARRAY_LEN {
            return true;
        }
    }
    serialized_len(data) > threshold
}
