//! Content Summarizer
//!
//! Turns large arrays into a short sample plus counters, and shortens or
//! flattens individual records.
//!
//! ```text
//! [card, card, card, ... x25]
//!        │ summary_response("get_cards_in_list")
//!        ▼
//! { "summary": {
//!     "text": "25 cards (9 with due dates, 3 overdue, 2 completed, 1 archived) - showing first 5",
//!     "totalCount": 25,
//!     "items": [{ "id": .., "name": .. } x5],
//!     "stats": { .. },
//!     "hasMore": true,
//!     "remainingCount": 20 } }
//! ```

mod stats;
mod text;

pub use stats::{generate_stats, SummaryStats};
pub use text::{
    flatten_object, should_summarize, truncate_content, TruncationResult,
    DEFAULT_DESCRIPTION_LENGTH, DEFAULT_FLATTEN_DEPTH, DEFAULT_SUMMARIZE_THRESHOLD,
    OBJECT_PLACEHOLDER,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use stats::is_truthy;

/// Sample size used when a caller passes 0
pub const DEFAULT_MAX_SAMPLES: usize = 5;

const UNNAMED: &str = "[unnamed]";

// ============================================================================
// Options / Summary
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOptions {
    pub include_stats: bool,
    /// 0 means [`DEFAULT_MAX_SAMPLES`]
    pub max_sample_items: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            include_stats: true,
            max_sample_items: DEFAULT_MAX_SAMPLES,
        }
    }
}

impl SummaryOptions {
    fn sample_size(&self) -> usize {
        if self.max_sample_items == 0 {
            DEFAULT_MAX_SAMPLES
        } else {
            self.max_sample_items
        }
    }
}

/// `total_count == sample_items.len() + remaining_count`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArraySummary {
    pub total_count: usize,
    /// First items, original order
    #[serde(rename = "items")]
    pub sample_items: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SummaryStats>,
    pub has_more: bool,
    pub remaining_count: usize,
}

pub fn summarize_array(items: &[Value], options: &SummaryOptions) -> ArraySummary {
    summarize_array_at(items, options, Utc::now())
}

/// Same as [`summarize_array`] with an explicit clock for overdue checks
pub fn summarize_array_at(
    items: &[Value],
    options: &SummaryOptions,
    now: DateTime<Utc>,
) -> ArraySummary {
    let max = options.sample_size();
    let stats = if options.include_stats {
        generate_stats(items, now)
    } else {
        None
    };

    ArraySummary {
        total_count: items.len(),
        sample_items: items.iter().take(max).cloned().collect(),
        stats,
        has_more: items.len() > max,
        remaining_count: items.len().saturating_sub(max),
    }
}

// ============================================================================
// Entity kinds
// ============================================================================

/// What an array holds, guessed from the operation name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Boards,
    Cards,
    Lists,
    Members,
    Labels,
    Checklists,
    Comments,
    Attachments,
    Items,
}

impl EntityKind {
    /// First substring match wins, in this order: board, card, list, member,
    /// label, checklist, comment, attachment.
    ///
    /// `get_board_lists` is therefore `Boards` and `get_checklist` is `Lists`.
    pub fn from_operation(operation: &str) -> Self {
        const PATTERNS: &[(&str, EntityKind)] = &[
            ("board", EntityKind::Boards),
            ("card", EntityKind::Cards),
            ("list", EntityKind::Lists),
            ("member", EntityKind::Members),
            ("label", EntityKind::Labels),
            ("checklist", EntityKind::Checklists),
            ("comment", EntityKind::Comments),
            ("attachment", EntityKind::Attachments),
        ];
        PATTERNS
            .iter()
            .find(|(pattern, _)| operation.contains(pattern))
            .map(|(_, kind)| *kind)
            .unwrap_or(EntityKind::Items)
    }

    pub fn singular(&self) -> &'static str {
        match self {
            EntityKind::Boards => "board",
            EntityKind::Cards => "card",
            EntityKind::Lists => "list",
            EntityKind::Members => "member",
            EntityKind::Labels => "label",
            EntityKind::Checklists => "checklist",
            EntityKind::Comments => "comment",
            EntityKind::Attachments => "attachment",
            EntityKind::Items => "item",
        }
    }
}

// ============================================================================
// Text summaries
// ============================================================================

fn stat(summary: &ArraySummary, key: &str) -> usize {
    summary
        .stats
        .as_ref()
        .and_then(|s| s.get(key))
        .copied()
        .unwrap_or(0)
}

/// One-line description, e.g. `"3 boards (2 open, 1 closed)"`
pub fn describe(kind: EntityKind, summary: &ArraySummary) -> String {
    let noun = kind.singular();
    let mut parts = vec![format!(
        "{} {}{}",
        summary.total_count,
        noun,
        if summary.total_count == 1 { "" } else { "s" }
    )];

    let mut stat_parts = Vec::new();
    match kind {
        EntityKind::Boards => {
            for key in ["open", "closed"] {
                let n = stat(summary, key);
                if n > 0 {
                    stat_parts.push(format!("{} {}", n, key));
                }
            }
        }
        EntityKind::Cards => {
            let with_due = stat(summary, "withDueDate");
            if with_due > 0 {
                stat_parts.push(format!("{} with due dates", with_due));
                let overdue = stat(summary, "overdue");
                if overdue > 0 {
                    stat_parts.push(format!("{} overdue", overdue));
                }
            }
            for key in ["completed", "archived"] {
                let n = stat(summary, key);
                if n > 0 {
                    stat_parts.push(format!("{} {}", n, key));
                }
            }
        }
        _ => {}
    }
    if !stat_parts.is_empty() {
        parts.push(format!("({})", stat_parts.join(", ")));
    }

    if summary.has_more {
        parts.push(format!("- showing first {}", summary.sample_items.len()));
    }

    parts.join(" ")
}

/// `{id, name}` for a sample item, falling back through username and
/// fullName before `[unnamed]`
fn identify(item: &Value) -> Value {
    let mut out = Map::new();
    if let Some(id) = item.get("id") {
        out.insert("id".to_string(), id.clone());
    }

    let name = ["name", "username", "fullName"]
        .iter()
        .map(|key| item.get(*key))
        .find(|v| is_truthy(*v))
        .flatten()
        .cloned()
        .unwrap_or_else(|| Value::String(UNNAMED.to_string()));
    out.insert("name".to_string(), name);

    Value::Object(out)
}

/// The object an optimizer returns in place of a summarized array
pub fn summary_response(items: &[Value], operation: &str, options: &SummaryOptions) -> Value {
    summary_response_at(items, operation, options, Utc::now())
}

pub fn summary_response_at(
    items: &[Value],
    operation: &str,
    options: &SummaryOptions,
    now: DateTime<Utc>,
) -> Value {
    let kind = EntityKind::from_operation(operation);
    let summary = summarize_array_at(items, options, now);
    let text = describe(kind, &summary);

    let mut body = Map::new();
    body.insert("text".to_string(), Value::String(text));
    body.insert("totalCount".to_string(), Value::from(summary.total_count));
    body.insert(
        "items".to_string(),
        Value::Array(summary.sample_items.iter().map(identify).collect()),
    );
    if let Some(stats) = &summary.stats {
        body.insert("stats".to_string(), json!(stats));
    }
    body.insert("hasMore".to_string(), Value::Bool(summary.has_more));
    body.insert(
        "remainingCount".to_string(),
        Value::from(summary.remaining_count),
    );

    json!({ "summary": body })
}
