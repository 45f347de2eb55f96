//! Array statistics
//!
//! The first item decides which family of counters applies:
//!
//! | key on first item | counters                                         |
//! |-------------------|--------------------------------------------------|
//! | `due`             | withDueDate, overdue, completed, archived        |
//! | `closed`          | open, closed                                     |
//! | `state`           | complete, incomplete                             |
//!
//! A key set to `null` still counts as present.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

pub type SummaryStats = BTreeMap<String, usize>;

/// Loose truthiness: null, false, 0, NaN and "" are falsy
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// RFC 3339 / `YYYY-MM-DD` strings or epoch milliseconds
pub(crate) fn parse_due(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| Utc.from_utc_datetime(&naive))
            }),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

fn count<F>(items: &[Value], pred: F) -> usize
where
    F: Fn(&Value) -> bool,
{
    items.iter().filter(|item| pred(item)).count()
}

fn state_equals(item: &Value, state: &str) -> bool {
    item.get("state").and_then(Value::as_str) == Some(state)
}

/// Counters for `items`, or `None` when empty or no family applies
pub fn generate_stats(items: &[Value], now: DateTime<Utc>) -> Option<SummaryStats> {
    let first = items.first()?.as_object()?;
    let mut stats = SummaryStats::new();

    if first.contains_key("due") {
        stats.insert(
            "withDueDate".to_string(),
            count(items, |item| is_truthy(item.get("due"))),
        );
        stats.insert(
            "overdue".to_string(),
            count(items, |item| {
                is_truthy(item.get("due"))
                    && !is_truthy(item.get("dueComplete"))
                    && item
                        .get("due")
                        .and_then(parse_due)
                        .map(|due| due < now)
                        .unwrap_or(false)
            }),
        );
        stats.insert(
            "completed".to_string(),
            count(items, |item| is_truthy(item.get("dueComplete"))),
        );
        stats.insert(
            "archived".to_string(),
            count(items, |item| is_truthy(item.get("closed"))),
        );
    } else if first.contains_key("closed") {
        let closed = count(items, |item| is_truthy(item.get("closed")));
        stats.insert("open".to_string(), items.len() - closed);
        stats.insert("closed".to_string(), closed);
    } else if first.contains_key("state") {
        stats.insert(
            "complete".to_string(),
            count(items, |item| state_equals(item, "complete")),
        );
        stats.insert(
            "incomplete".to_string(),
            count(items, |item| state_equals(item, "incomplete")),
        );
    } else {
        return None;
    }

    Some(stats)
}
