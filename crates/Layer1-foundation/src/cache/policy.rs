//! Cache policy - what gets cached, and for how long
//!
//! Three tables drive caching decisions:
//!
//! - `cacheable`: read operations whose responses may be cached
//! - `ttl_secs`: per-operation TTL (falls back to `default_ttl_secs`)
//! - `invalidations`: write operation → read operations it makes stale

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::storage::JsonStore;
use crate::Result;

/// Caching rules keyed by operation name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePolicy {
    #[serde(default)]
    pub cacheable: BTreeSet<String>,

    #[serde(default)]
    pub ttl_secs: BTreeMap<String, u64>,

    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    #[serde(default)]
    pub invalidations: BTreeMap<String, Vec<String>>,
}

fn default_ttl_secs() -> u64 {
    180
}

const BUILTIN_CACHEABLE: &[&str] = &[
    "get_boards",
    "get_board",
    "get_board_lists",
    "get_board_members",
    "get_board_labels",
    "get_list",
    "get_cards_in_list",
    "get_card",
    "get_comments",
    "get_attachments",
    "get_card_members",
    "get_card_labels",
    "get_me",
    "get_member",
    "get_member_boards",
    "get_member_cards",
    "get_label",
    "get_checklist",
    "get_checkitems",
    "get_checkitem",
];

const BUILTIN_TTLS: &[(&str, u64)] = &[
    // Identity data rarely changes
    ("get_me", 600),
    ("get_member", 600),
    ("get_boards", 300),
    ("get_board", 300),
    ("get_board_lists", 300),
    ("get_board_members", 300),
    ("get_board_labels", 300),
    ("get_card", 120),
    ("get_cards_in_list", 120),
    ("get_comments", 60),
    ("get_attachments", 180),
];

const BUILTIN_INVALIDATIONS: &[(&[&str], &[&str])] = &[
    (&["create_board"], &["get_boards"]),
    (
        &["update_board", "delete_board", "close_board", "reopen_board"],
        &["get_board", "get_boards"],
    ),
    (&["create_list"], &["get_board_lists", "get_list"]),
    (
        &["update_list", "archive_list", "unarchive_list"],
        &["get_list", "get_board_lists"],
    ),
    (&["move_list_to_board"], &["get_board_lists"]),
    (
        &[
            "create_card",
            "update_card",
            "delete_card",
            "archive_card",
            "unarchive_card",
            "move_card_to_list",
        ],
        &["get_card", "get_cards_in_list"],
    ),
    (&["add_comment"], &["get_comments"]),
    (
        &["add_member", "remove_member"],
        &["get_card_members", "get_board_members"],
    ),
    (
        &["create_label", "update_label", "delete_label"],
        &["get_label", "get_board_labels"],
    ),
    (&["add_label", "remove_label"], &["get_card_labels"]),
    (
        &["create_checklist", "update_checklist", "delete_checklist"],
        &["get_checklist"],
    ),
    (
        &["create_checkitem", "update_checkitem", "delete_checkitem"],
        &["get_checkitem", "get_checkitems"],
    ),
];

impl Default for CachePolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CachePolicy {
    /// Policy with no cacheable operations
    pub fn empty() -> Self {
        Self {
            cacheable: BTreeSet::new(),
            ttl_secs: BTreeMap::new(),
            default_ttl_secs: default_ttl_secs(),
            invalidations: BTreeMap::new(),
        }
    }

    /// Built-in tables for the board/list/card API surface
    pub fn builtin() -> Self {
        let mut policy = Self::empty();

        policy.cacheable = BUILTIN_CACHEABLE.iter().map(|s| s.to_string()).collect();
        policy.ttl_secs = BUILTIN_TTLS
            .iter()
            .map(|(op, ttl)| (op.to_string(), *ttl))
            .collect();

        for (writes, reads) in BUILTIN_INVALIDATIONS {
            let targets: Vec<String> = reads.iter().map(|s| s.to_string()).collect();
            for write in *writes {
                policy.invalidations.insert(write.to_string(), targets.clone());
            }
        }

        policy
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(store: &JsonStore, filename: &str) -> Result<Self> {
        store.load(filename)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_cacheable(&self, operation: &str) -> bool {
        self.cacheable.contains(operation)
    }

    pub fn ttl_for(&self, operation: &str) -> Duration {
        let secs = self
            .ttl_secs
            .get(operation)
            .copied()
            .unwrap_or(self.default_ttl_secs);
        Duration::from_secs(secs)
    }

    /// Read operations made stale by `write_operation` (empty if unknown)
    pub fn invalidation_targets(&self, write_operation: &str) -> &[String] {
        self.invalidations
            .get(write_operation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ========================================================================
    // Builders
    // ========================================================================

    pub fn with_cacheable(mut self, operation: impl Into<String>) -> Self {
        self.cacheable.insert(operation.into());
        self
    }

    pub fn with_ttl(mut self, operation: impl Into<String>, ttl: Duration) -> Self {
        self.ttl_secs.insert(operation.into(), ttl.as_secs());
        self
    }

    pub fn with_invalidation<I, S>(mut self, write_operation: impl Into<String>, reads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invalidations.insert(
            write_operation.into(),
            reads.into_iter().map(Into::into).collect(),
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_cacheable() {
        let policy = CachePolicy::builtin();

        assert!(policy.is_cacheable("get_card"));
        assert!(policy.is_cacheable("get_checkitem"));
        assert!(!policy.is_cacheable("update_card"));
        assert!(!policy.is_cacheable("search"));
        assert_eq!(policy.cacheable.len(), 20);
    }

    #[test]
    fn test_builtin_ttls() {
        let policy = CachePolicy::builtin();

        assert_eq!(policy.ttl_for("get_me"), Duration::from_secs(600));
        assert_eq!(policy.ttl_for("get_board"), Duration::from_secs(300));
        assert_eq!(policy.ttl_for("get_card"), Duration::from_secs(120));
        assert_eq!(policy.ttl_for("get_comments"), Duration::from_secs(60));
        assert_eq!(policy.ttl_for("get_checklist"), Duration::from_secs(180));
    }

    #[test]
    fn test_builtin_invalidations() {
        let policy = CachePolicy::builtin();

        assert_eq!(
            policy.invalidation_targets("update_card"),
            &["get_card".to_string(), "get_cards_in_list".to_string()]
        );
        assert_eq!(
            policy.invalidation_targets("move_list_to_board"),
            &["get_board_lists".to_string()]
        );
        assert!(policy.invalidation_targets("get_card").is_empty());
    }

    #[test]
    fn test_from_json_partial() {
        let policy = CachePolicy::from_json_str(
            r#"{"cacheable": ["get_widget"], "ttlSecs": {"get_widget": 5}}"#,
        )
        .unwrap();

        assert!(policy.is_cacheable("get_widget"));
        assert!(!policy.is_cacheable("get_card"));
        assert_eq!(policy.ttl_for("get_widget"), Duration::from_secs(5));
        assert_eq!(policy.ttl_for("other"), Duration::from_secs(180));
    }

    #[test]
    fn test_builders_and_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let policy = CachePolicy::empty()
            .with_cacheable("get_widget")
            .with_ttl("get_widget", Duration::from_secs(30))
            .with_invalidation("update_widget", ["get_widget"]);
        store.save("cache-policy.json", &policy).unwrap();

        let loaded = CachePolicy::load(&store, "cache-policy.json").unwrap();
        assert_eq!(loaded, policy);
        assert_eq!(
            loaded.invalidation_targets("update_widget"),
            &["get_widget".to_string()]
        );
    }
}
