//! Operation classification and per-kind default levels
//!
//! List endpoints and fire-and-forget actions default to `minimal`, single
//! entity reads to `standard`, and admin writes (whose echo the caller
//! usually wants to inspect) to `detailed`.

use pare_foundation::DetailLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Returns a collection
    List,
    /// Returns one entity
    Detail,
    /// Creates, updates or deletes an entity
    Admin,
    /// Small state change (archive, move, label, ...)
    Action,
}

const LIST_OPERATIONS: &[&str] = &[
    "get_boards",
    "get_board_lists",
    "get_board_members",
    "get_board_labels",
    "get_cards_in_list",
    "get_comments",
    "get_attachments",
    "get_member_boards",
    "get_member_cards",
    "get_boards_invited",
    "get_member_organizations",
    "get_notifications",
    "search_members",
    "get_organization_members",
    "get_card_members",
    "get_card_labels",
    "get_checkitems",
];

const DETAIL_OPERATIONS: &[&str] = &[
    "get_board",
    "get_list",
    "get_card",
    "get_me",
    "get_member",
    "get_avatar",
    "get_label",
    "get_checklist",
    "get_checkitem",
    "get_checklist_board",
    "get_checklist_card",
];

const ADMIN_OPERATIONS: &[&str] = &[
    "create_board",
    "update_board",
    "delete_board",
    "create_list",
    "update_list",
    "create_card",
    "update_card",
    "delete_card",
    "update_me",
    "create_label",
    "update_label",
    "delete_label",
    "create_label_on_card",
    "create_checklist",
    "update_checklist",
    "delete_checklist",
    "create_checkitem",
    "update_checkitem",
    "delete_checkitem",
];

const ACTION_OPERATIONS: &[&str] = &[
    "close_board",
    "reopen_board",
    "archive_list",
    "unarchive_list",
    "move_list_to_board",
    "archive_all_cards",
    "move_all_cards",
    "update_list_position",
    "update_list_name",
    "subscribe_to_list",
    "archive_card",
    "unarchive_card",
    "move_card_to_list",
    "add_comment",
    "add_attachment",
    "delete_attachment",
    "add_member",
    "remove_member",
    "add_label",
    "remove_label",
    "set_due_date",
    "set_due_complete",
    "update_label_name",
    "update_label_color",
    "add_label_to_card",
    "remove_label_from_card",
    "update_checklist_name",
    "update_checklist_position",
    "update_checkitem_state_on_card",
];

impl OperationKind {
    /// `None` for operations outside the known API surface
    pub fn classify(operation: &str) -> Option<Self> {
        let tables = [
            (LIST_OPERATIONS, OperationKind::List),
            (DETAIL_OPERATIONS, OperationKind::Detail),
            (ADMIN_OPERATIONS, OperationKind::Admin),
            (ACTION_OPERATIONS, OperationKind::Action),
        ];
        tables
            .iter()
            .find(|(ops, _)| ops.contains(&operation))
            .map(|(_, kind)| *kind)
    }

    pub fn default_level(&self) -> DetailLevel {
        match self {
            OperationKind::List | OperationKind::Action => DetailLevel::Minimal,
            OperationKind::Detail => DetailLevel::Standard,
            OperationKind::Admin => DetailLevel::Detailed,
        }
    }
}

/// Default level for an operation; unknown operations get `standard`
pub fn default_level_for(operation: &str) -> DetailLevel {
    OperationKind::classify(operation)
        .map(|kind| kind.default_level())
        .unwrap_or(DetailLevel::Standard)
}
