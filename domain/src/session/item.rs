//! Votable items and queue ordering

use crate::core::ids::{ItemId, UserId};
use serde::{Deserialize, Serialize};

/// Status of a votable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Skipped,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Approved => "approved",
            ItemStatus::Rejected => "rejected",
            ItemStatus::Skipped => "skipped",
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed change put to the vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: ItemId,
    pub title: String,
    pub author: UserId,
    pub status: ItemStatus,
    /// Explicit position set by the session manager
    pub manual_order: Option<u32>,
    /// Size of the proposed change; larger changes are voted on first
    pub size: u64,
}

impl ChangeRequest {
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, author: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            status: ItemStatus::Pending,
            manual_order: None,
            size: 0,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.manual_order = Some(order);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == ItemStatus::Pending
    }
}

/// Order items for voting.
///
/// Items with a manual order come first, ascending. The rest follow by
/// descending size. Both sorts are stable, so equal keys keep input order.
pub fn order_queue(mut items: Vec<ChangeRequest>) -> Vec<ChangeRequest> {
    items.sort_by(|a, b| match (a.manual_order, b.manual_order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => b.size.cmp(&a.size),
    });
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[ChangeRequest]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_manual_order_before_size() {
        let queue = order_queue(vec![
            ChangeRequest::new("big", "Big", "u1").with_size(900),
            ChangeRequest::new("second", "Second", "u1").with_order(2),
            ChangeRequest::new("small", "Small", "u1").with_size(10),
            ChangeRequest::new("first", "First", "u1").with_order(1).with_size(1),
        ]);
        assert_eq!(ids(&queue), vec!["first", "second", "big", "small"]);
    }

    #[test]
    fn test_equal_size_keeps_input_order() {
        let queue = order_queue(vec![
            ChangeRequest::new("x", "X", "u1").with_size(5),
            ChangeRequest::new("y", "Y", "u1").with_size(5),
        ]);
        assert_eq!(ids(&queue), vec!["x", "y"]);
    }

    #[test]
    fn test_status_resolution() {
        assert!(!ItemStatus::Pending.is_resolved());
        assert!(ItemStatus::Skipped.is_resolved());
        assert_eq!(ItemStatus::Approved.to_string(), "approved");
    }
}
