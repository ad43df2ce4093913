//! Notification port
//!
//! Fire-and-forget delivery to a single user. Call sites treat failures as
//! best-effort: they are logged and never undo the primary mutation.

use async_trait::async_trait;
use ballot_domain::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A change request the recipient authored was decided
    ItemDecided,
    /// The recipient won an election and now holds a position
    PositionAssigned,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ItemDecided => "item_decided",
            NotificationKind::PositionAssigned => "position_assigned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(recipient: UserId, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            recipient,
            kind,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Drops every notification
pub struct NoNotifications;

#[async_trait]
impl NotificationDispatcher for NoNotifications {
    async fn notify(&self, _notification: Notification) -> Result<(), NotificationError> {
        Ok(())
    }
}
