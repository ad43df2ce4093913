//! Permission port
//!
//! Capability check consumed before any mutation. A denied check
//! short-circuits the use case before a transaction is attempted.
//!
//! # Built-in Implementations
//!
//! - [`AllowAll`] - every actor may do everything
//! - [`DenyAll`] - nobody may do anything
//!
//! A table-driven implementation lives in the infrastructure layer.

use async_trait::async_trait;
use ballot_domain::{ConferenceId, ElectionId, PositionId, SessionId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Guarded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    FinalizeDelegates,
    ManageSession,
    CastVote,
    ManageElection,
    AssignPosition,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::FinalizeDelegates => "finalize_delegates",
            Action::ManageSession => "manage_session",
            Action::CastVote => "cast_vote",
            Action::ManageElection => "manage_election",
            Action::AssignPosition => "assign_position",
        }
    }

    pub fn all() -> [Action; 5] {
        [
            Action::FinalizeDelegates,
            Action::ManageSession,
            Action::CastVote,
            Action::ManageElection,
            Action::AssignPosition,
        ]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::all()
            .into_iter()
            .find(|a| a.as_str() == s.trim().to_lowercase().replace('-', "_"))
            .ok_or_else(|| format!("unknown action: {}", s))
    }
}

/// What an action is performed on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Conference(ConferenceId),
    Session(SessionId),
    Election(ElectionId),
    Position(PositionId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Conference(id) => write!(f, "conference:{}", id),
            Resource::Session(id) => write!(f, "session:{}", id),
            Resource::Election(id) => write!(f, "election:{}", id),
            Resource::Position(id) => write!(f, "position:{}", id),
        }
    }
}

#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Whether `actor` may perform `action` on `resource`.
    async fn can(&self, actor: &UserId, action: Action, resource: &Resource) -> bool;
}

pub struct AllowAll;

#[async_trait]
impl PermissionChecker for AllowAll {
    async fn can(&self, _actor: &UserId, _action: Action, _resource: &Resource) -> bool {
        true
    }
}

pub struct DenyAll;

#[async_trait]
impl PermissionChecker for DenyAll {
    async fn can(&self, _actor: &UserId, _action: Action, _resource: &Resource) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse() {
        assert_eq!(
            "manage-session".parse::<Action>().unwrap(),
            Action::ManageSession
        );
        assert_eq!(
            "FINALIZE_DELEGATES".parse::<Action>().unwrap(),
            Action::FinalizeDelegates
        );
        assert!("launch_rockets".parse::<Action>().is_err());
    }

    #[test]
    fn test_resource_display() {
        assert_eq!(
            Resource::Session(SessionId::new("s1")).to_string(),
            "session:s1"
        );
    }

    #[tokio::test]
    async fn test_builtin_checkers() {
        let actor = UserId::new("u1");
        let resource = Resource::Election(ElectionId::new("e1"));
        assert!(AllowAll.can(&actor, Action::ManageElection, &resource).await);
        assert!(!DenyAll.can(&actor, Action::ManageElection, &resource).await);
    }
}
