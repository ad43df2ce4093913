//! Table-driven permission checker
//!
//! [`StaticPermissions`] answers [`PermissionChecker`] queries from the
//! `[permissions]` configuration section. Grants are global: a user granted
//! an action holds it for every resource.

use crate::config::FilePermissionsConfig;
use async_trait::async_trait;
use ballot_application::{Action, PermissionChecker, Resource};
use ballot_domain::{ConfigIssue, UserId};
use std::collections::HashSet;
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    managers: HashSet<UserId>,
    grants: HashSet<(Action, UserId)>,
    open_voting: bool,
}

impl StaticPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from configuration, returning any grant issues.
    pub fn from_config(config: &FilePermissionsConfig) -> (Self, Vec<ConfigIssue>) {
        let (grants, issues) = config.parse_grants();
        let table = Self {
            managers: config.managers().into_iter().collect(),
            grants: grants.into_iter().collect(),
            open_voting: config.open_voting,
        };
        (table, issues)
    }

    pub fn with_manager(mut self, user: impl Into<UserId>) -> Self {
        self.managers.insert(user.into());
        self
    }

    pub fn with_grant(mut self, action: Action, user: impl Into<UserId>) -> Self {
        self.grants.insert((action, user.into()));
        self
    }

    pub fn with_open_voting(mut self, open: bool) -> Self {
        self.open_voting = open;
        self
    }

    fn allows(&self, actor: &UserId, action: Action) -> bool {
        if action == Action::CastVote && self.open_voting {
            return true;
        }
        self.managers.contains(actor) || self.grants.contains(&(action, actor.clone()))
    }
}

#[async_trait]
impl PermissionChecker for StaticPermissions {
    async fn can(&self, actor: &UserId, action: Action, resource: &Resource) -> bool {
        let allowed = self.allows(actor, action);
        trace!("{} {} on {}: {}", actor, action, resource, allowed);
        allowed
    }
}
