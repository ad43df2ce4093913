//! Permission table from TOML (`[permissions]` section)
//!
//! Managers may perform every action. Individual actions can be granted to
//! further users, and voting can be left open to anyone.
//!
//! ```toml
//! [permissions]
//! managers = ["chair"]
//! open_voting = true
//!
//! [permissions.grants]
//! assign_position = ["secretary"]
//! manage-session = ["vice-chair"]
//! ```

use ballot_application::Action;
use ballot_domain::{ConfigIssue, ConfigIssueCode, Severity, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePermissionsConfig {
    pub managers: Vec<String>,
    /// Anyone may cast a vote
    pub open_voting: bool,
    /// Action name -> users
    pub grants: BTreeMap<String, Vec<String>>,
}

impl Default for FilePermissionsConfig {
    fn default() -> Self {
        Self {
            managers: Vec::new(),
            open_voting: true,
            grants: BTreeMap::new(),
        }
    }
}

impl FilePermissionsConfig {
    pub fn managers(&self) -> Vec<UserId> {
        self.managers.iter().map(|m| UserId::new(m.as_str())).collect()
    }

    /// Parse the grant table, skipping unknown action names.
    pub fn parse_grants(&self) -> (Vec<(Action, UserId)>, Vec<ConfigIssue>) {
        let mut grants = Vec::new();
        let mut issues = Vec::new();

        for (name, users) in &self.grants {
            match name.parse::<Action>() {
                Ok(action) => {
                    grants.extend(users.iter().map(|u| (action, UserId::new(u.as_str()))));
                }
                Err(_) => issues.push(ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: format!("permissions.grants.{}", name),
                        value: name.clone(),
                        valid_values: Action::all()
                            .iter()
                            .map(|a| a.as_str().to_string())
                            .collect(),
                    },
                    message: format!(
                        "permissions.grants: unknown action '{}', entry ignored",
                        name
                    ),
                }),
            }
        }

        (grants, issues)
    }
}
