//! Delegate apportionment configuration from TOML (`[delegates]` section)
//!
//! ```toml
//! [delegates]
//! total = 40
//! ```

use ballot_domain::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDelegatesConfig {
    /// Default seat count when a command does not pass one
    pub total: Option<u64>,
}

impl FileDelegatesConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        match self.total {
            Some(0) => vec![ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::OutOfRange {
                    field: "delegates.total".to_string(),
                },
                message: "delegates.total: must be a positive integer".to_string(),
            }],
            _ => vec![],
        }
    }
}
