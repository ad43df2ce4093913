//! Voting session configuration from TOML (`[session]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [session]
//! quorum = 0.5            # fraction of eligible voters that must take part
//! majority = "two-thirds" # "simple", "absolute", "two-thirds"
//! voting_seconds = 90
//! ```

use ballot_application::SessionParams;
use ballot_domain::{ConfigIssue, ConfigIssueCode, MajorityType, QuorumFraction, Severity};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Quorum fraction in `0.0..=1.0`
    pub quorum: f64,
    pub majority: String,
    /// Length of the voting phase of each item
    pub voting_seconds: u64,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            quorum: 0.5,
            majority: "simple".to_string(),
            voting_seconds: 60,
        }
    }
}

impl FileSessionConfig {
    pub fn parse_quorum(&self) -> (QuorumFraction, Vec<ConfigIssue>) {
        match QuorumFraction::new(self.quorum) {
            Ok(quorum) => (quorum, vec![]),
            Err(_) => {
                let issue = ConfigIssue {
                    severity: Severity::Error,
                    code: ConfigIssueCode::OutOfRange {
                        field: "session.quorum".to_string(),
                    },
                    message: format!(
                        "session.quorum: {} is outside 0.0..=1.0, falling back to 0.5",
                        self.quorum
                    ),
                };
                (QuorumFraction::default(), vec![issue])
            }
        }
    }

    pub fn parse_majority(&self) -> (MajorityType, Vec<ConfigIssue>) {
        parse_majority_field("session.majority", &self.majority)
    }

    /// Convert to [`SessionParams`], collecting every issue on the way.
    pub fn to_session_params(&self) -> (SessionParams, Vec<ConfigIssue>) {
        let (quorum, mut issues) = self.parse_quorum();
        let (majority, majority_issues) = self.parse_majority();
        issues.extend(majority_issues);

        let mut voting_seconds = self.voting_seconds;
        if voting_seconds == 0 {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                code: ConfigIssueCode::OutOfRange {
                    field: "session.voting_seconds".to_string(),
                },
                message: "session.voting_seconds: must be positive, falling back to 60"
                    .to_string(),
            });
            voting_seconds = 60;
        }

        let params = SessionParams::default()
            .with_quorum(quorum)
            .with_majority(majority)
            .with_voting_duration(Duration::from_secs(voting_seconds));
        (params, issues)
    }
}

/// Parse a majority string, reporting a warning and using `simple` on failure.
pub(super) fn parse_majority_field(field: &str, value: &str) -> (MajorityType, Vec<ConfigIssue>) {
    match value.parse::<MajorityType>() {
        Ok(majority) => (majority, vec![]),
        Err(_) => {
            let issue = ConfigIssue {
                severity: Severity::Warning,
                code: ConfigIssueCode::InvalidEnumValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    valid_values: MajorityType::valid_values(),
                },
                message: format!(
                    "{}: unknown value '{}', falling back to 'simple'",
                    field, value
                ),
            };
            (MajorityType::Simple, vec![issue])
        }
    }
}
