//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Values are kept as plain strings and numbers and parsed into domain
//! types by the `parse_*` helpers, which report problems as
//! [`ConfigIssue`]s instead of failing the whole load.

mod audit;
mod delegates;
mod election;
mod logging;
mod permissions;
mod session;

pub use audit::FileAuditConfig;
pub use delegates::FileDelegatesConfig;
pub use election::FileElectionConfig;
pub use logging::FileLoggingConfig;
pub use permissions::FilePermissionsConfig;
pub use session::FileSessionConfig;

use ballot_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Tally rule and voting window for sessions
    pub session: FileSessionConfig,
    /// Election defaults
    pub election: FileElectionConfig,
    /// Delegate apportionment defaults
    pub delegates: FileDelegatesConfig,
    /// JSONL timeline
    pub audit: FileAuditConfig,
    /// Who may do what
    pub permissions: FilePermissionsConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.session.to_session_params().1);
        issues.extend(self.election.parse_majority().1);
        issues.extend(self.delegates.validate());
        issues.extend(self.permissions.parse_grants().1);

        issues
    }
}
