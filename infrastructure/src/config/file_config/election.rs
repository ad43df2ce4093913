//! Election configuration from TOML (`[election]` section)
//!
//! ```toml
//! [election]
//! majority = "absolute"
//! ```

use super::session::parse_majority_field;
use ballot_domain::{ConfigIssue, MajorityType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileElectionConfig {
    /// Default majority for new elections
    pub majority: String,
}

impl Default for FileElectionConfig {
    fn default() -> Self {
        Self {
            majority: "simple".to_string(),
        }
    }
}

impl FileElectionConfig {
    pub fn parse_majority(&self) -> (MajorityType, Vec<ConfigIssue>) {
        parse_majority_field("election.majority", &self.majority)
    }
}
