//! Audit trail configuration from TOML (`[audit]` section)
//!
//! ```toml
//! [audit]
//! enabled = true
//! path = "/var/log/ballot/timeline.jsonl"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuditConfig {
    pub enabled: bool,
    /// Explicit JSONL file; defaults to the platform data directory
    pub path: Option<PathBuf>,
}

impl Default for FileAuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl FileAuditConfig {
    /// Where the timeline should be written, if auditing is enabled.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        self.path.clone().or_else(Self::default_path)
    }

    /// `$XDG_DATA_HOME/ballot/timeline.jsonl`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("ballot").join("timeline.jsonl"))
    }
}
