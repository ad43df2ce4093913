//! Logging configuration from TOML (`[logging]` section)
//!
//! ```toml
//! [logging]
//! file = "ballot.log"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Also write log lines to this file (overridden by `--log-file`)
    pub file: Option<PathBuf>,
}
