//! Configuration file loading for ballot
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `BALLOT_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./ballot.toml` or `./.ballot.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/ballot/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileAuditConfig, FileConfig, FileDelegatesConfig, FileElectionConfig, FileLoggingConfig,
    FilePermissionsConfig, FileSessionConfig,
};
pub use loader::ConfigLoader;
