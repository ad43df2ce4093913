//! Infrastructure layer for ballot
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod notification;
pub mod permissions;
pub mod revote;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileAuditConfig, FileConfig, FileDelegatesConfig, FileElectionConfig,
    FileLoggingConfig, FilePermissionsConfig, FileSessionConfig,
};
pub use logging::{AuditOpenError, JsonlAuditLog};
pub use notification::TracingNotifier;
pub use permissions::StaticPermissions;
pub use revote::MemoryRevoteScheduler;
pub use store::{MemoryStore, StoredElectionResult, StoredHolder};
