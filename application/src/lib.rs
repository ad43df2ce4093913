//! Application layer for ballot
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::SessionParams;
pub use ports::{
    audit::{AuditError, AuditLog, NoAuditLog, TimelineEvent},
    clock::{Clock, FixedClock, SystemClock},
    directory::{DirectoryError, GroupDirectory},
    notification::{
        NoNotifications, Notification, NotificationDispatcher, NotificationError,
        NotificationKind,
    },
    permission::{Action, AllowAll, DenyAll, PermissionChecker, Resource},
    persistence::{EntityWrite, PersistenceError, TransactionApplier, WriteBatch},
    revote_scheduler::{RevoteRequest, RevoteScheduler, SchedulingError},
};
pub use use_cases::assign_position::{PositionError, PositionScheduler};
pub use use_cases::countdown::{drive_local_countdown, drive_synced_countdown};
pub use use_cases::finalize_delegates::{
    FinalizeDelegatesOutput, FinalizeDelegatesUseCase, FinalizeError,
};
pub use use_cases::run_election::{ElectionEngine, ElectionError};
pub use use_cases::voting_session::{SessionError, VotingSessionController};
