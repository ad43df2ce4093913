//! Port for the audit/timeline log.
//!
//! Defines the [`AuditLog`] trait for recording decision events (items
//! decided, elections completed, delegates finalized, positions assigned)
//! to a structured, append-only trail.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the
//! decision record in a machine-readable format (JSONL).

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// A structured timeline event.
///
/// Each event has a type string, a UTC timestamp, and a JSON payload
/// containing event-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    /// Event type identifier (e.g., "item_decided", "election_completed").
    pub event_type: &'static str,
    pub at: DateTime<Utc>,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl TimelineEvent {
    pub fn new(event_type: &'static str, at: DateTime<Utc>, payload: Value) -> Self {
        Self {
            event_type,
            at,
            payload,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to write audit event: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to encode audit event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Port for recording timeline events.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
pub trait AuditLog: Send + Sync {
    fn record(&self, event: TimelineEvent) -> Result<(), AuditError>;
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLog;

impl AuditLog for NoAuditLog {
    fn record(&self, _event: TimelineEvent) -> Result<(), AuditError> {
        Ok(())
    }
}
