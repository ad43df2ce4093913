//! Logging infrastructure - structured decision timeline.
//!
//! Provides [`JsonlAuditLog`], an append-only JSONL file writer that
//! implements the [`AuditLog`](ballot_application::AuditLog) port.

mod jsonl_audit;

pub use jsonl_audit::{AuditOpenError, JsonlAuditLog};
