//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod audit;
pub mod clock;
pub mod directory;
pub mod notification;
pub mod permission;
pub mod persistence;
pub mod revote_scheduler;
