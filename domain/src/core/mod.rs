//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`] - typed identifiers for groups, users, sessions, elections, etc.
//! - [`error::DomainError`] - domain-level errors
//! - [`validation`] - configuration issue reporting

pub mod error;
pub mod ids;
pub mod validation;
