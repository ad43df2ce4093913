//! Application-level configuration.
//!
//! - [`SessionParams`] - default tally rule and voting window for sessions

pub mod session_params;

pub use session_params::SessionParams;
