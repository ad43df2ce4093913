//! Voting countdowns.
//!
//! - [`LocalCountdown`] - start/pause/resume/reset, ticked once per second
//! - [`SyncedCountdown`] - derived from a shared `started_at` so every
//!   observer converges on the same remaining time

pub mod local;
pub mod synced;

pub use local::{LocalCountdown, TICK, TickOutcome, TimerState};
pub use synced::{SyncedCountdown, remaining_at};
