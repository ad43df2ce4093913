//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod assign_position;
pub mod countdown;
pub mod finalize_delegates;
pub mod run_election;
pub(crate) mod shared;
#[cfg(test)]
pub(crate) mod test_support;
pub mod voting_session;
