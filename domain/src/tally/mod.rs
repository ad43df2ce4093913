//! Vote tally domain
//!
//! Pure, side-effect free functions that turn a set of cast votes into a
//! verdict. Used by the voting session controller for change requests and,
//! through [`MajorityType`], by the election engine.
//!
//! ```text
//! votes ──► count_votes ──► VoteCount ─┬─► is_quorum_reached ─┐
//!                                      └─► calculate_majority ┴─► Verdict
//! ```

pub mod rule;
pub mod verdict;
pub mod vote;

pub use rule::{MajorityType, QuorumFraction, TallyRule};
pub use verdict::{
    MajorityResult, TallyOutcome, Verdict, calculate_majority, is_quorum_reached, tally,
};
pub use vote::{VoteChoice, VoteCount, count_votes};
