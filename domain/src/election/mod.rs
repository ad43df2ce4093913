//! Election domain
//!
//! Candidate lifecycle (nominated → accepted/declined), one vote per voter
//! with explicit vote changes, and deterministic winner resolution.

pub mod entities;
pub mod winner;

pub use entities::{
    Candidate, Election, ElectionBallot, ElectionStatus, NominationResponse, VoteChange,
};
pub use winner::{CandidateTally, ElectionOutcome, calculate_election_winner};
