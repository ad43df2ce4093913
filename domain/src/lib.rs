//! Domain layer for ballot
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns, and
//! nothing in it performs I/O or reads the clock: callers pass `now`.
//!
//! # Core Concepts
//!
//! ## Apportionment
//!
//! A conference seats a fixed number of delegates. Seats are distributed
//! across child groups in proportion to their membership (Hare quota,
//! largest remainder), then filled from each group's nominations in
//! priority order.
//!
//! ## Sessions and Tallies
//!
//! A voting session walks a queue of change requests one at a time:
//! introduce, vote, tally. A tally needs a quorum of the eligible voters
//! and a majority of the chosen [`MajorityType`].
//!
//! ## Elections and Positions
//!
//! An election picks one winner among accepted candidates; the winner can
//! then be placed into a [`Position`] whose holder history is kept.

pub mod apportionment;
pub mod core;
pub mod election;
pub mod position;
pub mod session;
pub mod tally;
pub mod timer;

// Re-export commonly used types
pub use apportionment::{
    Apportionment, DelegateAllocation, DelegateConference, DelegateNomination, Group,
    GroupMembership, NominationStatus, SelectionDecision, apportion, finalize_selection,
};
pub use core::{
    error::DomainError,
    ids::{
        AssignmentId, CandidateId, ConferenceId, ElectionId, GroupId, ItemId, NominationId,
        PositionId, SessionId, UserId,
    },
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use election::{
    Candidate, CandidateTally, Election, ElectionBallot, ElectionOutcome, ElectionStatus,
    NominationResponse, VoteChange, calculate_election_winner,
};
pub use position::{
    AssignmentSource, HolderChangeReason, HolderHistoryEntry, Position, PositionAssignment,
    TermLength, VacancyReason,
};
pub use session::{
    ChangeRequest, ItemDecision, ItemStatus, SessionBallot, SessionPhase, SessionProgress,
    SessionSnapshot, VotingSession,
};
pub use tally::{
    MajorityType, QuorumFraction, TallyOutcome, TallyRule, Verdict, VoteChoice, VoteCount, tally,
};
pub use timer::{LocalCountdown, SyncedCountdown, TickOutcome, TimerState};
