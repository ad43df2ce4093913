//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Every structural failure has its own variant so callers can react to
/// the condition instead of matching on message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Total delegates must be a positive integer")]
    InvalidDelegateCount,

    #[error("No group has any members to apportion")]
    NoMembers,

    #[error("Combined member count exceeds the supported range")]
    MemberCountOverflow,

    #[error("Quorum fraction must be between 0 and 1, got {0}")]
    InvalidQuorumFraction(String),

    #[error("Voter {0} has already voted")]
    AlreadyVoted(String),

    #[error("Operation '{operation}' is not allowed in phase '{phase}'")]
    InvalidPhase {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("No active item in session")]
    NoActiveItem,

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Item {0} is no longer pending")]
    ItemNotPending(String),

    #[error("Item {requested} is out of queue order; {expected} comes first")]
    OutOfOrder { requested: String, expected: String },

    #[error("Item {0} must be decided or skipped before moving on")]
    ItemUnresolved(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("{0} is already a candidate")]
    DuplicateCandidate(String),

    #[error("Unknown candidate: {0}")]
    UnknownCandidate(String),

    #[error("Candidate {0} has not accepted the nomination")]
    CandidateNotAccepted(String),

    #[error("Only the nominee may answer a nomination")]
    NotNominee,

    #[error("Nomination for candidate {0} was already answered")]
    NominationAlreadyAnswered(String),

    #[error("Voter {0} has no vote to change")]
    NoExistingVote(String),

    #[error("Election is no longer accepting votes")]
    ElectionNotPending,

    #[error("Election has not completed with a winner")]
    ElectionNotCompleted,

    #[error("Position {0} already has a holder")]
    PositionOccupied(String),

    #[error("Position {0} has no current holder")]
    PositionVacant(String),

    #[error("Term length of {0} days does not fit the calendar")]
    InvalidTerm(u32),

    #[error("Timer has expired; reset it before starting again")]
    TimerExpired,
}

impl DomainError {
    /// Check if this error is a duplicate vote rejection
    pub fn is_already_voted(&self) -> bool {
        matches!(self, DomainError::AlreadyVoted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_phase_display() {
        let error = DomainError::InvalidPhase {
            operation: "cast_vote",
            phase: "introduction",
        };
        assert_eq!(
            error.to_string(),
            "Operation 'cast_vote' is not allowed in phase 'introduction'"
        );
    }

    #[test]
    fn test_is_already_voted_check() {
        assert!(DomainError::AlreadyVoted("u1".to_string()).is_already_voted());
        assert!(!DomainError::NoActiveItem.is_already_voted());
        assert!(!DomainError::NoExistingVote("u1".to_string()).is_already_voted());
    }
}
