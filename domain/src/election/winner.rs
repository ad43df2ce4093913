//! Election winner determination

use super::entities::ElectionStatus;
use crate::core::ids::CandidateId;
use crate::tally::MajorityType;
use serde::{Deserialize, Serialize};

/// Vote count for one accepted candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub candidate_id: CandidateId,
    pub votes: usize,
}

impl CandidateTally {
    pub fn new(candidate_id: impl Into<CandidateId>, votes: usize) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            votes,
        }
    }
}

/// Result of [`calculate_election_winner`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionOutcome {
    pub status: ElectionStatus,
    pub winner: Option<CandidateId>,
    pub is_tie: bool,
    pub total_votes: usize,
    pub tallies: Vec<CandidateTally>,
}

/// Determine the winner from per-candidate counts.
///
/// - no votes at all: `NoWinner`
/// - two or more candidates share the top count: tie, `RunoffRequired`
/// - a unique leader that misses the threshold: `NoWinner`
/// - otherwise: `Completed` with the leader as winner
///
/// Thresholds: `Simple` needs a unique plurality leader, `Absolute` needs
/// more than half of `total_eligible`, `TwoThirds` needs two thirds of the
/// votes cast.
///
/// ```
/// use ballot_domain::election::{calculate_election_winner, CandidateTally, ElectionStatus};
/// use ballot_domain::tally::MajorityType;
///
/// let tallies = vec![
///     CandidateTally::new("X", 5),
///     CandidateTally::new("Y", 5),
///     CandidateTally::new("Z", 2),
/// ];
/// let outcome = calculate_election_winner(&tallies, MajorityType::Simple, 12);
/// assert!(outcome.is_tie);
/// assert_eq!(outcome.winner, None);
/// assert_eq!(outcome.status, ElectionStatus::RunoffRequired);
/// ```
pub fn calculate_election_winner(
    tallies: &[CandidateTally],
    majority: MajorityType,
    total_eligible: usize,
) -> ElectionOutcome {
    let total_votes: usize = tallies.iter().map(|t| t.votes).sum();
    let outcome = |status, winner, is_tie| ElectionOutcome {
        status,
        winner,
        is_tie,
        total_votes,
        tallies: tallies.to_vec(),
    };

    if total_votes == 0 {
        return outcome(ElectionStatus::NoWinner, None, false);
    }

    let top = tallies.iter().map(|t| t.votes).max().unwrap_or(0);
    let mut leaders = tallies.iter().filter(|t| t.votes == top);
    let (Some(leader), None) = (leaders.next(), leaders.next()) else {
        return outcome(ElectionStatus::RunoffRequired, None, true);
    };

    let runner_up = tallies
        .iter()
        .filter(|t| t.candidate_id != leader.candidate_id)
        .map(|t| t.votes)
        .max()
        .unwrap_or(0);
    let against = match majority {
        MajorityType::Simple => runner_up,
        MajorityType::Absolute | MajorityType::TwoThirds => total_votes - top,
    };

    if majority.is_satisfied(top, against, total_eligible) {
        outcome(
            ElectionStatus::Completed,
            Some(leader.candidate_id.clone()),
            false,
        )
    } else {
        outcome(ElectionStatus::NoWinner, None, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tallies(counts: &[(&str, usize)]) -> Vec<CandidateTally> {
        counts
            .iter()
            .map(|(id, n)| CandidateTally::new(*id, *n))
            .collect()
    }

    #[test]
    fn test_unique_leader_wins_simple() {
        let outcome = calculate_election_winner(
            &tallies(&[("X", 5), ("Y", 4), ("Z", 3)]),
            MajorityType::Simple,
            20,
        );
        assert_eq!(outcome.status, ElectionStatus::Completed);
        assert_eq!(outcome.winner, Some(CandidateId::new("X")));
        assert!(!outcome.is_tie);
        assert_eq!(outcome.total_votes, 12);
    }

    #[test]
    fn test_scenario_shared_maximum_is_tie() {
        let outcome = calculate_election_winner(
            &tallies(&[("X", 5), ("Y", 5), ("Z", 2)]),
            MajorityType::Simple,
            12,
        );
        assert!(outcome.is_tie);
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.status, ElectionStatus::RunoffRequired);
    }

    #[test]
    fn test_leader_below_absolute_threshold() {
        let outcome = calculate_election_winner(
            &tallies(&[("X", 5), ("Y", 3)]),
            MajorityType::Absolute,
            12,
        );
        assert_eq!(outcome.status, ElectionStatus::NoWinner);
        assert_eq!(outcome.winner, None);
        assert!(!outcome.is_tie);

        let outcome = calculate_election_winner(
            &tallies(&[("X", 7), ("Y", 3)]),
            MajorityType::Absolute,
            12,
        );
        assert_eq!(outcome.winner, Some(CandidateId::new("X")));
    }

    #[test]
    fn test_two_thirds_of_votes_cast() {
        let miss = calculate_election_winner(
            &tallies(&[("X", 5), ("Y", 4)]),
            MajorityType::TwoThirds,
            30,
        );
        assert_eq!(miss.status, ElectionStatus::NoWinner);

        let hit = calculate_election_winner(
            &tallies(&[("X", 6), ("Y", 3)]),
            MajorityType::TwoThirds,
            30,
        );
        assert_eq!(hit.status, ElectionStatus::Completed);
    }

    #[test]
    fn test_no_votes_means_no_winner() {
        let outcome = calculate_election_winner(
            &tallies(&[("X", 0), ("Y", 0)]),
            MajorityType::Simple,
            10,
        );
        assert_eq!(outcome.status, ElectionStatus::NoWinner);
        assert!(!outcome.is_tie);

        let empty = calculate_election_winner(&[], MajorityType::Simple, 10);
        assert_eq!(empty.status, ElectionStatus::NoWinner);
    }

    #[test]
    fn test_single_candidate_with_votes_wins() {
        let outcome =
            calculate_election_winner(&tallies(&[("X", 1)]), MajorityType::Simple, 10);
        assert_eq!(outcome.winner, Some(CandidateId::new("X")));
    }
}
