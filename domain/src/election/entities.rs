//! Election domain entities

use super::winner::{CandidateTally, ElectionOutcome, calculate_election_winner};
use crate::core::error::DomainError;
use crate::core::ids::{CandidateId, ElectionId, GroupId, PositionId, UserId};
use crate::tally::MajorityType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of an election
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ElectionStatus {
    /// Open for nominations and votes
    #[default]
    Pending,
    /// A winner was determined
    Completed,
    /// The top count was shared; a follow-up election is needed
    RunoffRequired,
    /// The leader did not clear the threshold, or nobody voted
    NoWinner,
}

impl ElectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectionStatus::Pending => "pending",
            ElectionStatus::Completed => "completed",
            ElectionStatus::RunoffRequired => "runoff_required",
            ElectionStatus::NoWinner => "no_winner",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ElectionStatus::Pending)
    }
}

impl std::fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Nominee's answer to a nomination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NominationResponse {
    #[default]
    Pending,
    Accepted,
    Declined,
}

/// A candidate standing in an election
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub election_id: ElectionId,
    pub user_id: UserId,
    pub response: NominationResponse,
}

impl Candidate {
    pub fn is_accepted(&self) -> bool {
        self.response == NominationResponse::Accepted
    }
}

/// A voter's current choice in an election
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionBallot {
    pub voter: UserId,
    pub candidate_id: CandidateId,
    pub cast_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A vote moved from one candidate to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteChange {
    pub previous: CandidateId,
    pub ballot: ElectionBallot,
}

/// An election with its candidates and ballots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub title: String,
    pub group_id: GroupId,
    /// Position the winner will hold, if already linked
    pub position_id: Option<PositionId>,
    pub majority: MajorityType,
    pub status: ElectionStatus,
    pub winner: Option<CandidateId>,
    pub completed_at: Option<DateTime<Utc>>,
    candidates: Vec<Candidate>,
    ballots: Vec<ElectionBallot>,
}

impl Election {
    pub fn new(
        id: impl Into<ElectionId>,
        title: impl Into<String>,
        group_id: impl Into<GroupId>,
        majority: MajorityType,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            group_id: group_id.into(),
            position_id: None,
            majority,
            status: ElectionStatus::Pending,
            winner: None,
            completed_at: None,
            candidates: Vec::new(),
            ballots: Vec::new(),
        }
    }

    pub fn with_position(mut self, position_id: impl Into<PositionId>) -> Self {
        self.position_id = Some(position_id.into());
        self
    }

    // ==================== Queries ====================

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate(&self, id: &CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| &c.id == id)
    }

    pub fn ballots(&self) -> &[ElectionBallot] {
        &self.ballots
    }

    pub fn ballot_of(&self, voter: &UserId) -> Option<&ElectionBallot> {
        self.ballots.iter().find(|b| &b.voter == voter)
    }

    /// The winning candidate, once completed
    pub fn winning_candidate(&self) -> Option<&Candidate> {
        self.winner.as_ref().and_then(|id| self.candidate(id))
    }

    /// Vote counts per accepted candidate, in nomination order
    pub fn tallies(&self) -> Vec<CandidateTally> {
        self.candidates
            .iter()
            .filter(|c| c.is_accepted())
            .map(|c| CandidateTally {
                candidate_id: c.id.clone(),
                votes: self
                    .ballots
                    .iter()
                    .filter(|b| b.candidate_id == c.id)
                    .count(),
            })
            .collect()
    }

    // ==================== Candidate lifecycle ====================

    pub fn nominate(
        &mut self,
        candidate_id: impl Into<CandidateId>,
        user_id: impl Into<UserId>,
    ) -> Result<&Candidate, DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::ElectionNotPending);
        }
        let candidate_id = candidate_id.into();
        let user_id = user_id.into();
        if self.candidates.iter().any(|c| c.user_id == user_id) {
            return Err(DomainError::DuplicateCandidate(user_id.to_string()));
        }
        if self.candidates.iter().any(|c| c.id == candidate_id) {
            return Err(DomainError::DuplicateCandidate(candidate_id.to_string()));
        }

        self.candidates.push(Candidate {
            id: candidate_id,
            election_id: self.id.clone(),
            user_id,
            response: NominationResponse::Pending,
        });
        Ok(&self.candidates[self.candidates.len() - 1])
    }

    /// Accept or decline a nomination. Only the nominee may answer.
    pub fn respond_to_nomination(
        &mut self,
        candidate_id: &CandidateId,
        actor: &UserId,
        accept: bool,
    ) -> Result<&Candidate, DomainError> {
        let candidate = self
            .candidates
            .iter_mut()
            .find(|c| &c.id == candidate_id)
            .ok_or_else(|| DomainError::UnknownCandidate(candidate_id.to_string()))?;
        if &candidate.user_id != actor {
            return Err(DomainError::NotNominee);
        }
        if candidate.response != NominationResponse::Pending {
            return Err(DomainError::NominationAlreadyAnswered(candidate_id.to_string()));
        }

        candidate.response = if accept {
            NominationResponse::Accepted
        } else {
            NominationResponse::Declined
        };
        Ok(&*candidate)
    }

    // ==================== Voting ====================

    pub fn cast_vote(
        &mut self,
        voter: UserId,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<ElectionBallot, DomainError> {
        if self.status != ElectionStatus::Pending {
            return Err(DomainError::ElectionNotPending);
        }
        self.require_accepted(candidate_id)?;
        if self.ballot_of(&voter).is_some() {
            return Err(DomainError::AlreadyVoted(voter.to_string()));
        }

        let ballot = ElectionBallot {
            voter,
            candidate_id: candidate_id.clone(),
            cast_at: now,
            updated_at: now,
        };
        self.ballots.push(ballot.clone());
        Ok(ballot)
    }

    /// Move an existing vote to another accepted candidate.
    ///
    /// Not restricted by election status.
    pub fn change_vote(
        &mut self,
        voter: &UserId,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<VoteChange, DomainError> {
        self.require_accepted(candidate_id)?;
        let ballot = self
            .ballots
            .iter_mut()
            .find(|b| &b.voter == voter)
            .ok_or_else(|| DomainError::NoExistingVote(voter.to_string()))?;

        let previous = std::mem::replace(&mut ballot.candidate_id, candidate_id.clone());
        ballot.updated_at = now;
        Ok(VoteChange {
            previous,
            ballot: ballot.clone(),
        })
    }

    /// Tally accepted candidates and settle the election status.
    pub fn complete(
        &mut self,
        total_eligible: usize,
        now: DateTime<Utc>,
    ) -> Result<ElectionOutcome, DomainError> {
        if self.status != ElectionStatus::Pending {
            return Err(DomainError::ElectionNotPending);
        }
        let outcome = calculate_election_winner(&self.tallies(), self.majority, total_eligible);
        self.status = outcome.status;
        self.winner = outcome.winner.clone();
        self.completed_at = Some(now);
        Ok(outcome)
    }

    fn require_accepted(&self, candidate_id: &CandidateId) -> Result<(), DomainError> {
        let candidate = self
            .candidate(candidate_id)
            .ok_or_else(|| DomainError::UnknownCandidate(candidate_id.to_string()))?;
        if !candidate.is_accepted() {
            return Err(DomainError::CandidateNotAccepted(candidate_id.to_string()));
        }
        Ok(())
    }
}
