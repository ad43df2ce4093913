//! Election engine
//!
//! Runs one [`Election`]: nominations, ballots, vote changes, and the final
//! count. Every mutation follows the same path as the session controller:
//! mutate a copy, persist the entity writes as one batch, then publish.

use crate::ports::audit::{AuditLog, NoAuditLog, TimelineEvent};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::permission::{Action, PermissionChecker, Resource};
use crate::ports::persistence::{EntityWrite, PersistenceError, TransactionApplier, WriteBatch};
use crate::use_cases::shared::{is_permitted, record_best_effort};
use ballot_domain::{
    Candidate, CandidateId, CandidateTally, DomainError, Election, ElectionBallot, ElectionId,
    ElectionOutcome, ElectionStatus, UserId, VoteChange,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ElectionError {
    #[error("Permission denied: {actor} may not {action} on election {election}")]
    PermissionDenied {
        actor: UserId,
        action: Action,
        election: ElectionId,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl ElectionError {
    pub fn is_already_voted(&self) -> bool {
        matches!(self, ElectionError::Domain(e) if e.is_already_voted())
    }
}

pub struct ElectionEngine {
    election_id: ElectionId,
    election: Mutex<Election>,
    permissions: Arc<dyn PermissionChecker>,
    store: Arc<dyn TransactionApplier>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
}

impl ElectionEngine {
    pub fn new(
        election: Election,
        permissions: Arc<dyn PermissionChecker>,
        store: Arc<dyn TransactionApplier>,
    ) -> Self {
        Self {
            election_id: election.id.clone(),
            election: Mutex::new(election),
            permissions,
            store,
            audit: Arc::new(NoAuditLog),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ==================== Queries ====================

    pub fn election_id(&self) -> &ElectionId {
        &self.election_id
    }

    pub async fn election(&self) -> Election {
        self.election.lock().await.clone()
    }

    pub async fn status(&self) -> ElectionStatus {
        self.election.lock().await.status
    }

    /// Current vote count per accepted candidate
    pub async fn results(&self) -> Vec<CandidateTally> {
        self.election.lock().await.tallies()
    }

    // ==================== Candidates ====================

    /// Put `user_id` forward as a candidate. The nominee still has to accept.
    pub async fn nominate(
        &self,
        actor: &UserId,
        candidate_id: &CandidateId,
        user_id: &UserId,
    ) -> Result<Candidate, ElectionError> {
        self.authorize(actor, Action::ManageElection).await?;
        let candidate = self
            .commit("nominate", |election, _now| {
                let candidate = election
                    .nominate(candidate_id.clone(), user_id.clone())?
                    .clone();
                let writes = vec![EntityWrite::Candidate {
                    candidate: candidate.clone(),
                }];
                Ok((candidate, writes))
            })
            .await?;
        info!(
            "Election {}: {} nominated as {}",
            self.election_id, candidate.user_id, candidate.id
        );
        Ok(candidate)
    }

    /// Accept or decline a nomination. Only the nominee may answer.
    pub async fn respond_to_nomination(
        &self,
        actor: &UserId,
        candidate_id: &CandidateId,
        accept: bool,
    ) -> Result<Candidate, ElectionError> {
        self.commit("respond_to_nomination", |election, _now| {
            let candidate = election
                .respond_to_nomination(candidate_id, actor, accept)?
                .clone();
            let writes = vec![EntityWrite::Candidate {
                candidate: candidate.clone(),
            }];
            Ok((candidate, writes))
        })
        .await
    }

    // ==================== Voting ====================

    pub async fn cast_vote(
        &self,
        voter: &UserId,
        candidate_id: &CandidateId,
    ) -> Result<ElectionBallot, ElectionError> {
        self.authorize(voter, Action::CastVote).await?;
        let election_id = self.election_id.clone();
        self.commit("cast_vote", |election, now| {
            let ballot = election.cast_vote(voter.clone(), candidate_id, now)?;
            let writes = vec![EntityWrite::ElectionBallotCast {
                election_id,
                ballot: ballot.clone(),
            }];
            Ok((ballot, writes))
        })
        .await
        .map_err(|e| match e {
            ElectionError::Persistence(p) if p.is_unique_violation() => {
                DomainError::AlreadyVoted(voter.to_string()).into()
            }
            other => other,
        })
    }

    /// Move `voter`'s existing ballot to another candidate.
    pub async fn change_vote(
        &self,
        voter: &UserId,
        candidate_id: &CandidateId,
    ) -> Result<VoteChange, ElectionError> {
        self.authorize(voter, Action::CastVote).await?;
        let election_id = self.election_id.clone();
        let change = self
            .commit("change_vote", |election, now| {
                let change = election.change_vote(voter, candidate_id, now)?;
                let writes = vec![EntityWrite::ElectionBallotChanged {
                    election_id,
                    previous: change.previous.clone(),
                    ballot: change.ballot.clone(),
                }];
                Ok((change, writes))
            })
            .await?;
        debug!(
            "Election {}: {} moved vote {} -> {}",
            self.election_id, voter, change.previous, change.ballot.candidate_id
        );
        Ok(change)
    }

    // ==================== Completion ====================

    /// Count the ballots and settle the election.
    ///
    /// A shared top count ends in `RunoffRequired`, a leader below the
    /// majority threshold in `NoWinner`, anything else in `Completed`.
    pub async fn complete_election(
        &self,
        actor: &UserId,
        total_eligible: usize,
    ) -> Result<ElectionOutcome, ElectionError> {
        self.authorize(actor, Action::ManageElection).await?;
        let election_id = self.election_id.clone();
        let (outcome, completed_at, winner_user) = self
            .commit("complete_election", |election, now| {
                let outcome = election.complete(total_eligible, now)?;
                let winner_user = election.winning_candidate().map(|c| c.user_id.clone());
                let writes = vec![EntityWrite::ElectionResult {
                    election_id,
                    status: election.status,
                    winner: election.winner.clone(),
                    completed_at: election.completed_at,
                }];
                Ok(((outcome, now, winner_user), writes))
            })
            .await?;

        info!(
            "Election {}: {} ({} votes cast)",
            self.election_id,
            outcome.status.as_str(),
            outcome.total_votes
        );

        if outcome.status == ElectionStatus::Completed {
            record_best_effort(
                self.audit.as_ref(),
                TimelineEvent::new(
                    "election_completed",
                    completed_at,
                    json!({
                        "election_id": self.election_id,
                        "winner": outcome.winner,
                        "winner_user": winner_user,
                        "tallies": outcome.tallies,
                        "total_votes": outcome.total_votes,
                    }),
                ),
            );
        }

        Ok(outcome)
    }

    // ==================== Helpers ====================

    async fn authorize(&self, actor: &UserId, action: Action) -> Result<(), ElectionError> {
        let resource = Resource::Election(self.election_id.clone());
        if is_permitted(self.permissions.as_ref(), actor, action, &resource).await {
            Ok(())
        } else {
            Err(ElectionError::PermissionDenied {
                actor: actor.clone(),
                action,
                election: self.election_id.clone(),
            })
        }
    }

    async fn commit<T, F>(&self, operation: &'static str, mutate: F) -> Result<T, ElectionError>
    where
        F: FnOnce(&mut Election, DateTime<Utc>) -> Result<(T, Vec<EntityWrite>), DomainError>,
    {
        let mut election = self.election.lock().await;
        let mut next = election.clone();
        let (value, writes) = mutate(&mut next, self.clock.now())?;

        let mut batch = WriteBatch::new();
        batch.extend(writes);
        self.store.apply(batch).await?;

        debug!("Election {} {}: committed", self.election_id, operation);
        *election = next;
        Ok(value)
    }
}
