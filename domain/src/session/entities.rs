//! Voting session state machine

use super::item::{ChangeRequest, ItemStatus, order_queue};
use crate::core::error::DomainError;
use crate::core::ids::{ItemId, SessionId, UserId};
use crate::tally::{TallyOutcome, TallyRule, VoteChoice, VoteCount, count_votes};
use crate::timer::SyncedCountdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Phase of a voting session
///
/// Within one item the phase only moves forward; together with the queue
/// cursor it forms the monotonic [`SessionProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Queue built, nothing started yet
    Setup,
    /// Current item is being presented
    Introduction,
    /// Ballots are accepted for the current item
    Voting,
    /// Queue exhausted
    Closed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Setup => "setup",
            SessionPhase::Introduction => "introduction",
            SessionPhase::Voting => "voting",
            SessionPhase::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a session in its run: queue cursor, then phase.
///
/// Ordered lexicographically; every successful transition strictly increases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionProgress {
    /// Queue index of the current item, `None` before the first item
    pub cursor: Option<usize>,
    pub phase: SessionPhase,
}

/// A ballot cast on one item of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBallot {
    pub item_id: ItemId,
    pub voter: UserId,
    pub choice: VoteChoice,
    pub cast_at: DateTime<Utc>,
}

/// Recorded outcome for an item that left the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDecision {
    pub item_id: ItemId,
    pub status: ItemStatus,
    /// `None` for skipped items
    pub outcome: Option<TallyOutcome>,
    pub decided_at: DateTime<Utc>,
}

/// Persisted header of a session, written with every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub phase: SessionPhase,
    pub current_item: Option<ItemId>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub revision: u64,
}

/// A live voting session over an ordered queue of change requests.
///
/// The queue order is fixed at construction. Ballots are keyed by
/// `(item, voter)`, so moving to the next item starts from an empty tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingSession {
    id: SessionId,
    phase: SessionPhase,
    queue: Vec<ChangeRequest>,
    cursor: Option<usize>,
    ballots: Vec<SessionBallot>,
    decisions: Vec<ItemDecision>,
    voting_duration: Duration,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    revision: u64,
}

impl VotingSession {
    pub fn new(
        id: impl Into<SessionId>,
        items: Vec<ChangeRequest>,
        voting_duration: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            phase: SessionPhase::Setup,
            queue: order_queue(items),
            cursor: None,
            ballots: Vec::new(),
            decisions: Vec::new(),
            voting_duration,
            started_at: None,
            ended_at: None,
            revision: 0,
        }
    }

    // ==================== Queries ====================

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            cursor: self.cursor,
            phase: self.phase,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn queue(&self) -> &[ChangeRequest] {
        &self.queue
    }

    pub fn decisions(&self) -> &[ItemDecision] {
        &self.decisions
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn voting_duration(&self) -> Duration {
        self.voting_duration
    }

    /// The item currently introduced or voted on
    pub fn current_item(&self) -> Option<&ChangeRequest> {
        match self.phase {
            SessionPhase::Introduction | SessionPhase::Voting => {
                self.cursor.and_then(|idx| self.queue.get(idx))
            }
            SessionPhase::Setup | SessionPhase::Closed => None,
        }
    }

    pub fn item(&self, item_id: &ItemId) -> Option<&ChangeRequest> {
        self.queue.iter().find(|i| &i.id == item_id)
    }

    pub fn ballots_for<'a>(&'a self, item_id: &'a ItemId) -> impl Iterator<Item = &'a SessionBallot> {
        self.ballots.iter().filter(move |b| &b.item_id == item_id)
    }

    pub fn has_voted(&self, item_id: &ItemId, voter: &UserId) -> bool {
        self.ballots_for(item_id).any(|b| &b.voter == voter)
    }

    /// Live count for the current item, recomputed from the ballots
    pub fn live_count(&self) -> VoteCount {
        match self.current_item() {
            Some(item) => count_votes(self.ballots_for(&item.id).map(|b| &b.choice)),
            None => VoteCount::default(),
        }
    }

    /// Countdown for the current voting round, anchored at `started_at`
    pub fn countdown(&self, now: DateTime<Utc>) -> Option<SyncedCountdown> {
        if self.phase != SessionPhase::Voting {
            return None;
        }
        self.started_at
            .map(|started_at| SyncedCountdown::anchored(started_at, self.voting_duration, now))
    }

    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.countdown(now).map(|c| c.remaining())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            phase: self.phase,
            current_item: self.current_item().map(|i| i.id.clone()),
            started_at: self.started_at,
            ended_at: self.ended_at,
            revision: self.revision,
        }
    }

    // ==================== Transitions ====================

    /// Introduce the first item. Only valid before anything has started,
    /// and only for the head of the queue.
    pub fn start_item(&mut self, item_id: &ItemId) -> Result<&ChangeRequest, DomainError> {
        self.require_phase("start_item", &[SessionPhase::Setup])?;
        let idx = self
            .queue
            .iter()
            .position(|i| &i.id == item_id)
            .ok_or_else(|| DomainError::UnknownItem(item_id.to_string()))?;
        if !self.queue[idx].is_pending() {
            return Err(DomainError::ItemNotPending(item_id.to_string()));
        }
        // earlier pending items would never be reached by move_to_next
        if let Some(first) = self.queue[..idx].iter().find(|i| i.is_pending()) {
            return Err(DomainError::OutOfOrder {
                requested: item_id.to_string(),
                expected: first.id.to_string(),
            });
        }

        self.cursor = Some(idx);
        self.phase = SessionPhase::Introduction;
        self.started_at = None;
        self.bump();
        Ok(&self.queue[idx])
    }

    /// Open the ballot for the current item and anchor the timer.
    pub fn begin_voting(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.require_phase("begin_voting", &[SessionPhase::Introduction])?;
        self.phase = SessionPhase::Voting;
        self.started_at = Some(now);
        self.bump();
        Ok(())
    }

    /// Record a ballot on the current item.
    pub fn cast_vote(
        &mut self,
        voter: UserId,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> Result<SessionBallot, DomainError> {
        self.require_phase("cast_vote", &[SessionPhase::Voting])?;
        let item = self.current_pending()?;
        let item_id = item.id.clone();
        if self.has_voted(&item_id, &voter) {
            return Err(DomainError::AlreadyVoted(voter.to_string()));
        }

        let ballot = SessionBallot {
            item_id,
            voter,
            choice,
            cast_at: now,
        };
        self.ballots.push(ballot.clone());
        self.bump();
        Ok(ballot)
    }

    /// Tally the current item and record approved or rejected.
    pub fn complete_item(
        &mut self,
        rule: &TallyRule,
        now: DateTime<Utc>,
    ) -> Result<ItemDecision, DomainError> {
        self.require_phase("complete_item", &[SessionPhase::Voting])?;
        let item_id = self.current_pending()?.id.clone();

        let outcome = TallyOutcome::evaluate(self.live_count(), rule);
        let status = if outcome.verdict.is_passed() {
            ItemStatus::Approved
        } else {
            ItemStatus::Rejected
        };
        Ok(self.resolve_current(item_id, status, Some(outcome), now))
    }

    /// Mark the current item skipped without tallying, then advance.
    pub fn skip_item(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<(ItemDecision, Option<&ChangeRequest>), DomainError> {
        self.require_phase(
            "skip_item",
            &[SessionPhase::Introduction, SessionPhase::Voting],
        )?;
        let item_id = self.current_pending()?.id.clone();
        let decision = self.resolve_current(item_id, ItemStatus::Skipped, None, now);
        let next = self.move_to_next(now)?;
        Ok((decision, next))
    }

    /// Advance to the next pending item, or close the session.
    ///
    /// Returns the newly introduced item, `None` once closed.
    pub fn move_to_next(&mut self, now: DateTime<Utc>) -> Result<Option<&ChangeRequest>, DomainError> {
        match self.phase {
            SessionPhase::Setup => return Err(DomainError::NoActiveItem),
            SessionPhase::Closed => return Err(DomainError::SessionClosed),
            SessionPhase::Introduction | SessionPhase::Voting => {}
        }
        let current = self.cursor.ok_or(DomainError::NoActiveItem)?;
        if !self.queue[current].status.is_resolved() {
            return Err(DomainError::ItemUnresolved(self.queue[current].id.to_string()));
        }

        let next = self
            .queue
            .iter()
            .enumerate()
            .skip(current + 1)
            .find(|(_, item)| item.is_pending())
            .map(|(idx, _)| idx);

        self.started_at = None;
        match next {
            Some(idx) => {
                self.cursor = Some(idx);
                self.phase = SessionPhase::Introduction;
            }
            None => {
                self.phase = SessionPhase::Closed;
                self.ended_at = Some(now);
            }
        }
        self.bump();
        Ok(next.map(|idx| &self.queue[idx]))
    }

    // ==================== Helpers ====================

    fn require_phase(
        &self,
        operation: &'static str,
        allowed: &[SessionPhase],
    ) -> Result<(), DomainError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else if self.phase == SessionPhase::Closed {
            Err(DomainError::SessionClosed)
        } else {
            Err(DomainError::InvalidPhase {
                operation,
                phase: self.phase.as_str(),
            })
        }
    }

    fn current_pending(&self) -> Result<&ChangeRequest, DomainError> {
        let item = self.current_item().ok_or(DomainError::NoActiveItem)?;
        if !item.is_pending() {
            return Err(DomainError::ItemNotPending(item.id.to_string()));
        }
        Ok(item)
    }

    fn resolve_current(
        &mut self,
        item_id: ItemId,
        status: ItemStatus,
        outcome: Option<TallyOutcome>,
        now: DateTime<Utc>,
    ) -> ItemDecision {
        if let Some(item) = self.cursor.and_then(|idx| self.queue.get_mut(idx)) {
            item.status = status;
        }
        let decision = ItemDecision {
            item_id,
            status,
            outcome,
            decided_at: now,
        };
        self.decisions.push(decision.clone());
        self.bump();
        decision
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
