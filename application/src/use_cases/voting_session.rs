//! Voting session controller
//!
//! Drives a [`VotingSession`] through its items on behalf of a meeting.
//! Manager transitions require [`Action::ManageSession`]; ballots require
//! [`Action::CastVote`].
//!
//! # Write path
//!
//! Every transition runs under the session mutex (one writer at a time):
//!
//! 1. clone the session and apply the transition to the clone
//! 2. persist the session header (with the revision read in step 1) plus
//!    the transition's entity writes as one batch
//! 3. only after the store accepted the batch, replace the in-memory session
//!
//! A rejected transition or a failed batch leaves the session untouched.
//! Audit events and author notifications follow the commit and are
//! best-effort.

use crate::ports::audit::{AuditLog, NoAuditLog, TimelineEvent};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::notification::{
    NoNotifications, Notification, NotificationDispatcher, NotificationKind,
};
use crate::ports::permission::{Action, PermissionChecker, Resource};
use crate::ports::persistence::{EntityWrite, PersistenceError, TransactionApplier, WriteBatch};
use crate::use_cases::shared::{is_permitted, notify_best_effort, record_best_effort};
use ballot_domain::{
    ChangeRequest, DomainError, ItemDecision, ItemId, SessionId, SessionPhase, SessionProgress,
    SessionSnapshot, TallyRule, UserId, VoteChoice, VoteCount, VotingSession,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Permission denied: {actor} may not {action} on session {session}")]
    PermissionDenied {
        actor: UserId,
        action: Action,
        session: SessionId,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl SessionError {
    pub fn is_already_voted(&self) -> bool {
        matches!(self, SessionError::Domain(e) if e.is_already_voted())
    }
}

pub struct VotingSessionController {
    session_id: SessionId,
    session: Mutex<VotingSession>,
    started_at: watch::Sender<Option<DateTime<Utc>>>,
    permissions: Arc<dyn PermissionChecker>,
    store: Arc<dyn TransactionApplier>,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
}

impl VotingSessionController {
    pub fn new(
        session: VotingSession,
        permissions: Arc<dyn PermissionChecker>,
        store: Arc<dyn TransactionApplier>,
    ) -> Self {
        let (started_at, _) = watch::channel(session.started_at());
        Self {
            session_id: session.id().clone(),
            session: Mutex::new(session),
            started_at,
            permissions,
            store,
            notifier: Arc::new(NoNotifications),
            audit: Arc::new(NoAuditLog),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        self.notifier = notifier;
        self
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

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub async fn phase(&self) -> SessionPhase {
        self.session.lock().await.phase()
    }

    pub async fn progress(&self) -> SessionProgress {
        self.session.lock().await.progress()
    }

    pub async fn current_item(&self) -> Option<ChangeRequest> {
        self.session.lock().await.current_item().cloned()
    }

    /// All items in queue order, with their current status
    pub async fn items(&self) -> Vec<ChangeRequest> {
        self.session.lock().await.queue().to_vec()
    }

    pub async fn decisions(&self) -> Vec<ItemDecision> {
        self.session.lock().await.decisions().to_vec()
    }

    /// Counts for the current item
    pub async fn live_count(&self) -> VoteCount {
        self.session.lock().await.live_count()
    }

    pub async fn time_remaining(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.session.lock().await.time_remaining(now)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    /// Follow the voting start time of the current item.
    ///
    /// Feed this into a synced countdown driver so every observer shows the
    /// same remaining time.
    pub fn subscribe_started_at(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.started_at.subscribe()
    }

    // ==================== Transitions ====================

    /// Introduce the first item of the queue.
    pub async fn start_item(
        &self,
        actor: &UserId,
        item_id: &ItemId,
    ) -> Result<ChangeRequest, SessionError> {
        self.authorize(actor, Action::ManageSession).await?;
        let item = self
            .commit("start_item", |session, _now| {
                Ok((session.start_item(item_id)?.clone(), Vec::new()))
            })
            .await?;
        info!("Session {}: introducing {}", self.session_id, item.id);
        Ok(item)
    }

    /// Open the ballot for the current item. Returns the anchored start time.
    pub async fn begin_voting(&self, actor: &UserId) -> Result<DateTime<Utc>, SessionError> {
        self.authorize(actor, Action::ManageSession).await?;
        let started_at = self
            .commit("begin_voting", |session, now| {
                session.begin_voting(now)?;
                Ok((now, Vec::new()))
            })
            .await?;
        info!("Session {}: voting opened", self.session_id);
        Ok(started_at)
    }

    /// Cast `voter`'s ballot on the current item and return the new count.
    pub async fn cast_vote(
        &self,
        voter: &UserId,
        choice: VoteChoice,
    ) -> Result<VoteCount, SessionError> {
        self.authorize(voter, Action::CastVote).await?;
        let session_id = self.session_id.clone();
        self.commit("cast_vote", |session, now| {
            let ballot = session.cast_vote(voter.clone(), choice, now)?;
            Ok((
                session.live_count(),
                vec![EntityWrite::SessionBallot { session_id, ballot }],
            ))
        })
        .await
        .map_err(|e| match e {
            SessionError::Persistence(p) if p.is_unique_violation() => {
                DomainError::AlreadyVoted(voter.to_string()).into()
            }
            other => other,
        })
    }

    /// Tally the current item under `rule` and record the decision.
    pub async fn complete_item(
        &self,
        actor: &UserId,
        rule: &TallyRule,
    ) -> Result<ItemDecision, SessionError> {
        self.authorize(actor, Action::ManageSession).await?;
        let session_id = self.session_id.clone();
        let (decision, item) = self
            .commit("complete_item", |session, now| {
                let decision = session.complete_item(rule, now)?;
                let item = session
                    .item(&decision.item_id)
                    .cloned()
                    .ok_or_else(|| DomainError::UnknownItem(decision.item_id.to_string()))?;
                let writes = decision_writes(&session_id, &decision);
                Ok(((decision, item), writes))
            })
            .await?;

        info!(
            "Session {}: {} {}",
            self.session_id,
            decision.item_id,
            decision.status.as_str()
        );

        record_best_effort(
            self.audit.as_ref(),
            TimelineEvent::new(
                "item_decided",
                decision.decided_at,
                json!({
                    "session_id": self.session_id,
                    "item_id": decision.item_id,
                    "status": decision.status,
                    "outcome": decision.outcome,
                    "actor": actor,
                }),
            ),
        );
        notify_best_effort(
            self.notifier.as_ref(),
            Notification::new(
                item.author.clone(),
                NotificationKind::ItemDecided,
                format!("\"{}\" was {}", item.title, decision.status.as_str()),
            ),
        )
        .await;

        Ok(decision)
    }

    /// Introduce the next pending item, or close the session.
    pub async fn move_to_next(
        &self,
        actor: &UserId,
    ) -> Result<Option<ChangeRequest>, SessionError> {
        self.authorize(actor, Action::ManageSession).await?;
        let (next, ended_at) = self
            .commit("move_to_next", |session, now| {
                let next = session.move_to_next(now)?.cloned();
                Ok(((next, session.ended_at()), Vec::new()))
            })
            .await?;
        self.after_advance(actor, next.as_ref(), ended_at);
        Ok(next)
    }

    /// Skip the current item without a tally and advance.
    pub async fn skip_item(
        &self,
        actor: &UserId,
    ) -> Result<(ItemDecision, Option<ChangeRequest>), SessionError> {
        self.authorize(actor, Action::ManageSession).await?;
        let session_id = self.session_id.clone();
        let (decision, next, ended_at) = self
            .commit("skip_item", |session, now| {
                let (decision, next) = session.skip_item(now)?;
                let next = next.cloned();
                let writes = decision_writes(&session_id, &decision);
                Ok(((decision, next, session.ended_at()), writes))
            })
            .await?;

        info!("Session {}: skipped {}", self.session_id, decision.item_id);
        record_best_effort(
            self.audit.as_ref(),
            TimelineEvent::new(
                "item_skipped",
                decision.decided_at,
                json!({
                    "session_id": self.session_id,
                    "item_id": decision.item_id,
                    "actor": actor,
                }),
            ),
        );
        self.after_advance(actor, next.as_ref(), ended_at);
        Ok((decision, next))
    }

    // ==================== Helpers ====================

    async fn authorize(&self, actor: &UserId, action: Action) -> Result<(), SessionError> {
        let resource = Resource::Session(self.session_id.clone());
        if is_permitted(self.permissions.as_ref(), actor, action, &resource).await {
            Ok(())
        } else {
            Err(SessionError::PermissionDenied {
                actor: actor.clone(),
                action,
                session: self.session_id.clone(),
            })
        }
    }

    /// Apply `mutate` to a copy, persist it, then publish it.
    ///
    /// The copy carries every ballot cast so far, so each transition is
    /// linear in the session's ballot count.
    async fn commit<T, F>(&self, operation: &'static str, mutate: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut VotingSession, DateTime<Utc>) -> Result<(T, Vec<EntityWrite>), DomainError>,
    {
        let mut session = self.session.lock().await;
        let expected_revision = session.revision();
        let mut next = session.clone();
        let (value, writes) = mutate(&mut next, self.clock.now())?;
        debug_assert!(next.progress() >= session.progress());

        let mut batch = WriteBatch::new().with(EntityWrite::SessionHeader {
            snapshot: next.snapshot(),
            expected_revision,
        });
        batch.extend(writes);
        self.store.apply(batch).await?;

        debug!(
            "Session {} {}: revision {} -> {}",
            self.session_id,
            operation,
            expected_revision,
            next.revision()
        );
        *session = next;
        self.started_at.send_replace(session.started_at());
        Ok(value)
    }

    fn after_advance(
        &self,
        actor: &UserId,
        next: Option<&ChangeRequest>,
        ended_at: Option<DateTime<Utc>>,
    ) {
        match (next, ended_at) {
            (Some(item), _) => info!("Session {}: introducing {}", self.session_id, item.id),
            (None, Some(ended_at)) => {
                info!("Session {}: closed", self.session_id);
                record_best_effort(
                    self.audit.as_ref(),
                    TimelineEvent::new(
                        "session_closed",
                        ended_at,
                        json!({ "session_id": self.session_id, "actor": actor }),
                    ),
                );
            }
            (None, None) => {}
        }
    }
}

fn decision_writes(session_id: &SessionId, decision: &ItemDecision) -> Vec<EntityWrite> {
    vec![
        EntityWrite::ItemStatus {
            session_id: session_id.clone(),
            item_id: decision.item_id.clone(),
            status: decision.status,
        },
        EntityWrite::ItemDecision {
            session_id: session_id.clone(),
            decision: decision.clone(),
        },
    ]
}
