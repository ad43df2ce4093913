//! Position assignment scheduler
//!
//! Places election winners (or appointees) into positions and keeps the
//! holder history consistent.
//!
//! # Assignment
//!
//! ```text
//! completed election ─► vacant position? ─► assignment + holder + history
//!                                              (one batch)
//!                                                   │
//!                   notify winner, schedule revote ◄┘  (best-effort)
//! ```
//!
//! A holder is removed with [`PositionScheduler::remove_holder`], which
//! closes the open history entry before the position can be filled again.

use crate::ports::audit::{AuditLog, NoAuditLog, TimelineEvent};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::notification::{
    NoNotifications, Notification, NotificationDispatcher, NotificationKind,
};
use crate::ports::permission::{Action, PermissionChecker, Resource};
use crate::ports::persistence::{EntityWrite, PersistenceError, TransactionApplier, WriteBatch};
use crate::ports::revote_scheduler::{RevoteRequest, RevoteScheduler};
use crate::use_cases::shared::{
    is_permitted, notify_best_effort, record_best_effort, schedule_best_effort,
};
use ballot_domain::{
    AssignmentSource, DomainError, Election, ElectionId, ElectionStatus, GroupId, HolderHistoryEntry,
    Position, PositionAssignment, PositionId, TermLength, UserId, VacancyReason,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Error, Debug)]
pub enum PositionError {
    #[error("Permission denied: {actor} may not assign position {position}")]
    PermissionDenied { actor: UserId, position: PositionId },

    #[error("Unknown position: {0}")]
    UnknownPosition(String),

    #[error("Election {0} has no winner to assign")]
    NoWinner(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Who is being placed, and on what grounds
struct Placement {
    user_id: UserId,
    source: AssignmentSource,
    election: Option<ElectionId>,
}

pub struct PositionScheduler {
    positions: Mutex<BTreeMap<PositionId, Position>>,
    permissions: Arc<dyn PermissionChecker>,
    store: Arc<dyn TransactionApplier>,
    notifier: Arc<dyn NotificationDispatcher>,
    revotes: Option<Arc<dyn RevoteScheduler>>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
}

impl PositionScheduler {
    pub fn new(
        permissions: Arc<dyn PermissionChecker>,
        store: Arc<dyn TransactionApplier>,
    ) -> Self {
        Self {
            positions: Mutex::new(BTreeMap::new()),
            permissions,
            store,
            notifier: Arc::new(NoNotifications),
            revotes: None,
            audit: Arc::new(NoAuditLog),
            clock: Arc::new(SystemClock),
        }
    }

    /// Register an existing position
    pub fn with_position(mut self, position: Position) -> Self {
        self.positions
            .get_mut()
            .insert(position.id.clone(), position);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_revote_scheduler(mut self, scheduler: Arc<dyn RevoteScheduler>) -> Self {
        self.revotes = Some(scheduler);
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

    pub async fn position(&self, id: &PositionId) -> Option<Position> {
        self.positions.lock().await.get(id).cloned()
    }

    pub async fn positions(&self) -> Vec<Position> {
        self.positions.lock().await.values().cloned().collect()
    }

    // ==================== Operations ====================

    /// Place the winner of a completed election into its position.
    ///
    /// The position is the election's own position when it has one,
    /// otherwise the position titled `position_title` in the election's
    /// group, created on first use.
    pub async fn assign_position_to_winner(
        &self,
        actor: &UserId,
        election: &Election,
        position_title: &str,
        term: Option<TermLength>,
    ) -> Result<PositionAssignment, PositionError> {
        if election.status != ElectionStatus::Completed {
            return Err(DomainError::ElectionNotCompleted.into());
        }
        let winner = election
            .winning_candidate()
            .ok_or_else(|| PositionError::NoWinner(election.id.to_string()))?;

        let position_id = election
            .position_id
            .clone()
            .unwrap_or_else(|| derived_position_id(&election.group_id, position_title));
        self.authorize(actor, &position_id).await?;

        let placement = Placement {
            user_id: winner.user_id.clone(),
            source: AssignmentSource::Election,
            election: Some(election.id.clone()),
        };
        self.place(
            &position_id,
            position_title,
            &election.group_id,
            placement,
            term,
        )
        .await
    }

    /// Appoint `user_id` to a registered position without an election.
    pub async fn appoint(
        &self,
        actor: &UserId,
        position_id: &PositionId,
        user_id: &UserId,
        term: Option<TermLength>,
    ) -> Result<PositionAssignment, PositionError> {
        self.authorize(actor, position_id).await?;
        let (title, group_id) = {
            let positions = self.positions.lock().await;
            let position = positions
                .get(position_id)
                .ok_or_else(|| PositionError::UnknownPosition(position_id.to_string()))?;
            (position.title.clone(), position.group_id.clone())
        };

        let placement = Placement {
            user_id: user_id.clone(),
            source: AssignmentSource::Appointment,
            election: None,
        };
        self.place(position_id, &title, &group_id, placement, term)
            .await
    }

    /// Vacate a position, closing the holder's open history entry.
    pub async fn remove_holder(
        &self,
        actor: &UserId,
        position_id: &PositionId,
        reason: VacancyReason,
    ) -> Result<HolderHistoryEntry, PositionError> {
        self.authorize(actor, position_id).await?;
        let mut positions = self.positions.lock().await;
        let mut position = positions
            .get(position_id)
            .cloned()
            .ok_or_else(|| PositionError::UnknownPosition(position_id.to_string()))?;

        let now = self.clock.now();
        let closed = position.remove_holder(reason, now)?;
        let batch = WriteBatch::new()
            .with(EntityWrite::PositionHolder {
                position_id: position_id.clone(),
                holder: None,
                term: position.term,
            })
            .with(EntityWrite::HolderHistory {
                position_id: position_id.clone(),
                entry: closed.clone(),
            });
        self.store.apply(batch).await?;
        positions.insert(position_id.clone(), position);
        drop(positions);

        info!(
            "Position {}: {} left ({})",
            position_id,
            closed.user_id,
            closed.reason.as_str()
        );
        record_best_effort(
            self.audit.as_ref(),
            TimelineEvent::new(
                "holder_removed",
                now,
                json!({
                    "position_id": position_id,
                    "user_id": closed.user_id,
                    "reason": closed.reason,
                    "actor": actor,
                }),
            ),
        );
        Ok(closed)
    }

    // ==================== Helpers ====================

    async fn authorize(&self, actor: &UserId, position_id: &PositionId) -> Result<(), PositionError> {
        let resource = Resource::Position(position_id.clone());
        if is_permitted(
            self.permissions.as_ref(),
            actor,
            Action::AssignPosition,
            &resource,
        )
        .await
        {
            Ok(())
        } else {
            Err(PositionError::PermissionDenied {
                actor: actor.clone(),
                position: position_id.clone(),
            })
        }
    }

    async fn place(
        &self,
        position_id: &PositionId,
        title: &str,
        group_id: &GroupId,
        placement: Placement,
        term: Option<TermLength>,
    ) -> Result<PositionAssignment, PositionError> {
        let mut positions = self.positions.lock().await;
        let mut position = positions
            .get(position_id)
            .cloned()
            .unwrap_or_else(|| Position::new(position_id.clone(), title, group_id.clone()));

        let now = self.clock.now();
        let assignment_id = format!("{}#{}", position_id, position.history().len() + 1);
        let assignment = position.assign(
            assignment_id,
            placement.user_id,
            placement.source,
            placement.election,
            term,
            now,
        )?;
        let opened = position
            .open_entry()
            .cloned()
            .ok_or_else(|| DomainError::PositionVacant(position_id.to_string()))?;

        let batch = WriteBatch::new()
            .with(EntityWrite::PositionAssignment {
                assignment: assignment.clone(),
            })
            .with(EntityWrite::PositionHolder {
                position_id: position_id.clone(),
                holder: position.current_holder.clone(),
                term,
            })
            .with(EntityWrite::HolderHistory {
                position_id: position_id.clone(),
                entry: opened,
            });
        self.store.apply(batch).await?;
        let group_id = position.group_id.clone();
        let title = position.title.clone();
        positions.insert(position_id.clone(), position);
        drop(positions);

        info!(
            "Position {}: {} assigned via {:?}",
            position_id, assignment.user_id, assignment.assigned_via
        );

        record_best_effort(
            self.audit.as_ref(),
            TimelineEvent::new(
                "position_assigned",
                now,
                json!({
                    "position_id": position_id,
                    "assignment": assignment,
                }),
            ),
        );
        notify_best_effort(
            self.notifier.as_ref(),
            Notification::new(
                assignment.user_id.clone(),
                NotificationKind::PositionAssigned,
                format!("You now hold the position \"{}\"", title),
            ),
        )
        .await;

        if let (Some(term), Some(scheduler)) = (term, &self.revotes) {
            schedule_best_effort(
                scheduler.as_ref(),
                RevoteRequest {
                    position_id: position_id.clone(),
                    group_id,
                    term,
                    term_start: assignment.assigned_at,
                },
            )
            .await;
        }

        Ok(assignment)
    }
}

fn derived_position_id(group_id: &GroupId, title: &str) -> PositionId {
    let slug: String = title
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    PositionId::new(format!("{}:{}", group_id, slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::FixedClock;
    use crate::ports::permission::{AllowAll, DenyAll};
    use crate::use_cases::test_support::{
        RecordingAudit, RecordingNotifier, RecordingScheduler, RecordingStore,
    };
    use ballot_domain::{CandidateId, HolderChangeReason, MajorityType};
    use chrono::{TimeDelta, Utc};

    fn completed_election(winner: &str) -> Election {
        let mut election = Election::new("e1", "Chair election", "g1", MajorityType::Simple);
        election.nominate("c1", winner).unwrap();
        election
            .respond_to_nomination(&CandidateId::new("c1"), &UserId::new(winner), true)
            .unwrap();
        election
            .cast_vote(UserId::new("v1"), &CandidateId::new("c1"), Utc::now())
            .unwrap();
        election.complete(10, Utc::now()).unwrap();
        election
    }

    struct Fixture {
        scheduler: PositionScheduler,
        store: Arc<RecordingStore>,
        notifier: Arc<RecordingNotifier>,
        revotes: Arc<RecordingScheduler>,
        audit: Arc<RecordingAudit>,
        clock: Arc<FixedClock>,
    }

    fn fixture_with(notifier: RecordingNotifier, revotes: RecordingScheduler) -> Fixture {
        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(notifier);
        let revotes = Arc::new(revotes);
        let audit = Arc::new(RecordingAudit::default());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let scheduler = PositionScheduler::new(Arc::new(AllowAll), store.clone())
            .with_notifier(notifier.clone())
            .with_revote_scheduler(revotes.clone())
            .with_audit(audit.clone())
            .with_clock(clock.clone());
        Fixture {
            scheduler,
            store,
            notifier,
            revotes,
            audit,
            clock,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingNotifier::default(), RecordingScheduler::default())
    }

    fn officer() -> UserId {
        UserId::new("officer")
    }

    #[tokio::test]
    async fn test_assign_winner_writes_three_records_atomically() {
        let f = fixture();
        let assignment = f
            .scheduler
            .assign_position_to_winner(
                &officer(),
                &completed_election("alice"),
                "Chair",
                Some(TermLength::days(365)),
            )
            .await
            .unwrap();

        assert_eq!(assignment.user_id, UserId::new("alice"));
        assert_eq!(assignment.assigned_via, AssignmentSource::Election);
        assert_eq!(assignment.position_id, PositionId::new("g1:chair"));

        let batches = f.store.committed();
        assert_eq!(batches.len(), 1);
        let kinds: Vec<_> = batches[0].writes().iter().map(|w| w.kind()).collect();
        assert_eq!(
            kinds,
            vec!["position_assignment", "position_holder", "holder_history"]
        );

        let position = f.scheduler.position(&assignment.position_id).await.unwrap();
        assert_eq!(position.current_holder, Some(UserId::new("alice")));
        assert_eq!(
            position.open_entry().unwrap().reason,
            HolderChangeReason::Elected
        );

        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::PositionAssigned);

        let requests = f.revotes.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].term_start, f.clock.now());
        assert_eq!(requests[0].due_at(), f.clock.now() + TimeDelta::days(365));
        assert_eq!(f.audit.event_types(), vec!["position_assigned"]);
    }

    #[tokio::test]
    async fn test_occupied_position_rejected_until_holder_removed() {
        let f = fixture();
        let election = completed_election("alice").with_position("chair");
        let scheduler = f
            .scheduler
            .with_position(Position::new("chair", "Chair", "g1"));
        scheduler
            .assign_position_to_winner(&officer(), &election, "Chair", None)
            .await
            .unwrap();

        let err = scheduler
            .appoint(&officer(), &PositionId::new("chair"), &UserId::new("bob"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PositionError::Domain(DomainError::PositionOccupied(_))
        ));

        let closed = scheduler
            .remove_holder(&officer(), &PositionId::new("chair"), VacancyReason::Resigned)
            .await
            .unwrap();
        assert_eq!(closed.user_id, UserId::new("alice"));
        assert!(closed.end.is_some());

        let assignment = scheduler
            .appoint(&officer(), &PositionId::new("chair"), &UserId::new("bob"), None)
            .await
            .unwrap();
        assert_eq!(assignment.assigned_via, AssignmentSource::Appointment);

        let position = scheduler.position(&PositionId::new("chair")).await.unwrap();
        let reasons: Vec<_> = position.history().iter().map(|e| e.reason).collect();
        assert_eq!(
            reasons,
            vec![HolderChangeReason::Resigned, HolderChangeReason::Appointed]
        );
        // Only the latest tenure is open
        assert_eq!(position.history().iter().filter(|e| e.is_open()).count(), 1);
    }

    #[tokio::test]
    async fn test_requires_completed_election_with_winner() {
        let f = fixture();
        let pending = Election::new("e2", "Chair", "g1", MajorityType::Simple);
        let err = f
            .scheduler
            .assign_position_to_winner(&officer(), &pending, "Chair", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PositionError::Domain(DomainError::ElectionNotCompleted)
        ));

        let mut no_votes = Election::new("e3", "Chair", "g1", MajorityType::Simple);
        no_votes.complete(10, Utc::now()).unwrap();
        let err = f
            .scheduler
            .assign_position_to_winner(&officer(), &no_votes, "Chair", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PositionError::Domain(DomainError::ElectionNotCompleted)
        ));
        assert!(f.store.committed().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_term_fails_before_any_write() {
        let f = fixture();
        let err = f
            .scheduler
            .assign_position_to_winner(
                &officer(),
                &completed_election("alice"),
                "Chair",
                Some(TermLength::days(u32::MAX)),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PositionError::Domain(DomainError::InvalidTerm(u32::MAX))
        ));
        assert!(f.store.committed().is_empty());
        assert!(f.revotes.requests.lock().unwrap().is_empty());
        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_secondary_failures_keep_assignment() {
        let f = fixture_with(
            RecordingNotifier::failing(),
            RecordingScheduler {
                fail: true,
                ..Default::default()
            },
        );
        let assignment = f
            .scheduler
            .assign_position_to_winner(
                &officer(),
                &completed_election("alice"),
                "Chair",
                Some(TermLength::days(30)),
            )
            .await
            .unwrap();

        let position = f.scheduler.position(&assignment.position_id).await.unwrap();
        assert_eq!(position.current_holder, Some(UserId::new("alice")));
        assert_eq!(f.store.committed().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_position_vacant() {
        let f = fixture();
        f.store
            .fail_next(PersistenceError::Backend("disk full".to_string()));
        let err = f
            .scheduler
            .assign_position_to_winner(&officer(), &completed_election("alice"), "Chair", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PositionError::Persistence(_)));
        assert!(f.scheduler.positions().await.is_empty());
        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let scheduler = PositionScheduler::new(Arc::new(DenyAll), Arc::new(RecordingStore::default()));
        let err = scheduler
            .assign_position_to_winner(&officer(), &completed_election("alice"), "Chair", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PositionError::PermissionDenied { .. }));
    }
}
