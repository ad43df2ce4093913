//! In-memory port fakes shared by the use case tests.

use crate::ports::audit::{AuditError, AuditLog, TimelineEvent};
use crate::ports::directory::{DirectoryError, GroupDirectory};
use crate::ports::notification::{Notification, NotificationDispatcher, NotificationError};
use crate::ports::permission::{Action, PermissionChecker, Resource};
use crate::ports::persistence::{PersistenceError, TransactionApplier, WriteBatch};
use crate::ports::revote_scheduler::{RevoteRequest, RevoteScheduler, SchedulingError};
use async_trait::async_trait;
use ballot_domain::{
    ConferenceId, DelegateConference, DelegateNomination, Group, GroupId, UserId,
};
use std::collections::HashSet;
use std::sync::Mutex;

/// Records committed batches; can be told to fail the next apply.
#[derive(Default)]
pub struct RecordingStore {
    pub batches: Mutex<Vec<WriteBatch>>,
    fail_next: Mutex<Option<PersistenceError>>,
}

impl RecordingStore {
    pub fn fail_next(&self, error: PersistenceError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    pub fn committed(&self) -> Vec<WriteBatch> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionApplier for RecordingStore {
    async fn apply(&self, batch: WriteBatch) -> Result<(), PersistenceError> {
        if let Some(error) = self.fail_next.lock().unwrap().take() {
            return Err(error);
        }
        self.batches.lock().unwrap().push(batch);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Delivery("mailbox full".to_string()));
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    pub events: Mutex<Vec<TimelineEvent>>,
}

impl RecordingAudit {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type)
            .collect()
    }
}

impl AuditLog for RecordingAudit {
    fn record(&self, event: TimelineEvent) -> Result<(), AuditError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingScheduler {
    pub requests: Mutex<Vec<RevoteRequest>>,
    pub fail: bool,
}

#[async_trait]
impl RevoteScheduler for RecordingScheduler {
    async fn schedule(&self, request: RevoteRequest) -> Result<(), SchedulingError> {
        if self.fail {
            return Err(SchedulingError::Rejected {
                position: request.position_id.to_string(),
                reason: "calendar closed".to_string(),
            });
        }
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// Grants only the listed (actor, action) pairs.
#[derive(Default)]
pub struct GrantList {
    grants: HashSet<(UserId, Action)>,
}

impl GrantList {
    pub fn grant(mut self, actor: &str, action: Action) -> Self {
        self.grants.insert((UserId::new(actor), action));
        self
    }
}

#[async_trait]
impl PermissionChecker for GrantList {
    async fn can(&self, actor: &UserId, action: Action, _resource: &Resource) -> bool {
        self.grants.contains(&(actor.clone(), action))
    }
}

#[derive(Default)]
pub struct StaticDirectory {
    pub conferences: Vec<DelegateConference>,
    pub groups: Vec<Group>,
    pub nominations: Vec<DelegateNomination>,
}

#[async_trait]
impl GroupDirectory for StaticDirectory {
    async fn conference(
        &self,
        id: &ConferenceId,
    ) -> Result<Option<DelegateConference>, DirectoryError> {
        Ok(self.conferences.iter().find(|c| &c.id == id).cloned())
    }

    async fn child_groups(&self, parent: &GroupId) -> Result<Vec<Group>, DirectoryError> {
        Ok(self
            .groups
            .iter()
            .filter(|g| g.is_child_of(parent))
            .cloned()
            .collect())
    }

    async fn nominations(
        &self,
        _conference: &ConferenceId,
    ) -> Result<Vec<DelegateNomination>, DirectoryError> {
        Ok(self.nominations.clone())
    }
}
