//! Finalize delegates use case
//!
//! Apportions a conference's seats across the child groups of its parent
//! group and fills them from each group's nominations.
//!
//! # Flow
//!
//! ```text
//! permission check ─► load conference ─► child groups ─► apportion
//!                                                           │
//!        audit event ◄─ commit batch ◄─ finalize_selection ◄┘
//! ```
//!
//! The allocation rows, every nomination status, and the finalized marker
//! are one [`WriteBatch`]. The store rejects a second finalize of the same
//! conference, so two racing finalizers cannot both succeed.

use crate::ports::audit::{AuditLog, NoAuditLog, TimelineEvent};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::directory::{DirectoryError, GroupDirectory};
use crate::ports::permission::{Action, PermissionChecker, Resource};
use crate::ports::persistence::{EntityWrite, PersistenceError, TransactionApplier, WriteBatch};
use crate::use_cases::shared::{is_permitted, record_best_effort};
use ballot_domain::{
    Apportionment, ConferenceId, DomainError, GroupMembership, NominationStatus,
    SelectionDecision, UserId, apportion, finalize_selection,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum FinalizeError {
    #[error("Permission denied: {actor} may not finalize delegates")]
    PermissionDenied { actor: UserId },

    #[error("Unknown conference: {0}")]
    UnknownConference(String),

    #[error("Conference already finalized: {0}")]
    AlreadyFinalized(String),

    #[error("Group {0} has no subgroups to apportion delegates to")]
    NoSubgroups(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Persistence error: {0}")]
    Persistence(PersistenceError),
}

impl From<PersistenceError> for FinalizeError {
    fn from(error: PersistenceError) -> Self {
        match error {
            PersistenceError::AlreadyFinalized(id) => FinalizeError::AlreadyFinalized(id),
            other => FinalizeError::Persistence(other),
        }
    }
}

/// Result of a successful finalization
#[derive(Debug, Clone)]
pub struct FinalizeDelegatesOutput {
    pub conference_id: ConferenceId,
    pub apportionment: Apportionment,
    pub decisions: Vec<SelectionDecision>,
    pub finalized_at: DateTime<Utc>,
}

impl FinalizeDelegatesOutput {
    pub fn confirmed(&self) -> impl Iterator<Item = &SelectionDecision> {
        self.decisions
            .iter()
            .filter(|d| d.status == NominationStatus::Confirmed)
    }
}

pub struct FinalizeDelegatesUseCase {
    directory: Arc<dyn GroupDirectory>,
    permissions: Arc<dyn PermissionChecker>,
    store: Arc<dyn TransactionApplier>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
}

impl FinalizeDelegatesUseCase {
    pub fn new(
        directory: Arc<dyn GroupDirectory>,
        permissions: Arc<dyn PermissionChecker>,
        store: Arc<dyn TransactionApplier>,
    ) -> Self {
        Self {
            directory,
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

    /// Finalize the delegates of `conference_id` on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// - [`FinalizeError::PermissionDenied`] - checked before anything is read
    /// - [`FinalizeError::UnknownConference`] / [`FinalizeError::AlreadyFinalized`]
    /// - [`FinalizeError::NoSubgroups`] - the parent group has no children
    /// - [`FinalizeError::Domain`] - invalid seat count or no members at all
    pub async fn execute(
        &self,
        actor: &UserId,
        conference_id: &ConferenceId,
    ) -> Result<FinalizeDelegatesOutput, FinalizeError> {
        let resource = Resource::Conference(conference_id.clone());
        if !is_permitted(
            self.permissions.as_ref(),
            actor,
            Action::FinalizeDelegates,
            &resource,
        )
        .await
        {
            return Err(FinalizeError::PermissionDenied {
                actor: actor.clone(),
            });
        }

        let conference = self
            .directory
            .conference(conference_id)
            .await?
            .ok_or_else(|| FinalizeError::UnknownConference(conference_id.to_string()))?;
        if conference.is_finalized() {
            return Err(FinalizeError::AlreadyFinalized(conference_id.to_string()));
        }

        let (groups, nominations) = futures::future::try_join(
            self.directory.child_groups(&conference.parent_group),
            self.directory.nominations(conference_id),
        )
        .await?;
        if groups.is_empty() {
            return Err(FinalizeError::NoSubgroups(
                conference.parent_group.to_string(),
            ));
        }

        let memberships: Vec<GroupMembership> = groups.iter().map(|g| g.membership()).collect();
        let apportionment = apportion(&memberships, conference.total_delegates)?;
        let allocations = apportionment.allocations();

        let decisions = finalize_selection(&nominations, &allocations);

        let finalized_at = self.clock.now();
        let mut batch = WriteBatch::new();
        batch.extend(allocations.iter().map(|allocation| EntityWrite::Allocation {
            conference_id: conference_id.clone(),
            allocation: allocation.clone(),
        }));
        batch.extend(decisions.iter().map(|d| EntityWrite::NominationStatus {
            nomination_id: d.nomination_id.clone(),
            status: d.status,
        }));
        batch.push(EntityWrite::ConferenceFinalized {
            conference_id: conference_id.clone(),
            finalized_at,
        });
        self.store.apply(batch).await?;

        let output = FinalizeDelegatesOutput {
            conference_id: conference_id.clone(),
            apportionment,
            decisions,
            finalized_at,
        };
        let confirmed = output.confirmed().count();
        info!(
            "Finalized conference {}: {} seats over {} groups, {} delegates confirmed",
            conference_id,
            conference.total_delegates,
            allocations.len(),
            confirmed
        );

        record_best_effort(
            self.audit.as_ref(),
            TimelineEvent::new(
                "delegates_finalized",
                finalized_at,
                json!({
                    "conference_id": conference_id,
                    "actor": actor,
                    "total_delegates": conference.total_delegates,
                    "allocations": allocations,
                    "confirmed": confirmed,
                }),
            ),
        );

        Ok(output)
    }
}
