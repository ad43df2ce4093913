//! In-memory revote scheduler
//!
//! Keeps one pending revote per position. A host process polls
//! [`MemoryRevoteScheduler::take_due`] to find elections that should be
//! opened.

use async_trait::async_trait;
use ballot_application::{RevoteRequest, RevoteScheduler, SchedulingError};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Default)]
pub struct MemoryRevoteScheduler {
    pending: Mutex<Vec<RevoteRequest>>,
}

impl MemoryRevoteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending requests ordered by due time
    pub async fn pending(&self) -> Vec<RevoteRequest> {
        let mut pending = self.pending.lock().await.clone();
        pending.sort_by_key(|r| r.due_at());
        pending
    }

    /// Remove and return every request due at or before `now`.
    pub async fn take_due(&self, now: DateTime<Utc>) -> Vec<RevoteRequest> {
        let mut pending = self.pending.lock().await;
        let (mut due, rest): (Vec<_>, Vec<_>) =
            pending.drain(..).partition(|r| r.due_at() <= now);
        *pending = rest;
        due.sort_by_key(|r| r.due_at());
        due
    }
}

#[async_trait]
impl RevoteScheduler for MemoryRevoteScheduler {
    async fn schedule(&self, request: RevoteRequest) -> Result<(), SchedulingError> {
        let mut pending = self.pending.lock().await;
        if pending.iter().any(|r| r.position_id == request.position_id) {
            return Err(SchedulingError::Rejected {
                position: request.position_id.to_string(),
                reason: "a revote is already pending".to_string(),
            });
        }

        info!(
            "Revote for {} scheduled at {}",
            request.position_id,
            request.due_at().to_rfc3339()
        );
        pending.push(request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_domain::{GroupId, PositionId, TermLength};
    use chrono::TimeDelta;

    fn request(position: &str, days: u32, start: DateTime<Utc>) -> RevoteRequest {
        RevoteRequest {
            position_id: PositionId::new(position),
            group_id: GroupId::new("g1"),
            term: TermLength::days(days),
            term_start: start,
        }
    }

    #[tokio::test]
    async fn test_one_pending_revote_per_position() {
        let scheduler = MemoryRevoteScheduler::new();
        let now = Utc::now();
        scheduler.schedule(request("chair", 365, now)).await.unwrap();

        let err = scheduler
            .schedule(request("chair", 30, now))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::Rejected { position, .. } if position == "chair"));
        assert_eq!(scheduler.pending().await.len(), 1);
    }

    #[tokio::test]
    async fn test_take_due_drains_only_expired_terms() {
        let scheduler = MemoryRevoteScheduler::new();
        let start = Utc::now();
        scheduler.schedule(request("chair", 365, start)).await.unwrap();
        scheduler.schedule(request("treasurer", 30, start)).await.unwrap();

        let due = scheduler.take_due(start + TimeDelta::days(31)).await;
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].position_id, PositionId::new("treasurer"));

        let remaining = scheduler.pending().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].position_id, PositionId::new("chair"));
    }
}
