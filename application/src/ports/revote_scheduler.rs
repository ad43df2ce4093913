//! Revote scheduling port
//!
//! When a position is filled for a fixed term, a follow-up election is
//! scheduled for the moment the term ends.

use async_trait::async_trait;
use ballot_domain::{GroupId, PositionId, TermLength};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevoteRequest {
    pub position_id: PositionId,
    pub group_id: GroupId,
    pub term: TermLength,
    pub term_start: DateTime<Utc>,
}

impl RevoteRequest {
    /// When the revote is due: term start plus term length.
    ///
    /// A term that runs past the calendar is due at [`DateTime::<Utc>::MAX_UTC`].
    pub fn due_at(&self) -> DateTime<Utc> {
        self.term
            .ends_at(self.term_start)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Scheduler rejected revote for {position}: {reason}")]
    Rejected { position: String, reason: String },
}

#[async_trait]
pub trait RevoteScheduler: Send + Sync {
    async fn schedule(&self, request: RevoteRequest) -> Result<(), SchedulingError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_due_at() {
        let start = Utc::now();
        let request = RevoteRequest {
            position_id: PositionId::new("p1"),
            group_id: GroupId::new("g1"),
            term: TermLength::days(730),
            term_start: start,
        };
        assert_eq!(request.due_at(), start + TimeDelta::days(730));
    }

    #[test]
    fn test_due_at_saturates_for_oversized_term() {
        let request = RevoteRequest {
            position_id: PositionId::new("p1"),
            group_id: GroupId::new("g1"),
            term: TermLength::days(u32::MAX),
            term_start: Utc::now(),
        };
        assert_eq!(request.due_at(), DateTime::<Utc>::MAX_UTC);
    }
}
