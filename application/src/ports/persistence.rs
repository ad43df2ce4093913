//! Transactional persistence port
//!
//! Use cases describe every primary mutation as a [`WriteBatch`] of
//! [`EntityWrite`]s and hand it to a [`TransactionApplier`], which commits
//! all writes or none.
//!
//! # Constraints
//!
//! Adapters must enforce, as hard constraints of the batch:
//!
//! | Write | Constraint | Error |
//! |-------|------------|-------|
//! | `SessionHeader` | stored revision equals `expected_revision` | `StaleRevision` |
//! | `SessionBallot` | one ballot per (session, item, voter) | `UniqueViolation` |
//! | `ElectionBallotCast` | one ballot per (election, voter) | `UniqueViolation` |
//! | `ConferenceFinalized` | conference not yet finalized | `AlreadyFinalized` |
//! | `PositionHolder` with a holder | position currently vacant | `UniqueViolation` |

use async_trait::async_trait;
use ballot_domain::{
    Candidate, ConferenceId, DelegateAllocation, ElectionBallot, ElectionId, ElectionStatus,
    HolderHistoryEntry, ItemDecision, ItemId, ItemStatus, NominationId, NominationStatus,
    PositionAssignment, PositionId, SessionBallot, SessionId, SessionSnapshot, TermLength, UserId,
    CandidateId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entity write inside a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityWrite {
    // ==================== Delegates ====================
    NominationStatus {
        nomination_id: NominationId,
        status: NominationStatus,
    },
    Allocation {
        conference_id: ConferenceId,
        allocation: DelegateAllocation,
    },
    ConferenceFinalized {
        conference_id: ConferenceId,
        finalized_at: DateTime<Utc>,
    },

    // ==================== Sessions ====================
    SessionHeader {
        snapshot: SessionSnapshot,
        /// Revision the writer read before mutating
        expected_revision: u64,
    },
    ItemStatus {
        session_id: SessionId,
        item_id: ItemId,
        status: ItemStatus,
    },
    ItemDecision {
        session_id: SessionId,
        decision: ItemDecision,
    },
    SessionBallot {
        session_id: SessionId,
        ballot: SessionBallot,
    },

    // ==================== Elections ====================
    Candidate {
        candidate: Candidate,
    },
    ElectionBallotCast {
        election_id: ElectionId,
        ballot: ElectionBallot,
    },
    ElectionBallotChanged {
        election_id: ElectionId,
        previous: CandidateId,
        ballot: ElectionBallot,
    },
    ElectionResult {
        election_id: ElectionId,
        status: ElectionStatus,
        winner: Option<CandidateId>,
        completed_at: Option<DateTime<Utc>>,
    },

    // ==================== Positions ====================
    PositionAssignment {
        assignment: PositionAssignment,
    },
    PositionHolder {
        position_id: PositionId,
        holder: Option<UserId>,
        term: Option<TermLength>,
    },
    HolderHistory {
        position_id: PositionId,
        entry: HolderHistoryEntry,
    },
}

impl EntityWrite {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            EntityWrite::NominationStatus { .. } => "nomination_status",
            EntityWrite::Allocation { .. } => "allocation",
            EntityWrite::ConferenceFinalized { .. } => "conference_finalized",
            EntityWrite::SessionHeader { .. } => "session_header",
            EntityWrite::ItemStatus { .. } => "item_status",
            EntityWrite::ItemDecision { .. } => "item_decision",
            EntityWrite::SessionBallot { .. } => "session_ballot",
            EntityWrite::Candidate { .. } => "candidate",
            EntityWrite::ElectionBallotCast { .. } => "election_ballot_cast",
            EntityWrite::ElectionBallotChanged { .. } => "election_ballot_changed",
            EntityWrite::ElectionResult { .. } => "election_result",
            EntityWrite::PositionAssignment { .. } => "position_assignment",
            EntityWrite::PositionHolder { .. } => "position_holder",
            EntityWrite::HolderHistory { .. } => "holder_history",
        }
    }
}

/// Ordered set of writes committed atomically
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteBatch {
    writes: Vec<EntityWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: EntityWrite) {
        self.writes.push(write);
    }

    pub fn with(mut self, write: EntityWrite) -> Self {
        self.push(write);
        self
    }

    pub fn writes(&self) -> &[EntityWrite] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl Extend<EntityWrite> for WriteBatch {
    fn extend<T: IntoIterator<Item = EntityWrite>>(&mut self, iter: T) {
        self.writes.extend(iter);
    }
}

impl IntoIterator for WriteBatch {
    type Item = EntityWrite;
    type IntoIter = std::vec::IntoIter<EntityWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

/// Failure to commit a batch. Nothing from the batch is visible afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Unique constraint violated on {entity}: {key}")]
    UniqueViolation { entity: &'static str, key: String },

    #[error("Stale session revision for {session}: expected {expected}, found {actual}")]
    StaleRevision {
        session: String,
        expected: u64,
        actual: u64,
    },

    #[error("Conference already finalized: {0}")]
    AlreadyFinalized(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl PersistenceError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, PersistenceError::UniqueViolation { .. })
    }
}

#[async_trait]
pub trait TransactionApplier: Send + Sync {
    /// Commit every write in `batch`, or none of them.
    async fn apply(&self, batch: WriteBatch) -> Result<(), PersistenceError>;
}
