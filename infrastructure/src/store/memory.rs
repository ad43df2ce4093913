//! In-memory transactional store
//!
//! [`MemoryStore`] implements both [`TransactionApplier`] and
//! [`GroupDirectory`]. A batch is applied in place under the write lock while
//! each write journals its inverse; when any write fails its constraint check
//! the journal is replayed backwards, so a failed batch leaves nothing behind.

use async_trait::async_trait;
use ballot_application::{
    DirectoryError, EntityWrite, GroupDirectory, PersistenceError, TransactionApplier, WriteBatch,
};
use ballot_domain::{
    Candidate, CandidateId, ConferenceId, DelegateAllocation, DelegateConference,
    DelegateNomination, ElectionBallot, ElectionId, ElectionStatus, Group, GroupId,
    HolderHistoryEntry, ItemDecision, ItemId, ItemStatus, NominationId, NominationStatus,
    PositionAssignment,
    PositionId, SessionBallot, SessionId, SessionSnapshot, TermLength, UserId,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Stored outcome of a completed election.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredElectionResult {
    pub status: ElectionStatus,
    pub winner: Option<CandidateId>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Current holder row of a position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredHolder {
    pub holder: Option<UserId>,
    pub term: Option<TermLength>,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    // Directory
    conferences: HashMap<ConferenceId, DelegateConference>,
    groups: BTreeMap<GroupId, Group>,
    nominations: BTreeMap<NominationId, DelegateNomination>,
    allocations: HashMap<ConferenceId, Vec<DelegateAllocation>>,

    // Sessions
    sessions: HashMap<SessionId, SessionSnapshot>,
    item_statuses: HashMap<(SessionId, ItemId), ItemStatus>,
    decisions: HashMap<(SessionId, ItemId), ItemDecision>,
    session_ballots: BTreeMap<(SessionId, ItemId, UserId), SessionBallot>,

    // Elections
    candidates: BTreeMap<CandidateId, Candidate>,
    election_ballots: BTreeMap<(ElectionId, UserId), ElectionBallot>,
    election_results: HashMap<ElectionId, StoredElectionResult>,

    // Positions
    assignments: Vec<PositionAssignment>,
    holders: HashMap<PositionId, StoredHolder>,
    history: HashMap<PositionId, Vec<HolderHistoryEntry>>,
}

/// Reverses one applied write.
enum Undo {
    Nomination(NominationId, NominationStatus),
    Allocations(ConferenceId, Option<Vec<DelegateAllocation>>),
    Finalized(ConferenceId),
    Session(SessionId, Option<SessionSnapshot>),
    ItemStatus((SessionId, ItemId), Option<ItemStatus>),
    Decision((SessionId, ItemId), Option<ItemDecision>),
    SessionBallot((SessionId, ItemId, UserId)),
    Candidate(CandidateId, Option<Candidate>),
    ElectionBallot((ElectionId, UserId), Option<ElectionBallot>),
    ElectionResult(ElectionId, Option<StoredElectionResult>),
    Assignment,
    Holder(PositionId, Option<StoredHolder>),
    History(PositionId, Option<Vec<HolderHistoryEntry>>),
}

fn restore<K, V>(map: &mut HashMap<K, V>, key: K, previous: Option<V>)
where
    K: std::hash::Hash + Eq,
{
    match previous {
        Some(value) => map.insert(key, value),
        None => map.remove(&key),
    };
}

fn restore_ordered<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => map.insert(key, value),
        None => map.remove(&key),
    };
}

impl StoreState {
    /// Apply one write in place, pushing its inverse onto `journal`.
    ///
    /// Constraint checks run before any mutation, so a rejected write
    /// leaves nothing to undo.
    fn stage(&mut self, write: EntityWrite, journal: &mut Vec<Undo>) -> Result<(), PersistenceError> {
        match write {
            EntityWrite::NominationStatus {
                nomination_id,
                status,
            } => {
                let nomination = self.nominations.get_mut(&nomination_id).ok_or_else(|| {
                    PersistenceError::Backend(format!("unknown nomination {}", nomination_id))
                })?;
                journal.push(Undo::Nomination(nomination_id, nomination.status));
                nomination.status = status;
            }
            EntityWrite::Allocation {
                conference_id,
                allocation,
            } => {
                journal.push(Undo::Allocations(
                    conference_id.clone(),
                    self.allocations.get(&conference_id).cloned(),
                ));
                let rows = self.allocations.entry(conference_id).or_default();
                rows.retain(|a| a.group_id != allocation.group_id);
                rows.push(allocation);
            }
            EntityWrite::ConferenceFinalized {
                conference_id,
                finalized_at,
            } => {
                let conference = self.conferences.get_mut(&conference_id).ok_or_else(|| {
                    PersistenceError::Backend(format!("unknown conference {}", conference_id))
                })?;
                if conference.is_finalized() {
                    return Err(PersistenceError::AlreadyFinalized(conference_id.to_string()));
                }
                conference.finalized_at = Some(finalized_at);
                journal.push(Undo::Finalized(conference_id));
            }

            EntityWrite::SessionHeader {
                snapshot,
                expected_revision,
            } => {
                let actual = self.sessions.get(&snapshot.id).map_or(0, |s| s.revision);
                if actual != expected_revision {
                    return Err(PersistenceError::StaleRevision {
                        session: snapshot.id.to_string(),
                        expected: expected_revision,
                        actual,
                    });
                }
                let id = snapshot.id.clone();
                let previous = self.sessions.insert(id.clone(), snapshot);
                journal.push(Undo::Session(id, previous));
            }
            EntityWrite::ItemStatus {
                session_id,
                item_id,
                status,
            } => {
                let key = (session_id, item_id);
                let previous = self.item_statuses.insert(key.clone(), status);
                journal.push(Undo::ItemStatus(key, previous));
            }
            EntityWrite::ItemDecision {
                session_id,
                decision,
            } => {
                let key = (session_id, decision.item_id.clone());
                let previous = self.decisions.insert(key.clone(), decision);
                journal.push(Undo::Decision(key, previous));
            }
            EntityWrite::SessionBallot { session_id, ballot } => {
                let key = (session_id, ballot.item_id.clone(), ballot.voter.clone());
                if self.session_ballots.contains_key(&key) {
                    return Err(PersistenceError::UniqueViolation {
                        entity: "session_ballot",
                        key: format!("{}/{}/{}", key.0, key.1, key.2),
                    });
                }
                self.session_ballots.insert(key.clone(), ballot);
                journal.push(Undo::SessionBallot(key));
            }

            EntityWrite::Candidate { candidate } => {
                let id = candidate.id.clone();
                let previous = self.candidates.insert(id.clone(), candidate);
                journal.push(Undo::Candidate(id, previous));
            }
            EntityWrite::ElectionBallotCast {
                election_id,
                ballot,
            } => {
                let key = (election_id, ballot.voter.clone());
                if self.election_ballots.contains_key(&key) {
                    return Err(PersistenceError::UniqueViolation {
                        entity: "election_ballot",
                        key: format!("{}/{}", key.0, key.1),
                    });
                }
                self.election_ballots.insert(key.clone(), ballot);
                journal.push(Undo::ElectionBallot(key, None));
            }
            EntityWrite::ElectionBallotChanged {
                election_id,
                previous,
                ballot,
            } => {
                let key = (election_id, ballot.voter.clone());
                match self.election_ballots.get(&key) {
                    Some(stored) if stored.candidate_id == previous => {
                        let replaced = self.election_ballots.insert(key.clone(), ballot);
                        journal.push(Undo::ElectionBallot(key, replaced));
                    }
                    _ => {
                        return Err(PersistenceError::Backend(format!(
                            "no ballot of {} for {} in election {}",
                            key.1, previous, key.0
                        )));
                    }
                }
            }
            EntityWrite::ElectionResult {
                election_id,
                status,
                winner,
                completed_at,
            } => {
                let previous = self.election_results.insert(
                    election_id.clone(),
                    StoredElectionResult {
                        status,
                        winner,
                        completed_at,
                    },
                );
                journal.push(Undo::ElectionResult(election_id, previous));
            }

            EntityWrite::PositionAssignment { assignment } => {
                self.assignments.push(assignment);
                journal.push(Undo::Assignment);
            }
            EntityWrite::PositionHolder {
                position_id,
                holder,
                term,
            } => {
                let previous = self.holders.get(&position_id).cloned();
                if holder.is_some() && previous.as_ref().is_some_and(|row| row.holder.is_some()) {
                    return Err(PersistenceError::UniqueViolation {
                        entity: "position_holder",
                        key: position_id.to_string(),
                    });
                }
                self.holders
                    .insert(position_id.clone(), StoredHolder { holder, term });
                journal.push(Undo::Holder(position_id, previous));
            }
            EntityWrite::HolderHistory { position_id, entry } => {
                journal.push(Undo::History(
                    position_id.clone(),
                    self.history.get(&position_id).cloned(),
                ));
                let entries = self.history.entry(position_id).or_default();
                // Closing an open entry replaces it in place
                match entries
                    .iter_mut()
                    .find(|e| e.user_id == entry.user_id && e.start == entry.start)
                {
                    Some(existing) => *existing = entry,
                    None => entries.push(entry),
                }
            }
        }
        Ok(())
    }

    /// Undo journaled writes, newest first.
    fn rollback(&mut self, journal: Vec<Undo>) {
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::Nomination(id, status) => {
                    if let Some(nomination) = self.nominations.get_mut(&id) {
                        nomination.status = status;
                    }
                }
                Undo::Allocations(id, rows) => restore(&mut self.allocations, id, rows),
                Undo::Finalized(id) => {
                    if let Some(conference) = self.conferences.get_mut(&id) {
                        conference.finalized_at = None;
                    }
                }
                Undo::Session(id, previous) => restore(&mut self.sessions, id, previous),
                Undo::ItemStatus(key, previous) => restore(&mut self.item_statuses, key, previous),
                Undo::Decision(key, previous) => restore(&mut self.decisions, key, previous),
                Undo::SessionBallot(key) => {
                    self.session_ballots.remove(&key);
                }
                Undo::Candidate(id, previous) => restore_ordered(&mut self.candidates, id, previous),
                Undo::ElectionBallot(key, previous) => {
                    restore_ordered(&mut self.election_ballots, key, previous)
                }
                Undo::ElectionResult(id, previous) => {
                    restore(&mut self.election_results, id, previous)
                }
                Undo::Assignment => {
                    self.assignments.pop();
                }
                Undo::Holder(id, previous) => restore(&mut self.holders, id, previous),
                Undo::History(id, previous) => restore(&mut self.history, id, previous),
            }
        }
    }
}

/// Volatile store for tests, demos and single-process deployments.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Seeding ====================

    pub async fn insert_group(&self, group: Group) {
        self.state.write().await.groups.insert(group.id.clone(), group);
    }

    pub async fn insert_conference(&self, conference: DelegateConference) {
        self.state
            .write()
            .await
            .conferences
            .insert(conference.id.clone(), conference);
    }

    pub async fn insert_nomination(&self, nomination: DelegateNomination) {
        self.state
            .write()
            .await
            .nominations
            .insert(nomination.id.clone(), nomination);
    }

    // ==================== Queries ====================

    pub async fn nomination(&self, id: &NominationId) -> Option<DelegateNomination> {
        self.state.read().await.nominations.get(id).cloned()
    }

    pub async fn allocations(&self, conference: &ConferenceId) -> Vec<DelegateAllocation> {
        let state = self.state.read().await;
        let mut rows = state
            .allocations
            .get(conference)
            .cloned()
            .unwrap_or_default();
        rows.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        rows
    }

    pub async fn session(&self, id: &SessionId) -> Option<SessionSnapshot> {
        self.state.read().await.sessions.get(id).cloned()
    }

    pub async fn item_status(&self, session: &SessionId, item: &ItemId) -> Option<ItemStatus> {
        let key = (session.clone(), item.clone());
        self.state.read().await.item_statuses.get(&key).copied()
    }

    pub async fn decision(&self, session: &SessionId, item: &ItemId) -> Option<ItemDecision> {
        let key = (session.clone(), item.clone());
        self.state.read().await.decisions.get(&key).cloned()
    }

    /// Ballots on one item, ordered by voter
    pub async fn session_ballots(&self, session: &SessionId, item: &ItemId) -> Vec<SessionBallot> {
        self.state
            .read()
            .await
            .session_ballots
            .iter()
            .filter(|((s, i, _), _)| s == session && i == item)
            .map(|(_, ballot)| ballot.clone())
            .collect()
    }

    pub async fn candidate(&self, id: &CandidateId) -> Option<Candidate> {
        self.state.read().await.candidates.get(id).cloned()
    }

    /// Ballots of one election, ordered by voter
    pub async fn election_ballots(&self, election: &ElectionId) -> Vec<ElectionBallot> {
        self.state
            .read()
            .await
            .election_ballots
            .iter()
            .filter(|((e, _), _)| e == election)
            .map(|(_, ballot)| ballot.clone())
            .collect()
    }

    pub async fn election_result(&self, election: &ElectionId) -> Option<StoredElectionResult> {
        self.state.read().await.election_results.get(election).cloned()
    }

    pub async fn holder(&self, position: &PositionId) -> StoredHolder {
        self.state
            .read()
            .await
            .holders
            .get(position)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn history(&self, position: &PositionId) -> Vec<HolderHistoryEntry> {
        self.state
            .read()
            .await
            .history
            .get(position)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn assignments(&self, position: &PositionId) -> Vec<PositionAssignment> {
        self.state
            .read()
            .await
            .assignments
            .iter()
            .filter(|a| &a.position_id == position)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TransactionApplier for MemoryStore {
    async fn apply(&self, batch: WriteBatch) -> Result<(), PersistenceError> {
        let mut state = self.state.write().await;
        let count = batch.len();
        let mut journal = Vec::with_capacity(count);

        for write in batch {
            trace!("Staging {} write", write.kind());
            if let Err(e) = state.stage(write, &mut journal) {
                debug!("Rolling back {} staged writes: {}", journal.len(), e);
                state.rollback(journal);
                return Err(e);
            }
        }

        debug!("Committed batch of {} writes", count);
        Ok(())
    }
}

#[async_trait]
impl GroupDirectory for MemoryStore {
    async fn conference(
        &self,
        id: &ConferenceId,
    ) -> Result<Option<DelegateConference>, DirectoryError> {
        Ok(self.state.read().await.conferences.get(id).cloned())
    }

    async fn child_groups(&self, parent: &GroupId) -> Result<Vec<Group>, DirectoryError> {
        Ok(self
            .state
            .read()
            .await
            .groups
            .values()
            .filter(|g| g.is_child_of(parent))
            .cloned()
            .collect())
    }

    async fn nominations(
        &self,
        conference: &ConferenceId,
    ) -> Result<Vec<DelegateNomination>, DirectoryError> {
        let state = self.state.read().await;
        let Some(conference) = state.conferences.get(conference) else {
            return Ok(Vec::new());
        };
        Ok(state
            .nominations
            .values()
            .filter(|n| {
                state
                    .groups
                    .get(&n.group_id)
                    .is_some_and(|g| g.is_child_of(&conference.parent_group))
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_domain::{HolderChangeReason, SessionPhase, VoteChoice};

    fn snapshot(id: &str, revision: u64) -> SessionSnapshot {
        SessionSnapshot {
            id: SessionId::new(id),
            phase: SessionPhase::Voting,
            current_item: Some(ItemId::new("i1")),
            started_at: Some(Utc::now()),
            ended_at: None,
            revision,
        }
    }

    fn header(id: &str, expected: u64) -> EntityWrite {
        EntityWrite::SessionHeader {
            snapshot: snapshot(id, expected + 1),
            expected_revision: expected,
        }
    }

    fn session_ballot(voter: &str) -> EntityWrite {
        EntityWrite::SessionBallot {
            session_id: SessionId::new("s1"),
            ballot: SessionBallot {
                item_id: ItemId::new("i1"),
                voter: UserId::new(voter),
                choice: VoteChoice::Accept,
                cast_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_session_revision_compare_and_swap() {
        let store = MemoryStore::new();
        store.apply(WriteBatch::new().with(header("s1", 0))).await.unwrap();
        store.apply(WriteBatch::new().with(header("s1", 1))).await.unwrap();

        // A writer that read revision 1 lost the race
        let err = store
            .apply(WriteBatch::new().with(header("s1", 1)))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PersistenceError::StaleRevision {
                session: "s1".to_string(),
                expected: 1,
                actual: 2,
            }
        );
        assert_eq!(store.session(&SessionId::new("s1")).await.unwrap().revision, 2);
    }

    #[tokio::test]
    async fn test_duplicate_ballot_rolls_back_whole_batch() {
        let store = MemoryStore::new();
        store
            .apply(WriteBatch::new().with(header("s1", 0)).with(session_ballot("alice")))
            .await
            .unwrap();

        let err = store
            .apply(WriteBatch::new().with(header("s1", 1)).with(session_ballot("alice")))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        // Header of the failed batch was not applied
        assert_eq!(store.session(&SessionId::new("s1")).await.unwrap().revision, 1);
        let ballots = store
            .session_ballots(&SessionId::new("s1"), &ItemId::new("i1"))
            .await;
        assert_eq!(ballots.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_election_ballot_within_one_batch() {
        let store = MemoryStore::new();
        let ballot = ElectionBallot {
            voter: UserId::new("v1"),
            candidate_id: CandidateId::new("c1"),
            cast_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let cast = EntityWrite::ElectionBallotCast {
            election_id: ElectionId::new("e1"),
            ballot,
        };

        let err = store
            .apply(WriteBatch::new().with(cast.clone()).with(cast))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        assert!(store.election_ballots(&ElectionId::new("e1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_change_vote_requires_previous_ballot() {
        let store = MemoryStore::new();
        let ballot = ElectionBallot {
            voter: UserId::new("v1"),
            candidate_id: CandidateId::new("c2"),
            cast_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let change = EntityWrite::ElectionBallotChanged {
            election_id: ElectionId::new("e1"),
            previous: CandidateId::new("c1"),
            ballot,
        };
        let err = store
            .apply(WriteBatch::new().with(change))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Backend(_)));
    }

    #[tokio::test]
    async fn test_conference_finalized_once() {
        let store = MemoryStore::new();
        store
            .insert_conference(DelegateConference::new("conf", "root", 5))
            .await;
        let finalize = || {
            WriteBatch::new().with(EntityWrite::ConferenceFinalized {
                conference_id: ConferenceId::new("conf"),
                finalized_at: Utc::now(),
            })
        };

        store.apply(finalize()).await.unwrap();
        let err = store.apply(finalize()).await.unwrap_err();
        assert_eq!(err, PersistenceError::AlreadyFinalized("conf".to_string()));
    }

    #[tokio::test]
    async fn test_failed_batch_restores_every_table_it_touched() {
        let store = MemoryStore::new();
        store
            .insert_conference(DelegateConference::new("conf", "root", 5))
            .await;
        store.insert_nomination(DelegateNomination::new("n1", "a", "u1", 1)).await;
        store
            .apply(WriteBatch::new().with(EntityWrite::ConferenceFinalized {
                conference_id: ConferenceId::new("conf"),
                finalized_at: Utc::now(),
            }))
            .await
            .unwrap();

        let batch = WriteBatch::new()
            .with(EntityWrite::NominationStatus {
                nomination_id: NominationId::new("n1"),
                status: NominationStatus::Confirmed,
            })
            .with(EntityWrite::Allocation {
                conference_id: ConferenceId::new("conf"),
                allocation: DelegateAllocation {
                    group_id: GroupId::new("a"),
                    member_count: 10,
                    allocated_delegates: 5,
                },
            })
            .with(EntityWrite::PositionHolder {
                position_id: PositionId::new("chair"),
                holder: Some(UserId::new("u1")),
                term: None,
            })
            .with(EntityWrite::HolderHistory {
                position_id: PositionId::new("chair"),
                entry: HolderHistoryEntry {
                    user_id: UserId::new("u1"),
                    start: Utc::now(),
                    end: None,
                    reason: HolderChangeReason::Appointed,
                },
            })
            .with(header("s1", 0))
            .with(EntityWrite::ConferenceFinalized {
                conference_id: ConferenceId::new("conf"),
                finalized_at: Utc::now(),
            });

        let err = store.apply(batch).await.unwrap_err();
        assert_eq!(err, PersistenceError::AlreadyFinalized("conf".to_string()));

        assert_eq!(
            store.nomination(&NominationId::new("n1")).await.unwrap().status,
            NominationStatus::Nominated
        );
        assert!(store.allocations(&ConferenceId::new("conf")).await.is_empty());
        assert_eq!(store.holder(&PositionId::new("chair")).await, StoredHolder::default());
        assert!(store.history(&PositionId::new("chair")).await.is_empty());
        assert!(store.session(&SessionId::new("s1")).await.is_none());
        // the earlier finalization survives the rollback
        let state = store.state.read().await;
        assert!(state.conferences[&ConferenceId::new("conf")].is_finalized());
    }

    #[tokio::test]
    async fn test_position_holder_requires_vacancy() {
        let store = MemoryStore::new();
        let seat = |user: Option<&str>| {
            WriteBatch::new().with(EntityWrite::PositionHolder {
                position_id: PositionId::new("treasurer"),
                holder: user.map(UserId::new),
                term: None,
            })
        };

        store.apply(seat(Some("alice"))).await.unwrap();
        let err = store.apply(seat(Some("bob"))).await.unwrap_err();
        assert!(err.is_unique_violation());

        store.apply(seat(None)).await.unwrap();
        store.apply(seat(Some("bob"))).await.unwrap();
        assert_eq!(
            store.holder(&PositionId::new("treasurer")).await.holder,
            Some(UserId::new("bob"))
        );
    }

    #[tokio::test]
    async fn test_directory_scopes_to_conference_parent() {
        let store = MemoryStore::new();
        store
            .insert_conference(DelegateConference::new("conf", "region", 3))
            .await;
        store.insert_group(Group::new("a", "A", 10).with_parent("region")).await;
        store.insert_group(Group::new("b", "B", 5).with_parent("region")).await;
        store.insert_group(Group::new("x", "X", 50).with_parent("elsewhere")).await;
        store.insert_nomination(DelegateNomination::new("n1", "a", "u1", 1)).await;
        store.insert_nomination(DelegateNomination::new("n2", "x", "u2", 1)).await;

        let children = store.child_groups(&GroupId::new("region")).await.unwrap();
        assert_eq!(children.len(), 2);

        let nominations = store.nominations(&ConferenceId::new("conf")).await.unwrap();
        assert_eq!(nominations.len(), 1);
        assert_eq!(nominations[0].id, NominationId::new("n1"));

        store
            .apply(WriteBatch::new().with(EntityWrite::NominationStatus {
                nomination_id: NominationId::new("n1"),
                status: NominationStatus::Confirmed,
            }))
            .await
            .unwrap();
        assert_eq!(
            store.nomination(&NominationId::new("n1")).await.unwrap().status,
            NominationStatus::Confirmed
        );
    }
}
