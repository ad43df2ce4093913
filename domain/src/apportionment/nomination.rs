//! Delegate nominations and the finalization step.

use super::group::DelegateAllocation;
use crate::core::ids::{GroupId, NominationId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status of a delegate nomination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NominationStatus {
    #[default]
    Nominated,
    Confirmed,
    Standby,
}

impl NominationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NominationStatus::Nominated => "nominated",
            NominationStatus::Confirmed => "confirmed",
            NominationStatus::Standby => "standby",
        }
    }
}

/// A member nominated as delegate for their group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateNomination {
    pub id: NominationId,
    pub group_id: GroupId,
    pub user_id: UserId,
    /// Ordinal rank inside the group; lower is higher priority
    pub priority: u32,
    pub status: NominationStatus,
}

impl DelegateNomination {
    pub fn new(
        id: impl Into<NominationId>,
        group_id: impl Into<GroupId>,
        user_id: impl Into<UserId>,
        priority: u32,
    ) -> Self {
        Self {
            id: id.into(),
            group_id: group_id.into(),
            user_id: user_id.into(),
            priority,
            status: NominationStatus::Nominated,
        }
    }
}

/// Status assigned to one nomination by [`finalize_selection`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionDecision {
    pub nomination_id: NominationId,
    pub group_id: GroupId,
    pub status: NominationStatus,
}

/// Confirm the highest-priority nominees of each group up to its allocation.
///
/// Only nominations still in `Nominated` status take part. Within a group
/// nominations are ranked by ascending priority (then nomination id); the
/// first `allocated_delegates` are confirmed and the rest become standby.
/// Groups without an allocation get no confirmed seats.
///
/// Decisions are returned grouped by group, in rank order.
pub fn finalize_selection(
    nominations: &[DelegateNomination],
    allocations: &[DelegateAllocation],
) -> Vec<SelectionDecision> {
    let seats: HashMap<&GroupId, u64> = allocations
        .iter()
        .map(|a| (&a.group_id, a.allocated_delegates))
        .collect();

    let mut by_group: HashMap<&GroupId, Vec<&DelegateNomination>> = HashMap::new();
    for nomination in nominations
        .iter()
        .filter(|n| n.status == NominationStatus::Nominated)
    {
        by_group.entry(&nomination.group_id).or_default().push(nomination);
    }

    let mut groups: Vec<_> = by_group.into_iter().collect();
    groups.sort_by(|a, b| a.0.cmp(b.0));

    let mut decisions = Vec::with_capacity(nominations.len());
    for (group_id, mut ranked) in groups {
        ranked.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        let allocated = seats.get(group_id).copied().unwrap_or(0) as usize;

        decisions.extend(ranked.into_iter().enumerate().map(|(rank, n)| {
            SelectionDecision {
                nomination_id: n.id.clone(),
                group_id: n.group_id.clone(),
                status: if rank < allocated {
                    NominationStatus::Confirmed
                } else {
                    NominationStatus::Standby
                },
            }
        }));
    }

    decisions
}
