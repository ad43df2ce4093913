//! Groups and delegate conferences

use crate::core::ids::{ConferenceId, GroupId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A member group in the organisation hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub member_count: u64,
    /// Parent group, `None` for the root of the hierarchy
    pub parent: Option<GroupId>,
}

impl Group {
    pub fn new(id: impl Into<GroupId>, name: impl Into<String>, member_count: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            member_count,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<GroupId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn is_child_of(&self, parent: &GroupId) -> bool {
        self.parent.as_ref() == Some(parent)
    }

    pub fn membership(&self) -> GroupMembership {
        GroupMembership::new(self.id.clone(), self.member_count)
    }
}

/// Input row for apportionment: a group and its member count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub member_count: u64,
}

impl GroupMembership {
    pub fn new(group_id: impl Into<GroupId>, member_count: u64) -> Self {
        Self {
            group_id: group_id.into(),
            member_count,
        }
    }
}

/// Seats allocated to one group (derived, recomputed on every finalize)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateAllocation {
    pub group_id: GroupId,
    pub member_count: u64,
    pub allocated_delegates: u64,
}

/// A delegate conference: seats of the parent group's conference are
/// apportioned across its child groups and filled from nominations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateConference {
    pub id: ConferenceId,
    pub parent_group: GroupId,
    pub total_delegates: u64,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl DelegateConference {
    pub fn new(
        id: impl Into<ConferenceId>,
        parent_group: impl Into<GroupId>,
        total_delegates: u64,
    ) -> Self {
        Self {
            id: id.into(),
            parent_group: parent_group.into(),
            total_delegates,
            finalized_at: None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_hierarchy() {
        let parent = GroupId::new("federation");
        let child = Group::new("north", "North", 120).with_parent("federation");
        assert!(child.is_child_of(&parent));
        assert!(!Group::new("south", "South", 80).is_child_of(&parent));
        assert_eq!(child.membership(), GroupMembership::new("north", 120));
    }

    #[test]
    fn test_conference_finalized_flag() {
        let mut conference = DelegateConference::new("c1", "federation", 5);
        assert!(!conference.is_finalized());
        conference.finalized_at = Some(Utc::now());
        assert!(conference.is_finalized());
    }
}
