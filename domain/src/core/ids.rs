//! Identifier value objects.
//!
//! Every entity is addressed through a string newtype so that a group id can
//! never be passed where a user id is expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// A member group (chapter, branch, committee)
    GroupId
);
string_id!(
    /// A platform user: voter, nominee, item author or seat holder
    UserId
);
string_id!(
    /// A delegate nomination within a conference
    NominationId
);
string_id!(
    /// A delegate conference whose seats are apportioned across child groups
    ConferenceId
);
string_id!(
    /// A live voting session
    SessionId
);
string_id!(
    /// A votable item (change request) inside a session queue
    ItemId
);
string_id!(
    /// An election
    ElectionId
);
string_id!(
    /// A candidate standing in an election
    CandidateId
);
string_id!(
    /// An office that can be held by one user at a time
    PositionId
);
string_id!(
    /// A recorded position assignment
    AssignmentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_compare_and_display() {
        let a = GroupId::new("a");
        let b: GroupId = "b".into();
        assert!(a < b);
        assert_eq!(a.to_string(), "a");
        assert_eq!(b.as_str(), "b");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = UserId::new("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
    }
}
