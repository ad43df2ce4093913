//! Group directory port
//!
//! Read-only access to the group roster and delegate nominations.

use async_trait::async_trait;
use ballot_domain::{ConferenceId, DelegateConference, DelegateNomination, Group, GroupId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn conference(
        &self,
        id: &ConferenceId,
    ) -> Result<Option<DelegateConference>, DirectoryError>;

    /// Direct children of `parent`
    async fn child_groups(&self, parent: &GroupId) -> Result<Vec<Group>, DirectoryError>;

    /// All nominations filed for `conference`, in any status
    async fn nominations(
        &self,
        conference: &ConferenceId,
    ) -> Result<Vec<DelegateNomination>, DirectoryError>;
}
