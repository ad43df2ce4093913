//! Roster file for `ballot finalize`
//!
//! ```toml
//! [conference]
//! id = "spring-2025"
//! parent = "region"
//! total = 5
//!
//! [[groups]]
//! id = "a"
//! name = "North"
//! members = 120
//!
//! [[nominations]]
//! id = "n1"
//! group = "a"
//! user = "alice"
//! priority = 1
//! ```

use anyhow::{Context, Result};
use ballot_domain::{DelegateConference, DelegateNomination, Group};
use ballot_infrastructure::MemoryStore;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Roster {
    pub conference: RosterConference,
    #[serde(default)]
    pub groups: Vec<RosterGroup>,
    #[serde(default)]
    pub nominations: Vec<RosterNomination>,
}

#[derive(Debug, Deserialize)]
pub struct RosterConference {
    pub id: String,
    pub parent: String,
    /// Falls back to `delegates.total` when absent
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RosterGroup {
    pub id: String,
    pub name: Option<String>,
    pub members: u64,
}

#[derive(Debug, Deserialize)]
pub struct RosterNomination {
    pub id: String,
    pub group: String,
    pub user: String,
    pub priority: u32,
}

impl Roster {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading roster {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing roster {}", path.display()))
    }

    /// Load the roster into `store`; every group becomes a child of the
    /// conference's parent group.
    pub async fn seed(&self, store: &MemoryStore, total: u64) {
        store
            .insert_conference(DelegateConference::new(
                self.conference.id.as_str(),
                self.conference.parent.as_str(),
                total,
            ))
            .await;
        for group in &self.groups {
            let name = group.name.clone().unwrap_or_else(|| group.id.clone());
            store
                .insert_group(
                    Group::new(group.id.as_str(), name, group.members)
                        .with_parent(self.conference.parent.as_str()),
                )
                .await;
        }
        for nomination in &self.nominations {
            store
                .insert_nomination(DelegateNomination::new(
                    nomination.id.as_str(),
                    nomination.group.as_str(),
                    nomination.user.as_str(),
                    nomination.priority,
                ))
                .await;
        }
    }
}
