//! Session parameters - default tally rule and voting window.
//!
//! [`SessionParams`] groups the static parameters a voting session is run
//! with. The eligible voter count is not part of it: it belongs to the
//! meeting, not to the configuration.

use ballot_domain::{MajorityType, QuorumFraction, TallyRule};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionParams {
    pub quorum: QuorumFraction,
    pub majority: MajorityType,
    /// How long ballots stay open per item
    pub voting_duration: Duration,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            quorum: QuorumFraction::default(),
            majority: MajorityType::default(),
            voting_duration: Duration::from_secs(60),
        }
    }
}

impl SessionParams {
    // ==================== Builder Methods ====================

    pub fn with_quorum(mut self, quorum: QuorumFraction) -> Self {
        self.quorum = quorum;
        self
    }

    pub fn with_majority(mut self, majority: MajorityType) -> Self {
        self.majority = majority;
        self
    }

    pub fn with_voting_duration(mut self, duration: Duration) -> Self {
        self.voting_duration = duration;
        self
    }

    /// Tally rule for a meeting with `total_eligible` voters
    pub fn tally_rule(&self, total_eligible: usize) -> TallyRule {
        TallyRule::new(self.quorum, self.majority, total_eligible)
    }
}
