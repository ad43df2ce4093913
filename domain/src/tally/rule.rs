//! Majority rules for vote tallies
//!
//! This module defines the thresholds used to decide whether a votable item
//! (or an election leader) has enough support.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Rule for determining whether a vote passes
///
/// - `Simple`: more accepts than rejects among non-abstaining votes (default)
/// - `Absolute`: accepts exceed half of all eligible voters
/// - `TwoThirds`: accepts are at least two thirds of non-abstaining votes
///
/// # Example
///
/// ```
/// use ballot_domain::tally::MajorityType;
///
/// let rule = MajorityType::Simple;
/// assert!(rule.is_satisfied(6, 3, 12));
/// assert!(!rule.is_satisfied(3, 3, 12)); // a tie does not pass
///
/// let strict = MajorityType::Absolute;
/// assert!(!strict.is_satisfied(6, 3, 12)); // 6 is not more than 12 / 2
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MajorityType {
    /// More accepts than rejects
    #[default]
    Simple,

    /// More than half of the eligible voters accept
    Absolute,

    /// At least two thirds of the non-abstaining votes accept
    TwoThirds,
}

impl MajorityType {
    /// Check if the rule is satisfied given accept/reject counts and the
    /// eligible-voter count. Abstentions never count toward either side.
    pub fn is_satisfied(&self, accept: usize, reject: usize, total_eligible: usize) -> bool {
        let decisive = accept + reject;
        match self {
            MajorityType::Simple => accept > reject,
            MajorityType::Absolute => accept * 2 > total_eligible,
            MajorityType::TwoThirds => decisive > 0 && accept * 3 >= decisive * 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MajorityType::Simple => "simple",
            MajorityType::Absolute => "absolute",
            MajorityType::TwoThirds => "two-thirds",
        }
    }

    /// Get a human-readable description of this rule
    pub fn description(&self) -> &'static str {
        match self {
            MajorityType::Simple => "simple majority (more accepts than rejects)",
            MajorityType::Absolute => "absolute majority (more than half of eligible voters)",
            MajorityType::TwoThirds => "two-thirds majority of votes cast",
        }
    }

    /// All accepted spellings, for validation messages.
    pub fn valid_values() -> Vec<String> {
        vec![
            "simple".to_string(),
            "absolute".to_string(),
            "two-thirds".to_string(),
        ]
    }
}

impl std::fmt::Display for MajorityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::str::FromStr for MajorityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(MajorityType::Simple),
            "absolute" => Ok(MajorityType::Absolute),
            "two-thirds" | "two_thirds" | "2/3" => Ok(MajorityType::TwoThirds),
            _ => Err(format!(
                "Unknown majority type: {}. Valid: simple, absolute, two-thirds",
                s
            )),
        }
    }
}

/// Minimum participation fraction, validated to lie in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct QuorumFraction(f64);

impl QuorumFraction {
    pub fn new(fraction: f64) -> Result<Self, DomainError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(DomainError::InvalidQuorumFraction(fraction.to_string()));
        }
        Ok(Self(fraction))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for QuorumFraction {
    fn default() -> Self {
        Self(0.5)
    }
}

impl TryFrom<f64> for QuorumFraction {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuorumFraction> for f64 {
    fn from(q: QuorumFraction) -> Self {
        q.0
    }
}

/// Everything a tally needs besides the votes themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TallyRule {
    pub quorum: QuorumFraction,
    pub majority: MajorityType,
    pub total_eligible: usize,
}

impl TallyRule {
    pub fn new(quorum: QuorumFraction, majority: MajorityType, total_eligible: usize) -> Self {
        Self {
            quorum,
            majority,
            total_eligible,
        }
    }
}
