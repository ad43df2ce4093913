//! Tally verdicts
//!
//! Combines the quorum check and the majority rule into the final verdict
//! for a votable item.

use super::rule::{MajorityType, QuorumFraction, TallyRule};
use super::vote::{VoteChoice, VoteCount, count_votes};
use serde::{Deserialize, Serialize};

/// Outcome of applying a majority rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MajorityResult {
    Passed,
    Rejected,
}

impl MajorityResult {
    pub fn is_passed(&self) -> bool {
        matches!(self, MajorityResult::Passed)
    }
}

/// Final verdict of a tally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Quorum reached and majority satisfied
    Passed,
    /// Quorum reached but majority not satisfied
    Rejected,
    /// Too few participants for the result to count
    QuorumNotReached,
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Passed => "passed",
            Verdict::Rejected => "rejected",
            Verdict::QuorumNotReached => "quorum_not_reached",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Passed => write!(f, "Passed"),
            Verdict::Rejected => write!(f, "Rejected"),
            Verdict::QuorumNotReached => write!(f, "Quorum not reached"),
        }
    }
}

/// Whether participation meets the quorum fraction.
///
/// With no eligible voters the quorum can never be reached.
pub fn is_quorum_reached(total: usize, total_eligible: usize, quorum: QuorumFraction) -> bool {
    if total_eligible == 0 {
        return false;
    }
    total as f64 / total_eligible as f64 >= quorum.value()
}

/// Apply a majority rule to a vote count.
///
/// A simple-majority tie (accept == reject) is rejected.
pub fn calculate_majority(
    count: &VoteCount,
    majority: MajorityType,
    total_eligible: usize,
) -> MajorityResult {
    if majority.is_satisfied(count.accept, count.reject, total_eligible) {
        MajorityResult::Passed
    } else {
        MajorityResult::Rejected
    }
}

/// Complete result of tallying an item
///
/// # Example
///
/// ```
/// use ballot_domain::tally::{tally, MajorityType, QuorumFraction, TallyRule, VoteChoice};
///
/// let mut votes = vec![VoteChoice::Accept; 6];
/// votes.extend([VoteChoice::Reject; 3]);
/// votes.push(VoteChoice::Abstain);
///
/// let rule = TallyRule::new(QuorumFraction::new(0.5).unwrap(), MajorityType::Simple, 12);
/// let outcome = tally(&votes, &rule);
/// assert!(outcome.quorum_reached);
/// assert!(outcome.verdict.is_passed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TallyOutcome {
    pub count: VoteCount,
    pub quorum_reached: bool,
    pub majority: MajorityResult,
    pub verdict: Verdict,
    pub rule: TallyRule,
}

impl TallyOutcome {
    /// Evaluate a precomputed count against a rule
    pub fn evaluate(count: VoteCount, rule: &TallyRule) -> Self {
        let quorum_reached = is_quorum_reached(count.total, rule.total_eligible, rule.quorum);
        let majority = calculate_majority(&count, rule.majority, rule.total_eligible);
        let verdict = match (quorum_reached, majority) {
            (false, _) => Verdict::QuorumNotReached,
            (true, MajorityResult::Passed) => Verdict::Passed,
            (true, MajorityResult::Rejected) => Verdict::Rejected,
        };

        Self {
            count,
            quorum_reached,
            majority,
            verdict,
            rule: *rule,
        }
    }

    /// Participation ratio (0.0 to 1.0)
    pub fn turnout(&self) -> f64 {
        if self.rule.total_eligible == 0 {
            0.0
        } else {
            self.count.total as f64 / self.rule.total_eligible as f64
        }
    }
}

/// Count and evaluate a set of votes in one step.
pub fn tally<'a, I>(votes: I, rule: &TallyRule) -> TallyOutcome
where
    I: IntoIterator<Item = &'a VoteChoice>,
{
    TallyOutcome::evaluate(count_votes(votes), rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(accept: usize, reject: usize, abstain: usize) -> VoteCount {
        VoteCount {
            accept,
            reject,
            abstain,
            total: accept + reject + abstain,
        }
    }

    fn rule(quorum: f64, majority: MajorityType, eligible: usize) -> TallyRule {
        TallyRule::new(QuorumFraction::new(quorum).unwrap(), majority, eligible)
    }

    #[test]
    fn test_quorum_reached() {
        let half = QuorumFraction::new(0.5).unwrap();
        assert!(is_quorum_reached(10, 12, half));
        assert!(is_quorum_reached(6, 12, half));
        assert!(!is_quorum_reached(5, 12, half));
        assert!(!is_quorum_reached(0, 0, half));
    }

    #[test]
    fn test_scenario_simple_majority_passes() {
        let outcome = TallyOutcome::evaluate(count(6, 3, 1), &rule(0.5, MajorityType::Simple, 12));
        assert!(outcome.quorum_reached);
        assert_eq!(outcome.majority, MajorityResult::Passed);
        assert_eq!(outcome.verdict, Verdict::Passed);
    }

    #[test]
    fn test_simple_tie_is_rejected() {
        let outcome = TallyOutcome::evaluate(count(4, 4, 0), &rule(0.5, MajorityType::Simple, 10));
        assert_eq!(outcome.majority, MajorityResult::Rejected);
        assert_eq!(outcome.verdict, Verdict::Rejected);
    }

    #[test]
    fn test_no_quorum_overrides_majority() {
        let outcome = TallyOutcome::evaluate(count(3, 0, 0), &rule(0.5, MajorityType::Simple, 12));
        assert_eq!(outcome.majority, MajorityResult::Passed);
        assert_eq!(outcome.verdict, Verdict::QuorumNotReached);
        assert!(!outcome.verdict.is_passed());
    }

    #[test]
    fn test_absolute_majority_counts_eligible() {
        let outcome =
            TallyOutcome::evaluate(count(6, 3, 1), &rule(0.5, MajorityType::Absolute, 12));
        assert_eq!(outcome.verdict, Verdict::Rejected);
    }

    #[test]
    fn test_calculate_majority_is_deterministic() {
        let c = count(7, 3, 2);
        for majority in [
            MajorityType::Simple,
            MajorityType::Absolute,
            MajorityType::TwoThirds,
        ] {
            let first = calculate_majority(&c, majority, 12);
            for _ in 0..5 {
                assert_eq!(calculate_majority(&c, majority, 12), first);
            }
        }
    }

    #[test]
    fn test_turnout() {
        let outcome = TallyOutcome::evaluate(count(6, 3, 1), &rule(0.5, MajorityType::Simple, 20));
        assert!((outcome.turnout() - 0.5).abs() < 1e-9);
    }
}
