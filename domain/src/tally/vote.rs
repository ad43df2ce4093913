//! Vote types for item tallies
//!
//! This module defines the ballot choice and the aggregated count used by
//! the session controller.

use serde::{Deserialize, Serialize};

/// A voter's choice on a votable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Accept,
    Reject,
    Abstain,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Accept => "accept",
            VoteChoice::Reject => "reject",
            VoteChoice::Abstain => "abstain",
        }
    }
}

impl std::fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accept" | "yes" => Ok(VoteChoice::Accept),
            "reject" | "no" => Ok(VoteChoice::Reject),
            "abstain" => Ok(VoteChoice::Abstain),
            _ => Err(format!("Unknown vote choice: {}", s)),
        }
    }
}

/// Aggregated counts of a set of votes
///
/// `accept + reject + abstain == total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub accept: usize,
    pub reject: usize,
    pub abstain: usize,
    pub total: usize,
}

impl VoteCount {
    /// Votes that count toward a simple or two-thirds majority
    pub fn decisive(&self) -> usize {
        self.accept + self.reject
    }

    /// Get the acceptance ratio among decisive votes (0.0 to 1.0)
    pub fn acceptance_ratio(&self) -> f64 {
        if self.decisive() == 0 {
            0.0
        } else {
            self.accept as f64 / self.decisive() as f64
        }
    }

    /// Generate a visual vote summary (e.g., "[●●○·]")
    pub fn vote_summary(&self) -> String {
        let mut summary = String::from("[");
        summary.extend(std::iter::repeat_n('●', self.accept));
        summary.extend(std::iter::repeat_n('○', self.reject));
        summary.extend(std::iter::repeat_n('·', self.abstain));
        summary.push(']');
        summary
    }
}

/// Count votes by choice.
pub fn count_votes<'a, I>(votes: I) -> VoteCount
where
    I: IntoIterator<Item = &'a VoteChoice>,
{
    votes
        .into_iter()
        .fold(VoteCount::default(), |mut count, choice| {
            match choice {
                VoteChoice::Accept => count.accept += 1,
                VoteChoice::Reject => count.reject += 1,
                VoteChoice::Abstain => count.abstain += 1,
            }
            count.total += 1;
            count
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices(accept: usize, reject: usize, abstain: usize) -> Vec<VoteChoice> {
        let mut v = vec![VoteChoice::Accept; accept];
        v.extend(vec![VoteChoice::Reject; reject]);
        v.extend(vec![VoteChoice::Abstain; abstain]);
        v
    }

    #[test]
    fn test_count_votes_partitions_input() {
        let votes = choices(6, 3, 1);
        let count = count_votes(&votes);
        assert_eq!(count.accept, 6);
        assert_eq!(count.reject, 3);
        assert_eq!(count.abstain, 1);
        assert_eq!(count.total, votes.len());
        assert_eq!(count.accept + count.reject + count.abstain, count.total);
    }

    #[test]
    fn test_count_votes_empty() {
        let count = count_votes(&[]);
        assert_eq!(count, VoteCount::default());
        assert_eq!(count.acceptance_ratio(), 0.0);
    }

    #[test]
    fn test_acceptance_ratio_ignores_abstentions() {
        let count = count_votes(&choices(6, 3, 1));
        assert!((count.acceptance_ratio() - 6.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_vote_summary() {
        let count = count_votes(&choices(2, 1, 1));
        assert_eq!(count.vote_summary(), "[●●○·]");
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!("Accept".parse::<VoteChoice>(), Ok(VoteChoice::Accept));
        assert_eq!("no".parse::<VoteChoice>(), Ok(VoteChoice::Reject));
        assert!("maybe".parse::<VoteChoice>().is_err());
    }
}
