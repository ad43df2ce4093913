//! Largest-remainder apportionment with the Hare quota.
//!
//! Shares are computed exactly in integer arithmetic: a group's exact share
//! is `members * total_delegates / total_members`, so its floor and its
//! remainder numerator fall out of one integer division. Remainders share the
//! denominator `total_members` and compare without rounding error.

use super::group::{DelegateAllocation, GroupMembership};
use crate::core::error::DomainError;
use crate::core::ids::GroupId;
use serde::{Deserialize, Serialize};

/// Per-group working of an apportionment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub group_id: GroupId,
    pub member_count: u64,
    /// Exact proportional share (`member_count / quota`)
    pub exact_share: f64,
    /// Seats from the integer part of the share
    pub initial: u64,
    /// Fractional part of the share
    pub remainder: f64,
    /// Whether one leftover seat went to this group
    pub received_leftover: bool,
    pub allocated: u64,
}

/// Result of apportioning delegates across groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Apportionment {
    pub total_delegates: u64,
    pub total_members: u64,
    /// Hare quota: members per seat
    pub quota: f64,
    /// Lines in input order; zero-member groups are omitted
    pub lines: Vec<AllocationLine>,
}

impl Apportionment {
    pub fn allocations(&self) -> Vec<DelegateAllocation> {
        self.lines
            .iter()
            .map(|line| DelegateAllocation {
                group_id: line.group_id.clone(),
                member_count: line.member_count,
                allocated_delegates: line.allocated,
            })
            .collect()
    }

    pub fn allocated_to(&self, group_id: &GroupId) -> Option<u64> {
        self.lines
            .iter()
            .find(|line| &line.group_id == group_id)
            .map(|line| line.allocated)
    }

    pub fn leftover_seats(&self) -> u64 {
        self.lines.iter().filter(|l| l.received_leftover).count() as u64
    }
}

/// Apportion `total_delegates` seats across groups by member count.
///
/// Leftover seats go one each to the groups with the largest remainder.
/// Equal remainders are ordered by ascending group id, then input position.
///
/// # Example
///
/// ```
/// use ballot_domain::apportionment::{apportion, GroupMembership};
///
/// let groups = vec![
///     GroupMembership::new("A", 120),
///     GroupMembership::new("B", 80),
///     GroupMembership::new("C", 50),
/// ];
/// let result = apportion(&groups, 5).unwrap();
/// let seats: Vec<u64> = result.lines.iter().map(|l| l.allocated).collect();
/// assert_eq!(seats, vec![2, 2, 1]);
/// ```
pub fn apportion(
    groups: &[GroupMembership],
    total_delegates: u64,
) -> Result<Apportionment, DomainError> {
    if total_delegates == 0 {
        return Err(DomainError::InvalidDelegateCount);
    }

    let members: Vec<&GroupMembership> = groups.iter().filter(|g| g.member_count > 0).collect();
    let total_members = members
        .iter()
        .try_fold(0u64, |sum, g| sum.checked_add(g.member_count))
        .ok_or(DomainError::MemberCountOverflow)?;
    if total_members == 0 {
        return Err(DomainError::NoMembers);
    }

    let seats = total_delegates as u128;
    let population = total_members as u128;

    // (initial seats, remainder numerator over `population`)
    let shares: Vec<(u64, u128)> = members
        .iter()
        .map(|g| {
            let scaled = g.member_count as u128 * seats;
            ((scaled / population) as u64, scaled % population)
        })
        .collect();

    let initial_sum: u64 = shares.iter().map(|(initial, _)| initial).sum();
    let leftover = (total_delegates - initial_sum) as usize;

    let mut order: Vec<usize> = (0..members.len()).collect();
    order.sort_by(|&a, &b| {
        shares[b]
            .1
            .cmp(&shares[a].1)
            .then_with(|| members[a].group_id.cmp(&members[b].group_id))
            .then_with(|| a.cmp(&b))
    });

    let mut receives = vec![false; members.len()];
    for &idx in order.iter().take(leftover) {
        receives[idx] = true;
    }

    let quota = total_members as f64 / total_delegates as f64;
    let lines = members
        .iter()
        .zip(shares.iter())
        .zip(receives)
        .map(|((group, &(initial, rem)), received_leftover)| AllocationLine {
            group_id: group.group_id.clone(),
            member_count: group.member_count,
            exact_share: group.member_count as f64 / quota,
            initial,
            remainder: rem as f64 / population as f64,
            received_leftover,
            allocated: initial + u64::from(received_leftover),
        })
        .collect();

    Ok(Apportionment {
        total_delegates,
        total_members,
        quota,
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(counts: &[(&str, u64)]) -> Vec<GroupMembership> {
        counts
            .iter()
            .map(|(id, n)| GroupMembership::new(*id, *n))
            .collect()
    }

    #[test]
    fn test_member_total_overflow_is_an_error() {
        let err = apportion(&groups(&[("A", u64::MAX), ("B", 1)]), 3).unwrap_err();
        assert_eq!(err, DomainError::MemberCountOverflow);
    }

    #[test]
    fn test_scenario_three_groups_five_seats() {
        let result = apportion(&groups(&[("A", 120), ("B", 80), ("C", 50)]), 5).unwrap();

        assert_eq!(result.total_members, 250);
        assert!((result.quota - 50.0).abs() < 1e-9);

        let a = &result.lines[0];
        let b = &result.lines[1];
        let c = &result.lines[2];
        assert!((a.exact_share - 2.4).abs() < 1e-9);
        assert!((b.exact_share - 1.6).abs() < 1e-9);
        assert!((c.exact_share - 1.0).abs() < 1e-9);
        assert_eq!((a.initial, b.initial, c.initial), (2, 1, 1));
        assert!(b.received_leftover);
        assert_eq!((a.allocated, b.allocated, c.allocated), (2, 2, 1));
        assert_eq!(result.leftover_seats(), 1);
    }

    #[test]
    fn test_zero_member_groups_dropped() {
        let result = apportion(&groups(&[("A", 10), ("empty", 0), ("B", 10)]), 4).unwrap();
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.allocated_to(&GroupId::new("empty")), None);
        assert_eq!(result.allocated_to(&GroupId::new("A")), Some(2));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            apportion(&groups(&[("A", 10)]), 0),
            Err(DomainError::InvalidDelegateCount)
        );
        assert_eq!(
            apportion(&groups(&[("A", 0)]), 3),
            Err(DomainError::NoMembers)
        );
        assert_eq!(apportion(&[], 3), Err(DomainError::NoMembers));
    }

    #[test]
    fn test_remainder_ties_break_by_group_id() {
        // Three equal groups, one seat: every remainder is 1/3
        let result = apportion(&groups(&[("c", 10), ("a", 10), ("b", 10)]), 1).unwrap();
        assert_eq!(result.allocated_to(&GroupId::new("a")), Some(1));
        assert_eq!(result.allocated_to(&GroupId::new("b")), Some(0));
        assert_eq!(result.allocated_to(&GroupId::new("c")), Some(0));
    }

    #[test]
    fn test_more_seats_than_members() {
        let result = apportion(&groups(&[("A", 1), ("B", 2)]), 7).unwrap();
        let total: u64 = result.lines.iter().map(|l| l.allocated).sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn test_sum_and_within_one_property() {
        // Deterministic pseudo-random sweep over sizes and seat counts
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        for _ in 0..200 {
            let n = (next() % 8 + 1) as usize;
            let input: Vec<GroupMembership> = (0..n)
                .map(|i| GroupMembership::new(format!("g{i}"), next() % 500))
                .collect();
            let total_delegates = next() % 60 + 1;

            let Ok(result) = apportion(&input, total_delegates) else {
                assert!(input.iter().all(|g| g.member_count == 0));
                continue;
            };

            let sum: u64 = result.lines.iter().map(|l| l.allocated).sum();
            assert_eq!(sum, total_delegates);

            for line in &result.lines {
                let diff = (line.allocated as f64 - line.exact_share).abs();
                assert!(diff < 1.0, "{} off by {}", line.group_id, diff);
            }
        }
    }

    #[test]
    fn test_allocations_projection() {
        let result = apportion(&groups(&[("A", 120), ("B", 80), ("C", 50)]), 5).unwrap();
        let allocations = result.allocations();
        assert_eq!(allocations.len(), 3);
        assert_eq!(allocations[1].group_id, GroupId::new("B"));
        assert_eq!(allocations[1].member_count, 80);
        assert_eq!(allocations[1].allocated_delegates, 2);
    }
}
