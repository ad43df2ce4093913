//! Positions, assignments, and holder history

use crate::core::error::DomainError;
use crate::core::ids::{AssignmentId, ElectionId, GroupId, PositionId, UserId};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// How a holder came to hold a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentSource {
    Election,
    Appointment,
}

/// Why a history entry was opened or closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolderChangeReason {
    Elected,
    Appointed,
    Resigned,
    Removed,
    TermEnded,
}

impl HolderChangeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolderChangeReason::Elected => "elected",
            HolderChangeReason::Appointed => "appointed",
            HolderChangeReason::Resigned => "resigned",
            HolderChangeReason::Removed => "removed",
            HolderChangeReason::TermEnded => "term_ended",
        }
    }
}

impl From<AssignmentSource> for HolderChangeReason {
    fn from(source: AssignmentSource) -> Self {
        match source {
            AssignmentSource::Election => HolderChangeReason::Elected,
            AssignmentSource::Appointment => HolderChangeReason::Appointed,
        }
    }
}

/// Reasons a holder can leave a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyReason {
    Resigned,
    Removed,
    TermEnded,
}

impl From<VacancyReason> for HolderChangeReason {
    fn from(reason: VacancyReason) -> Self {
        match reason {
            VacancyReason::Resigned => HolderChangeReason::Resigned,
            VacancyReason::Removed => HolderChangeReason::Removed,
            VacancyReason::TermEnded => HolderChangeReason::TermEnded,
        }
    }
}

/// Length of a term of office, in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermLength(u32);

impl TermLength {
    pub fn days(days: u32) -> Self {
        Self(days)
    }

    pub fn as_days(&self) -> u32 {
        self.0
    }

    pub fn to_delta(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.0))
    }

    /// When a term starting at `start` ends.
    ///
    /// Fails with [`DomainError::InvalidTerm`] when the end falls outside
    /// the representable calendar.
    pub fn ends_at(&self, start: DateTime<Utc>) -> Result<DateTime<Utc>, DomainError> {
        TimeDelta::try_days(i64::from(self.0))
            .and_then(|delta| start.checked_add_signed(delta))
            .ok_or(DomainError::InvalidTerm(self.0))
    }
}

/// One holder's tenure. `end` is `None` while the tenure is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderHistoryEntry {
    pub user_id: UserId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub reason: HolderChangeReason,
}

impl HolderHistoryEntry {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Record of a user being placed in a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionAssignment {
    pub id: AssignmentId,
    pub position_id: PositionId,
    pub user_id: UserId,
    pub assigned_via: AssignmentSource,
    pub election_id: Option<ElectionId>,
    pub assigned_at: DateTime<Utc>,
    pub term_ends_at: Option<DateTime<Utc>>,
}

/// An office held by at most one user at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub title: String,
    pub group_id: GroupId,
    pub current_holder: Option<UserId>,
    pub term: Option<TermLength>,
    history: Vec<HolderHistoryEntry>,
}

impl Position {
    pub fn new(
        id: impl Into<PositionId>,
        title: impl Into<String>,
        group_id: impl Into<GroupId>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            group_id: group_id.into(),
            current_holder: None,
            term: None,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[HolderHistoryEntry] {
        &self.history
    }

    pub fn open_entry(&self) -> Option<&HolderHistoryEntry> {
        self.history.iter().rev().find(|e| e.is_open())
    }

    pub fn is_vacant(&self) -> bool {
        self.current_holder.is_none()
    }

    /// Place `user_id` in a vacant position and open a history entry.
    pub fn assign(
        &mut self,
        assignment_id: impl Into<AssignmentId>,
        user_id: UserId,
        source: AssignmentSource,
        election_id: Option<ElectionId>,
        term: Option<TermLength>,
        now: DateTime<Utc>,
    ) -> Result<PositionAssignment, DomainError> {
        if !self.is_vacant() {
            return Err(DomainError::PositionOccupied(self.id.to_string()));
        }
        let term_ends_at = term.map(|t| t.ends_at(now)).transpose()?;

        self.current_holder = Some(user_id.clone());
        self.term = term;
        self.history.push(HolderHistoryEntry {
            user_id: user_id.clone(),
            start: now,
            end: None,
            reason: source.into(),
        });

        Ok(PositionAssignment {
            id: assignment_id.into(),
            position_id: self.id.clone(),
            user_id,
            assigned_via: source,
            election_id,
            assigned_at: now,
            term_ends_at,
        })
    }

    /// Clear the holder and close the open history entry.
    pub fn remove_holder(
        &mut self,
        reason: VacancyReason,
        now: DateTime<Utc>,
    ) -> Result<HolderHistoryEntry, DomainError> {
        if self.current_holder.take().is_none() {
            return Err(DomainError::PositionVacant(self.id.to_string()));
        }

        let entry = self
            .history
            .iter_mut()
            .rev()
            .find(|e| e.is_open())
            .ok_or_else(|| DomainError::PositionVacant(self.id.to_string()))?;
        entry.end = Some(now);
        entry.reason = reason.into();
        Ok(entry.clone())
    }
}
