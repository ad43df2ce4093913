//! Countdown derived from a shared start timestamp
//!
//! Every observer computes `remaining = max(0, duration - (now - started_at))`
//! from the same `started_at`, so late joiners and drifting clocks converge
//! on the same value at each reconciliation. Between reconciliations the
//! countdown ticks locally.

use super::local::{TICK, TickOutcome};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Remaining time for a countdown started at `started_at`.
///
/// A `started_at` in the future (observer clock behind) counts as no time
/// elapsed.
pub fn remaining_at(started_at: DateTime<Utc>, duration: Duration, now: DateTime<Utc>) -> Duration {
    let elapsed = (now - started_at).to_std().unwrap_or(Duration::ZERO);
    duration.saturating_sub(elapsed)
}

/// Countdown synchronised to a shared start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedCountdown {
    started_at: Option<DateTime<Utc>>,
    duration: Duration,
    remaining: Duration,
    fired: bool,
}

impl SyncedCountdown {
    pub fn new(duration: Duration) -> Self {
        Self {
            started_at: None,
            duration,
            remaining: duration,
            fired: false,
        }
    }

    /// Create a countdown already anchored to `started_at` and reconciled at `now`.
    pub fn anchored(started_at: DateTime<Utc>, duration: Duration, now: DateTime<Utc>) -> Self {
        let mut countdown = Self::new(duration);
        countdown.set_started_at(Some(started_at), now);
        countdown
    }

    /// Apply a (possibly unchanged) shared start time.
    ///
    /// A changed start time re-arms expiry and recalculates immediately.
    pub fn set_started_at(
        &mut self,
        started_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> TickOutcome {
        if self.started_at != started_at {
            self.started_at = started_at;
            self.fired = false;
        }
        self.reconcile(now)
    }

    /// Recompute remaining time from the shared start time.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let Some(started_at) = self.started_at else {
            self.remaining = self.duration;
            return TickOutcome::Idle;
        };
        self.remaining = remaining_at(started_at, self.duration, now);
        self.settle()
    }

    /// Local one-second tick between reconciliations.
    pub fn tick(&mut self) -> TickOutcome {
        if self.started_at.is_none() {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(TICK);
        self.settle()
    }

    fn settle(&mut self) -> TickOutcome {
        if !self.remaining.is_zero() {
            return TickOutcome::Running(self.remaining);
        }
        if self.fired {
            TickOutcome::Idle
        } else {
            self.fired = true;
            TickOutcome::Expired
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_expired(&self) -> bool {
        self.started_at.is_some() && self.remaining.is_zero()
    }
}
