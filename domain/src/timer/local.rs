//! Local countdown driven by one-second ticks

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One tick of the countdown clock
pub const TICK: Duration = Duration::from_secs(1);

/// State of a [`LocalCountdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

/// Result of advancing a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not counting (idle, paused, or already expired)
    Idle,
    /// Still counting down
    Running(Duration),
    /// Reached zero on this tick. Reported exactly once per run.
    Expired,
}

impl TickOutcome {
    pub fn is_expired(&self) -> bool {
        matches!(self, TickOutcome::Expired)
    }
}

/// A countdown owned by a single observer.
///
/// Expiry is reported once; an expired countdown must be [`reset`](Self::reset)
/// before it can run again.
///
/// ```
/// use ballot_domain::timer::{LocalCountdown, TickOutcome};
/// use std::time::Duration;
///
/// let mut timer = LocalCountdown::new();
/// timer.start(Duration::from_secs(2)).unwrap();
/// assert_eq!(timer.tick(), TickOutcome::Running(Duration::from_secs(1)));
/// assert_eq!(timer.tick(), TickOutcome::Expired);
/// assert_eq!(timer.tick(), TickOutcome::Idle);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCountdown {
    duration: Duration,
    remaining: Duration,
    state: TimerState,
}

impl Default for LocalCountdown {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCountdown {
    pub fn new() -> Self {
        Self {
            duration: Duration::ZERO,
            remaining: Duration::ZERO,
            state: TimerState::Idle,
        }
    }

    pub fn start(&mut self, duration: Duration) -> Result<(), DomainError> {
        if self.state == TimerState::Expired {
            return Err(DomainError::TimerExpired);
        }
        self.duration = duration;
        self.remaining = duration;
        self.state = TimerState::Running;
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    pub fn resume(&mut self) -> Result<(), DomainError> {
        match self.state {
            TimerState::Paused => {
                self.state = TimerState::Running;
                Ok(())
            }
            TimerState::Expired => Err(DomainError::TimerExpired),
            TimerState::Idle | TimerState::Running => Ok(()),
        }
    }

    /// Stop and rewind to the last started duration.
    pub fn reset(&mut self) {
        self.remaining = self.duration;
        self.state = TimerState::Idle;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(TICK);
        if self.remaining.is_zero() {
            self.state = TimerState::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining)
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_down_and_expires_once() {
        let mut timer = LocalCountdown::new();
        timer.start(Duration::from_secs(3)).unwrap();

        let outcomes: Vec<_> = (0..5).map(|_| timer.tick()).collect();
        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Running(Duration::from_secs(2)),
                TickOutcome::Running(Duration::from_secs(1)),
                TickOutcome::Expired,
                TickOutcome::Idle,
                TickOutcome::Idle,
            ]
        );
        assert_eq!(outcomes.iter().filter(|o| o.is_expired()).count(), 1);
        assert!(timer.is_expired());
    }

    #[test]
    fn test_pause_holds_remaining() {
        let mut timer = LocalCountdown::new();
        timer.start(Duration::from_secs(10)).unwrap();
        timer.tick();
        timer.pause();
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.remaining(), Duration::from_secs(9));

        timer.resume().unwrap();
        assert_eq!(timer.tick(), TickOutcome::Running(Duration::from_secs(8)));
    }

    #[test]
    fn test_not_resumable_after_expiry_without_reset() {
        let mut timer = LocalCountdown::new();
        timer.start(Duration::from_secs(1)).unwrap();
        assert!(timer.tick().is_expired());

        assert_eq!(timer.resume(), Err(DomainError::TimerExpired));
        assert_eq!(
            timer.start(Duration::from_secs(5)),
            Err(DomainError::TimerExpired)
        );

        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining(), Duration::from_secs(1));
        timer.start(Duration::from_secs(5)).unwrap();
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn test_sub_second_duration_expires_on_first_tick() {
        let mut timer = LocalCountdown::new();
        timer.start(Duration::from_millis(400)).unwrap();
        assert_eq!(timer.tick(), TickOutcome::Expired);
    }
}
