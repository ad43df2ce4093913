//! Countdown drivers
//!
//! Tokio tasks that tick a domain countdown once per second until cancelled.
//! Callers spawn them; the core owns no background task of its own.
//!
//! - [`drive_local_countdown`] ticks a shared [`LocalCountdown`] that the
//!   caller can pause, resume or reset between ticks.
//! - [`drive_synced_countdown`] follows a `started_at` watch channel (see
//!   [`VotingSessionController::subscribe_started_at`](crate::use_cases::voting_session::VotingSessionController::subscribe_started_at))
//!   and reconciles against the clock whenever it changes.
//!
//! Only `Running` and `Expired` outcomes are reported; idle ticks are not.

use crate::ports::clock::Clock;
use ballot_domain::timer::TICK;
use ballot_domain::{LocalCountdown, SyncedCountdown, TickOutcome};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

fn ticker() -> Interval {
    let mut interval = time::interval_at(Instant::now() + TICK, TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn report<F: FnMut(TickOutcome)>(outcome: TickOutcome, on_tick: &mut F) {
    if outcome != TickOutcome::Idle {
        on_tick(outcome);
    }
}

/// Tick `timer` every second until `cancel` fires.
pub async fn drive_local_countdown<F>(
    timer: Arc<Mutex<LocalCountdown>>,
    cancel: CancellationToken,
    mut on_tick: F,
) where
    F: FnMut(TickOutcome) + Send,
{
    let mut interval = ticker();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let outcome = timer.lock().await.tick();
                if outcome.is_expired() {
                    debug!("Local countdown expired");
                }
                report(outcome, &mut on_tick);
            }
        }
    }
}

/// Follow a shared start time and tick locally between changes.
///
/// The countdown is reconciled against `clock` on start and on every change
/// of `started_at`; expiry is reported once per start time.
pub async fn drive_synced_countdown<F>(
    duration: Duration,
    mut started_at: watch::Receiver<Option<DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    mut on_tick: F,
) where
    F: FnMut(TickOutcome) + Send,
{
    let mut countdown = SyncedCountdown::new(duration);
    let initial = *started_at.borrow_and_update();
    report(countdown.set_started_at(initial, clock.now()), &mut on_tick);

    let mut interval = ticker();
    let mut watching = true;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = started_at.changed(), if watching => match changed {
                Ok(()) => {
                    let anchor = *started_at.borrow_and_update();
                    debug!("Countdown re-anchored to {:?}", anchor);
                    report(countdown.set_started_at(anchor, clock.now()), &mut on_tick);
                    interval.reset();
                }
                // Publisher gone: keep counting locally
                Err(_) => watching = false,
            },
            _ = interval.tick() => report(countdown.tick(), &mut on_tick),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::FixedClock;
    use chrono::TimeDelta;
    use tokio::sync::mpsc;

    fn secs(n: u64) -> TickOutcome {
        TickOutcome::Running(Duration::from_secs(n))
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_countdown_expires_once() {
        let timer = Arc::new(Mutex::new(LocalCountdown::new()));
        timer.lock().await.start(Duration::from_secs(3)).unwrap();

        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(drive_local_countdown(
            timer.clone(),
            cancel.clone(),
            move |outcome| {
                let _ = tx.send(outcome);
            },
        ));

        assert_eq!(rx.recv().await, Some(secs(2)));
        assert_eq!(rx.recv().await, Some(secs(1)));
        assert_eq!(rx.recv().await, Some(TickOutcome::Expired));

        // Idle ticks are not reported
        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert!(timer.lock().await.resume().is_err());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_countdown_pause_holds_remaining() {
        let timer = Arc::new(Mutex::new(LocalCountdown::new()));
        timer.lock().await.start(Duration::from_secs(10)).unwrap();

        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(drive_local_countdown(
            timer.clone(),
            cancel.clone(),
            move |outcome| {
                let _ = tx.send(outcome);
            },
        ));

        assert_eq!(rx.recv().await, Some(secs(9)));
        timer.lock().await.pause();
        time::sleep(Duration::from_secs(4)).await;
        assert_eq!(timer.lock().await.remaining(), Duration::from_secs(9));

        timer.lock().await.resume().unwrap();
        assert_eq!(rx.recv().await, Some(secs(8)));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_synced_countdown_follows_started_at() {
        let now = Utc::now();
        let clock = Arc::new(FixedClock::new(now));
        let (started_tx, started_rx) = watch::channel(Some(now - TimeDelta::seconds(5)));

        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(drive_synced_countdown(
            Duration::from_secs(10),
            started_rx,
            clock.clone(),
            cancel.clone(),
            move |outcome| {
                let _ = tx.send(outcome);
            },
        ));

        // Joined halfway through
        assert_eq!(rx.recv().await, Some(secs(5)));
        for n in (1..5).rev() {
            assert_eq!(rx.recv().await, Some(secs(n)));
        }
        assert_eq!(rx.recv().await, Some(TickOutcome::Expired));

        // Next item: a fresh start time re-arms the countdown
        clock.set(now + TimeDelta::seconds(20));
        started_tx.send_replace(Some(now + TimeDelta::seconds(20)));
        assert_eq!(rx.recv().await, Some(secs(10)));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_synced_countdown_late_join_is_expired() {
        let now = Utc::now();
        let clock = Arc::new(FixedClock::new(now));
        let (_started_tx, started_rx) = watch::channel(Some(now - TimeDelta::seconds(15)));

        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(drive_synced_countdown(
            Duration::from_secs(10),
            started_rx,
            clock,
            cancel.clone(),
            move |outcome| {
                let _ = tx.send(outcome);
            },
        ));

        assert_eq!(rx.recv().await, Some(TickOutcome::Expired));
        cancel.cancel();
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
