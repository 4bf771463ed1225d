//! # Manual clock for tests.
//!
//! [`MockClock`] only moves when [`MockClock::advance`] is called. Each call to
//! [`Clock::sleep`] arms a timer with a deadline; `advance` fires every timer whose
//! deadline has been reached.
//!
//! ## Synchronizing with workers
//! Workers arm their timers from their own tasks, so a test should wait for the timer to
//! exist before moving time:
//! ```text
//! clock.block_until(1).await;   // a worker is now sleeping on this clock
//! clock.advance(interval);      // wake it up
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::{self, BoxFuture};
use tokio::sync::{Notify, oneshot};

use super::Clock;

struct Timer {
    deadline: DateTime<Utc>,
    tx: oneshot::Sender<()>,
}

struct State {
    now: DateTime<Utc>,
    timers: Vec<Timer>,
}

/// Deterministic clock driven by [`advance`](MockClock::advance).
pub struct MockClock {
    state: Mutex<State>,
    armed: Notify,
}

impl MockClock {
    /// Creates a clock frozen at the Unix epoch.
    pub fn new() -> Self {
        Self::starting_at(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Creates a clock frozen at `now`.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(State {
                now,
                timers: Vec::new(),
            }),
            armed: Notify::new(),
        }
    }

    /// Moves time forward by `dur` and fires every timer that became due.
    pub fn advance(&self, dur: Duration) {
        let mut state = self.lock();
        state.now = add(state.now, dur);

        let now = state.now;
        let (due, waiting): (Vec<Timer>, Vec<Timer>) =
            state.timers.drain(..).partition(|t| t.deadline <= now);
        state.timers = waiting;
        drop(state);

        for timer in due {
            let _ = timer.tx.send(());
        }
    }

    /// Number of armed timers whose sleep future is still alive.
    pub fn pending(&self) -> usize {
        let mut state = self.lock();
        state.timers.retain(|t| !t.tx.is_closed());
        state.timers.len()
    }

    /// Waits until at least `n` timers are armed on this clock.
    pub async fn block_until(&self, n: usize) {
        loop {
            // Created before the check so a timer armed in between is not missed.
            let armed = self.armed.notified();
            if self.pending() >= n {
                return;
            }
            armed.await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.lock().now
    }

    fn sleep(&self, dur: Duration) -> BoxFuture<'static, ()> {
        if dur.is_zero() {
            return Box::pin(future::ready(()));
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.lock();
            let deadline = add(state.now, dur);
            state.timers.push(Timer { deadline, tx });
        }
        self.armed.notify_waiters();

        Box::pin(async move {
            let _ = rx.await;
        })
    }
}

fn add(at: DateTime<Utc>, dur: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(dur)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn zero_sleep_is_ready() {
        let clock = MockClock::new();
        assert!(clock.sleep(Duration::ZERO).now_or_never().is_some());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn advance_fires_only_due_timers() {
        let clock = MockClock::new();
        let mut short = clock.sleep(Duration::from_secs(1));
        let mut long = clock.sleep(Duration::from_secs(3));
        assert_eq!(clock.pending(), 2);

        clock.advance(Duration::from_secs(1));
        assert!((&mut short).now_or_never().is_some());
        assert!((&mut long).now_or_never().is_none());
        assert_eq!(clock.pending(), 1);

        clock.advance(Duration::from_secs(2));
        assert!(long.now_or_never().is_some());
        assert_eq!(clock.now(), DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(3));
    }

    #[test]
    fn dropped_sleeps_are_not_pending() {
        let clock = MockClock::new();
        let sleep = clock.sleep(Duration::from_secs(1));
        assert_eq!(clock.pending(), 1);
        drop(sleep);
        assert_eq!(clock.pending(), 0);
    }

    #[tokio::test]
    async fn block_until_waits_for_a_sleeper() {
        let clock = std::sync::Arc::new(MockClock::new());
        let sleeper = {
            let clock = clock.clone();
            tokio::spawn(async move { clock.sleep(Duration::from_secs(1)).await })
        };

        clock.block_until(1).await;
        clock.advance(Duration::from_secs(1));
        sleeper.await.unwrap();
    }
}
