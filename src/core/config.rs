//! # Runtime constants and monitor configuration.
//!
//! Per-routine settings live on [`PeriodicRoutineBuilder`](crate::PeriodicRoutineBuilder);
//! this module holds the defaults it starts from and the [`MonitorConfig`] used by the
//! lifecycle [`Monitor`](crate::Monitor).

use std::time::Duration;

/// Default cap on back-to-back reinvocations before a full interval sleep is forced.
pub const MAX_CONSECUTIVE_REINVOCATIONS: u32 = 100;

/// How often a routine re-reads its concurrency provider.
pub const CONCURRENCY_RECHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Expected upper bound for a graceful stop of all monitored routines.
pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval used when a routine is built without one.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration of the lifecycle [`Monitor`](crate::Monitor).
///
/// ## Field semantics
/// - `grace`: how long a graceful stop is expected to take. When exceeded the monitor logs
///   the routines still stopping and keeps waiting; it never abandons them (`0s` disables
///   the warning).
/// - `exit_code`: process exit code used when a second termination signal forces an exit.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Expected drain time before a warning is logged.
    pub grace: Duration,
    /// Exit code for a forced exit.
    pub exit_code: i32,
}

impl MonitorConfig {
    /// Returns the grace period as an `Option` (`None` when zero).
    #[inline]
    pub fn grace_warning(&self) -> Option<Duration> {
        if self.grace.is_zero() {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for MonitorConfig {
    /// `grace = GRACEFUL_SHUTDOWN_TIMEOUT` (10s), `exit_code = 1`.
    fn default() -> Self {
        Self {
            grace: GRACEFUL_SHUTDOWN_TIMEOUT,
            exit_code: 1,
        }
    }
}
