use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::HandlerError;

/// Observer wrapped around every handler invocation.
///
/// `err` is already filtered: shutdown and reinvoke results arrive as `None`. Keep
/// `observe` cheap; it runs on the worker between invocations.
pub trait Operation: Send + Sync + 'static {
    /// Operation name, recorded on the invocation span.
    fn name(&self) -> &str;

    /// Records one finished invocation.
    fn observe(&self, elapsed: Duration, err: Option<&HandlerError>);
}

/// Rate / errors / duration counters.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use routinevisor::{HandlerError, Operation, RedMetrics};
///
/// let op = RedMetrics::new("janitor.run");
/// op.observe(Duration::from_millis(10), None);
/// op.observe(Duration::from_millis(30), Some(&HandlerError::fail("boom")));
///
/// let snap = op.snapshot();
/// assert_eq!((snap.count, snap.errors), (2, 1));
/// assert_eq!(snap.total, Duration::from_millis(40));
/// ```
#[derive(Debug)]
pub struct RedMetrics {
    name: Cow<'static, str>,
    count: AtomicU64,
    errors: AtomicU64,
    total_micros: AtomicU64,
}

/// Point-in-time copy of [`RedMetrics`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RedSnapshot {
    /// Invocations observed.
    pub count: u64,
    /// Invocations that returned a business error.
    pub errors: u64,
    /// Total time spent in the handler (microsecond precision).
    pub total: Duration,
}

impl RedMetrics {
    /// Creates zeroed counters.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            count: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            total_micros: AtomicU64::new(0),
        }
    }

    /// Reads the counters.
    pub fn snapshot(&self) -> RedSnapshot {
        RedSnapshot {
            count: self.count.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            total: Duration::from_micros(self.total_micros.load(Ordering::Relaxed)),
        }
    }
}

impl Operation for RedMetrics {
    fn name(&self) -> &str {
        &self.name
    }

    fn observe(&self, elapsed: Duration, err: Option<&HandlerError>) {
        self.count.fetch_add(1, Ordering::Relaxed);
        if err.is_some() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_micros.fetch_add(micros, Ordering::Relaxed);
    }
}
