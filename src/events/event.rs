//! # Runtime events emitted by routines and the monitor.
//!
//! [`EventKind`] groups events into:
//! - **Routine lifecycle**: registration, start, stop
//! - **Runs**: one event per handler invocation (completed or failed)
//! - **Pool**: reinvocation cap hits and concurrency changes
//! - **Monitor**: shutdown milestones
//! - **Subscribers**: overflow and panic reports from the fan-out layer
//!
//! ## Ordering guarantees
//! Every event carries a process-wide sequence number (`seq`) taken from one atomic
//! counter. Subscribers see events in per-subscriber FIFO order; use `seq` to merge
//! streams.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use routinevisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::RunFailed)
//!     .with_routine("janitor")
//!     .with_worker(0)
//!     .with_duration(Duration::from_millis(250))
//!     .with_error("disk full");
//!
//! assert_eq!(ev.routine.as_deref(), Some("janitor"));
//! assert_eq!(ev.error.as_deref(), Some("disk full"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::core::RoutineInfo;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Routine lifecycle ===
    /// Static metadata of a routine, published once when it starts.
    ///
    /// Sets: `routine`, `info`.
    RoutineRegistered,

    /// Routine entered the running state.
    ///
    /// Sets: `routine`.
    RoutineStarted,

    /// Routine drained, ran its finalizer and stopped.
    ///
    /// Sets: `routine`.
    RoutineStopped,

    // === Runs ===
    /// Handler invocation returned without a business error.
    ///
    /// Sets: `routine`, `worker`, `duration`; `at` is the invocation start.
    RunCompleted,

    /// Handler invocation returned a business error.
    ///
    /// Sets: `routine`, `worker`, `duration`, `error`; `at` is the invocation start.
    RunFailed,

    // === Pool ===
    /// Consecutive reinvocations hit the cap; a full interval sleep was forced.
    ///
    /// Sets: `routine`, `worker`, `delay`.
    ReinvocationCapped,

    /// The worker pool was rebuilt with a new size.
    ///
    /// Sets: `routine`, `concurrency` (new size).
    ConcurrencyChanged,

    // === Monitor ===
    /// Shutdown requested (signal or context cancellation).
    ///
    /// Sets: `error` with the trigger description.
    ShutdownRequested,

    /// All monitored routines stopped.
    AllStopped,

    /// Stopping took longer than the configured grace period (not enforced).
    ///
    /// Sets: `delay` (grace), `error` with the routines still stopping.
    GraceExceeded,

    // === Subscribers ===
    /// A subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `routine` (subscriber name), `error` (reason).
    SubscriberOverflow,

    /// A subscriber panicked while processing an event.
    ///
    /// Sets: `routine` (subscriber name), `error` (panic message).
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: timestamp; for run events it is the invocation start taken from the routine's clock
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Timestamp.
    pub at: DateTime<Utc>,
    /// Event classification.
    pub kind: EventKind,
    /// Routine (or subscriber) name, if applicable.
    pub routine: Option<Arc<str>>,
    /// Index of the pool worker that produced the event.
    pub worker: Option<usize>,
    /// Duration of a run.
    pub duration: Option<Duration>,
    /// Scheduled delay or grace period.
    pub delay: Option<Duration>,
    /// Error or reason text.
    pub error: Option<Arc<str>>,
    /// Pool size.
    pub concurrency: Option<usize>,
    /// Static metadata (only for [`EventKind::RoutineRegistered`]).
    pub info: Option<Arc<RoutineInfo>>,
}

impl Event {
    /// Creates an event stamped with the wall clock and the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: Utc::now(),
            kind,
            routine: None,
            worker: None,
            duration: None,
            delay: None,
            error: None,
            concurrency: None,
            info: None,
        }
    }

    /// Overrides the timestamp.
    #[inline]
    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }

    /// Attaches a routine name.
    #[inline]
    pub fn with_routine(mut self, routine: impl Into<Arc<str>>) -> Self {
        self.routine = Some(routine.into());
        self
    }

    /// Attaches the worker index.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Attaches a run duration.
    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        self.duration = Some(d);
        self
    }

    /// Attaches a delay.
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }

    /// Attaches error/reason text.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a pool size.
    #[inline]
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = Some(n);
        self
    }

    /// Attaches static routine metadata.
    #[inline]
    pub fn with_info(mut self, info: Arc<RoutineInfo>) -> Self {
        self.info = Some(info);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_routine(subscriber)
            .with_error(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_routine(subscriber)
            .with_error(info)
    }

    /// True for events produced by the subscriber layer itself.
    ///
    /// The fan-out never re-publishes these, so a failing subscriber cannot feed itself.
    #[inline]
    pub fn is_subscriber_report(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
