//! # LogWriter: renders runtime events through `tracing`
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  routine="janitor" concurrency=Some(1) routine registered
//! DEBUG routine="janitor" worker=0 duration=12ms run completed
//! WARN  routine="janitor" worker=0 err="disk full" run failed
//! INFO  routine="janitor" concurrency=4 worker pool resized
//! INFO  shutdown requested
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event logging subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let routine = e.routine.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::RoutineRegistered => {
                let concurrency = e.info.as_ref().map(|i| i.concurrency);
                info!(routine, ?concurrency, "routine registered");
            }
            EventKind::RoutineStarted => info!(routine, "routine started"),
            EventKind::RoutineStopped => info!(routine, "routine stopped"),
            EventKind::RunCompleted => {
                debug!(routine, worker = ?e.worker, duration = ?e.duration, "run completed");
            }
            EventKind::RunFailed => {
                warn!(routine, worker = ?e.worker, err = ?e.error, "run failed");
            }
            EventKind::ReinvocationCapped => {
                warn!(routine, worker = ?e.worker, delay = ?e.delay, "reinvocation cap reached");
            }
            EventKind::ConcurrencyChanged => {
                info!(routine, concurrency = ?e.concurrency, "worker pool resized");
            }
            EventKind::ShutdownRequested => info!(trigger = ?e.error, "shutdown requested"),
            EventKind::AllStopped => info!("all routines stopped"),
            EventKind::GraceExceeded => {
                warn!(grace = ?e.delay, stuck = ?e.error, "grace period exceeded");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = routine, reason = ?e.error, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = routine, info = ?e.error, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
