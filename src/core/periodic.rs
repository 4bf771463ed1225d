//! # PeriodicRoutine: invoke a handler on an interval with a resizable worker pool.
//!
//! ## Architecture
//! ```text
//! PeriodicRoutine::start()
//!   └─► pool::run()                       (pool controller, owns a JoinSet)
//!         ├─► pool token = root.child_token()
//!         ├─► spawn N × worker::run(pool token)
//!         │      ├─► initial delay (cancellable)
//!         │      └─► loop { invoke handler ─► next delay ─► sleep (cancellable) }
//!         ├─► every recheck interval: desired = concurrency()
//!         │      └─► changed? cancel pool token, drain, respawn with new N
//!         └─► root cancelled? cancel pool token, drain, return
//!   └─► Draining: handler.on_shutdown()
//!   └─► Stopped: release `finished`
//!
//! PeriodicRoutine::stop()
//!   └─► cancel root token ─► await `finished`
//! ```
//!
//! ## Rules
//! - Invocations within one worker are sequential; workers run concurrently.
//! - The pool is drained completely before a resized pool is spawned, so the number of
//!   live workers never exceeds the old or the new size.
//! - Consecutive reinvocations are counted per routine (shared by all workers) and capped.
//! - `stop` returns only after every in-flight invocation returned and the finalizer ran.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clock::ClockRef;
use crate::core::builder::PeriodicRoutineBuilder;
use crate::core::info::{RoutineInfo, RoutineKind};
use crate::core::pool;
use crate::core::state::RoutineState;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::handlers::HandlerRef;
use crate::observation::Operation;
use crate::routines::BackgroundRoutine;

pub(crate) type IntervalFn = Arc<dyn Fn() -> Duration + Send + Sync>;
pub(crate) type ConcurrencyFn = Arc<dyn Fn() -> usize + Send + Sync>;

#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: RoutineState,
    started: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: RoutineState::Created,
            started: false,
        }
    }
}

/// Delay chosen after an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NextDelay {
    pub(crate) delay: Duration,
    /// The reinvocation cap forced this delay.
    pub(crate) capped: bool,
}

pub(crate) struct Inner {
    pub(crate) name: Arc<str>,
    pub(crate) description: String,
    pub(crate) job_name: String,
    pub(crate) handler: HandlerRef,
    pub(crate) interval: IntervalFn,
    pub(crate) concurrency: ConcurrencyFn,
    pub(crate) initial_delay: Duration,
    pub(crate) clock: ClockRef,
    pub(crate) concurrency_clock: ClockRef,
    pub(crate) operation: Option<Arc<dyn Operation>>,
    pub(crate) bus: Option<Bus>,
    pub(crate) max_reinvocations: u32,
    pub(crate) recheck_interval: Duration,
    /// Root token; child of the context the routine was built with.
    pub(crate) token: CancellationToken,
    /// Cancelled once the routine reached `Stopped`.
    pub(crate) finished: CancellationToken,
    pub(crate) lifecycle: Mutex<Lifecycle>,
    pub(crate) reinvocations: Mutex<u32>,
}

impl Inner {
    pub(crate) fn desired_concurrency(&self) -> usize {
        (self.concurrency)().max(1)
    }

    /// Picks the pause before the next invocation and updates the reinvocation counter.
    pub(crate) fn next_delay(&self, reinvoke: bool) -> NextDelay {
        let mut count = self
            .reinvocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if reinvoke {
            *count += 1;
            if *count < self.max_reinvocations {
                return NextDelay {
                    delay: Duration::ZERO,
                    capped: false,
                };
            }
        }
        *count = 0;
        NextDelay {
            delay: (self.interval)(),
            capped: reinvoke,
        }
    }

    pub(crate) fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev.with_routine(Arc::clone(&self.name)));
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn info(&self) -> RoutineInfo {
        RoutineInfo {
            name: self.name.to_string(),
            description: self.description.clone(),
            job_name: self.job_name.clone(),
            kind: RoutineKind::Periodic,
            interval: (self.interval)(),
            concurrency: self.desired_concurrency(),
        }
    }
}

/// Marks the routine stopped when `start` returns or unwinds.
struct Finish<'a>(&'a Inner);

impl Drop for Finish<'_> {
    fn drop(&mut self) {
        let inner = self.0;
        inner.lifecycle().state = RoutineState::Stopped;
        inner.publish(Event::now(EventKind::RoutineStopped).at(inner.clock.now()));
        info!(routine = %inner.name, "periodic routine stopped");
        inner.finished.cancel();
    }
}

/// A background routine that invokes its handler periodically.
///
/// Cloning is cheap and every clone controls the same routine.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use routinevisor::{BackgroundRoutine, HandlerError, HandlerFn, PeriodicRoutine};
///
/// # #[tokio::main]
/// # async fn main() {
/// let ctx = CancellationToken::new();
/// let janitor = PeriodicRoutine::builder(
///     &ctx,
///     HandlerFn::arc(|_ctx: CancellationToken| async { Ok::<_, HandlerError>(()) }),
/// )
/// .name("janitor")
/// .description("removes stale rows")
/// .interval(Duration::from_secs(60))
/// .build();
///
/// let running = tokio::spawn({
///     let janitor = janitor.clone();
///     async move { janitor.start().await }
/// });
/// // ...
/// janitor.stop().await;
/// running.await.unwrap().unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct PeriodicRoutine {
    inner: Arc<Inner>,
}

impl PeriodicRoutine {
    /// Starts building a routine for `handler`.
    ///
    /// The routine stops on its own when `ctx` is cancelled.
    pub fn builder(ctx: &CancellationToken, handler: HandlerRef) -> PeriodicRoutineBuilder {
        PeriodicRoutineBuilder::new(ctx, handler)
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RoutineState {
        self.inner.lifecycle().state
    }

    /// Routine description.
    pub fn description(&self) -> &str {
        &self.inner.description
    }

    /// Grouping key.
    pub fn job_name(&self) -> &str {
        &self.inner.job_name
    }

    /// Metadata with the interval and concurrency the providers return right now.
    pub fn info(&self) -> RoutineInfo {
        self.inner.info()
    }
}

#[async_trait]
impl BackgroundRoutine for PeriodicRoutine {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn start(&self) -> Result<(), RuntimeError> {
        let inner = &self.inner;
        {
            let mut lifecycle = inner.lifecycle();
            if lifecycle.state != RoutineState::Created {
                let routine = inner.name.to_string();
                return Err(if lifecycle.started {
                    RuntimeError::AlreadyStarted { routine }
                } else {
                    RuntimeError::AlreadyStopped { routine }
                });
            }
            lifecycle.state = RoutineState::Running;
            lifecycle.started = true;
        }
        let _finish = Finish(inner);

        let info = inner.info();
        info!(
            routine = %inner.name,
            interval = ?info.interval,
            concurrency = info.concurrency,
            "starting periodic routine"
        );
        inner.publish(Event::now(EventKind::RoutineRegistered).with_info(Arc::new(info)));
        inner.publish(Event::now(EventKind::RoutineStarted).at(inner.clock.now()));

        pool::run(Arc::clone(inner)).await;

        inner.lifecycle().state = RoutineState::Draining;
        debug!(routine = %inner.name, "workers drained, running finalizer");
        inner.handler.on_shutdown();
        Ok(())
    }

    async fn stop(&self) {
        let inner = &self.inner;
        let never_started = {
            let mut lifecycle = inner.lifecycle();
            if lifecycle.state == RoutineState::Created {
                lifecycle.state = RoutineState::Stopped;
                true
            } else {
                false
            }
        };

        inner.token.cancel();
        if never_started {
            debug!(routine = %inner.name, "stopped before start");
            inner.handler.on_shutdown();
            inner.publish(Event::now(EventKind::RoutineStopped).at(inner.clock.now()));
            inner.finished.cancel();
        }
        inner.finished.cancelled().await;
    }
}
