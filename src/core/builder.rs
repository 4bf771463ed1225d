use std::borrow::Cow;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::clock::{ClockRef, SystemClock};
use crate::core::config::{
    CONCURRENCY_RECHECK_INTERVAL, DEFAULT_INTERVAL, MAX_CONSECUTIVE_REINVOCATIONS,
};
use crate::core::periodic::{ConcurrencyFn, Inner, IntervalFn, Lifecycle, PeriodicRoutine};
use crate::events::Bus;
use crate::handlers::HandlerRef;
use crate::observation::Operation;

/// Builder for [`PeriodicRoutine`].
///
/// Defaults: name `"periodic"`, empty description and job name, interval
/// [`DEFAULT_INTERVAL`], concurrency 1, no initial delay, [`SystemClock`] for both clocks,
/// no operation, no bus, reinvocation cap [`MAX_CONSECUTIVE_REINVOCATIONS`], recheck every
/// [`CONCURRENCY_RECHECK_INTERVAL`].
pub struct PeriodicRoutineBuilder {
    ctx: CancellationToken,
    handler: HandlerRef,
    name: Cow<'static, str>,
    description: Cow<'static, str>,
    job_name: Cow<'static, str>,
    interval: IntervalFn,
    concurrency: ConcurrencyFn,
    initial_delay: Duration,
    clock: ClockRef,
    concurrency_clock: ClockRef,
    operation: Option<Arc<dyn Operation>>,
    bus: Option<Bus>,
    max_reinvocations: u32,
    recheck_interval: Duration,
}

impl PeriodicRoutineBuilder {
    pub(crate) fn new(ctx: &CancellationToken, handler: HandlerRef) -> Self {
        Self {
            ctx: ctx.clone(),
            handler,
            name: Cow::Borrowed("periodic"),
            description: Cow::Borrowed(""),
            job_name: Cow::Borrowed(""),
            interval: Arc::new(|| DEFAULT_INTERVAL),
            concurrency: Arc::new(|| 1),
            initial_delay: Duration::ZERO,
            clock: Arc::new(SystemClock),
            concurrency_clock: Arc::new(SystemClock),
            operation: None,
            bus: None,
            max_reinvocations: MAX_CONSECUTIVE_REINVOCATIONS,
            recheck_interval: CONCURRENCY_RECHECK_INTERVAL,
        }
    }

    /// Sets the routine name (used in logs, events and listings).
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets a human-readable description.
    pub fn description(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the grouping key reported to recorders.
    pub fn job_name(mut self, job_name: impl Into<Cow<'static, str>>) -> Self {
        self.job_name = job_name.into();
        self
    }

    /// Uses a fixed interval between invocations.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Arc::new(move || interval);
        self
    }

    /// Computes the interval before every sleep.
    pub fn interval_fn(mut self, f: impl Fn() -> Duration + Send + Sync + 'static) -> Self {
        self.interval = Arc::new(f);
        self
    }

    /// Uses a fixed number of workers (`0` is treated as 1).
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = Arc::new(move || n);
        self
    }

    /// Reads the desired number of workers at start and on every recheck.
    pub fn concurrency_fn(mut self, f: impl Fn() -> usize + Send + Sync + 'static) -> Self {
        self.concurrency = Arc::new(f);
        self
    }

    /// Delays each worker's first invocation.
    ///
    /// Applies to every worker the pool spawns, including after a resize.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Clock for initial delays and interval sleeps.
    pub fn clock(mut self, clock: ClockRef) -> Self {
        self.clock = clock;
        self
    }

    /// Clock for concurrency rechecks.
    pub fn concurrency_clock(mut self, clock: ClockRef) -> Self {
        self.concurrency_clock = clock;
        self
    }

    /// Observes every invocation.
    pub fn operation(mut self, operation: Arc<dyn Operation>) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Publishes lifecycle and run events on `bus`.
    pub fn bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Overrides the cap on consecutive reinvocations.
    pub fn max_consecutive_reinvocations(mut self, max: u32) -> Self {
        self.max_reinvocations = max;
        self
    }

    /// Overrides how often the concurrency provider is re-read (`0` keeps the default).
    pub fn concurrency_recheck_interval(mut self, every: Duration) -> Self {
        self.recheck_interval = every;
        self
    }

    /// Builds the routine. Nothing runs until [`start`](crate::BackgroundRoutine::start).
    pub fn build(self) -> PeriodicRoutine {
        PeriodicRoutine::from_inner(Inner {
            name: Arc::from(self.name.as_ref()),
            description: self.description.into_owned(),
            job_name: self.job_name.into_owned(),
            handler: self.handler,
            interval: self.interval,
            concurrency: self.concurrency,
            initial_delay: self.initial_delay,
            clock: self.clock,
            concurrency_clock: self.concurrency_clock,
            operation: self.operation,
            bus: self.bus,
            max_reinvocations: self.max_reinvocations,
            recheck_interval: if self.recheck_interval.is_zero() {
                CONCURRENCY_RECHECK_INTERVAL
            } else {
                self.recheck_interval
            },
            token: self.ctx.child_token(),
            finished: CancellationToken::new(),
            lifecycle: Mutex::new(Lifecycle::default()),
            reinvocations: Mutex::new(0),
        })
    }
}
