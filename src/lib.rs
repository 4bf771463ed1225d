//! # routinevisor
//!
//! **Routinevisor** runs long-lived background routines inside an async service.
//!
//! A [`PeriodicRoutine`] invokes a [`Handler`] on an interval with a resizable pool of
//! workers. A [`Monitor`] starts a set of routines, waits for a shutdown trigger (context
//! cancellation or a termination signal) and stops them gracefully. Every lifecycle step and
//! every invocation can be observed through a [`Bus`] and [`Subscribe`] implementations such
//! as the in-memory [`Recorder`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Handler    │   │   Handler    │   │  custom impl │
//!     │ (janitor)    │   │ (reaper)     │   │  of Routine  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  │
//!     ┌──────────────┐   ┌──────────────┐          │
//!     │   Periodic   │   │   Periodic   │          │
//!     │ worker pool  │   │ worker pool  │          │
//!     └──────┬───────┘   └──────┬───────┘          │
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Monitor (lifecycle coordinator)                                  │
//! │  - start every routine                                            │
//! │  - ctx cancelled / SIGHUP / SIGINT / SIGTERM ─► stop all          │
//! │  - grace exceeded ─► warn and keep waiting                        │
//! │  - second signal ─► forced exit                                   │
//! └───────────────────────────────────────────────────────────────────┘
//!
//!   PeriodicRoutine / Monitor ── publish(Event) ──► Bus ──► SubscriberSet
//!                                                            ├──► Recorder
//!                                                            ├──► LogWriter
//!                                                            └──► custom
//! ```
//!
//! ### Invocation loop (per worker)
//! ```text
//! initial delay
//! loop {
//!   ├─► handler.handle(child token)
//!   │       ├─ Ok                    ─► sleep(interval())
//!   │       ├─ ReinvokeImmediately   ─► run again at once (capped, then sleep(interval()))
//!   │       ├─ Canceled (shutdown)   ─► exit
//!   │       └─ other error           ─► handle_error(), sleep(interval())
//!   └─ token cancelled during sleep  ─► exit
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Handlers**      | Units of work with optional error and shutdown hooks.          | [`Handler`], [`HandlerFn`], [`WithErrorMessage`] |
//! | **Routines**      | Start/stop capability and the periodic engine.                 | [`BackgroundRoutine`], [`PeriodicRoutine`]      |
//! | **Lifecycle**     | Signal-driven graceful shutdown of a routine set.              | [`Monitor`], [`monitor_background_routines`]    |
//! | **Observability** | Events, fan-out subscribers, run history, per-run metrics.     | [`Subscribe`], [`Recorder`], [`Operation`]      |
//! | **Time**          | Injectable clock with a manual test clock.                     | [`Clock`], [`SystemClock`], [`MockClock`]       |
//! | **Pools**         | Bounded fire-and-collect pool and small concurrency helpers.   | [`Bounded`], [`run_workers`], [`go`]            |
//! | **Errors**        | Typed handler and runtime errors.                              | [`HandlerError`], [`RuntimeError`]              |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber backed by `tracing`.
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use routinevisor::{HandlerError, HandlerFn, PeriodicRoutine, RoutineRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = CancellationToken::new();
//!
//!     let cleaner = PeriodicRoutine::builder(
//!         &ctx,
//!         HandlerFn::arc(|ctx: CancellationToken| async move {
//!             if ctx.is_cancelled() {
//!                 return Err(HandlerError::Canceled);
//!             }
//!             println!("cleaning up");
//!             Ok(())
//!         }),
//!     )
//!     .name("cleaner")
//!     .interval(Duration::from_secs(5))
//!     .concurrency(2)
//!     .build();
//!
//!     let routines: Vec<RoutineRef> = vec![std::sync::Arc::new(cleaner)];
//!     routinevisor::monitor_background_routines(ctx, routines).await?;
//!     Ok(())
//! }
//! ```
mod clock;
mod core;
mod error;
mod events;
mod handlers;
mod observation;
mod pool;
mod routines;
mod subscribers;

// ---- Public re-exports ----

pub use clock::{Clock, ClockRef, MockClock, SystemClock};
pub use core::{
    CONCURRENCY_RECHECK_INTERVAL, DEFAULT_INTERVAL, GRACEFUL_SHUTDOWN_TIMEOUT,
    MAX_CONSECUTIVE_REINVOCATIONS, Monitor, MonitorConfig, PeriodicRoutine,
    PeriodicRoutineBuilder, RoutineInfo, RoutineKind, RoutineState, ShutdownSignal,
    monitor_background_routines, wait_for_shutdown_signal,
};
pub use error::{HandlerError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use handlers::{Handler, HandlerFn, HandlerRef, WithErrorMessage};
pub use observation::{Operation, RedMetrics, RedSnapshot};
pub use pool::{Bounded, go, run_workers};
pub use routines::{BackgroundRoutine, CombinedRoutine, NoopRoutine, RoutineRef};
pub use subscribers::{
    Recorder, RecorderConfig, RoutineHistory, RunRecord, RunStats, Subscribe, SubscriberSet,
};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
