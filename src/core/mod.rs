//! Runtime core: the periodic engine and the lifecycle monitor.
//!
//! Public API from this module is [`PeriodicRoutine`] (with its builder) and [`Monitor`].
//!
//! Internal modules:
//! - [`periodic`]: routine state machine, start/stop, shared inner state;
//! - [`pool`]: worker pool controller, concurrency recheck and resize;
//! - [`worker`]: invoke, next delay, cancellable sleep;
//! - [`monitor`]: starts routines, waits for a trigger, stops them gracefully;
//! - [`shutdown`]: cross-platform termination signal handling.

mod builder;
mod config;
mod info;
mod monitor;
mod periodic;
mod pool;
mod shutdown;
mod state;
mod worker;

pub use builder::PeriodicRoutineBuilder;
pub use config::{
    CONCURRENCY_RECHECK_INTERVAL, DEFAULT_INTERVAL, GRACEFUL_SHUTDOWN_TIMEOUT,
    MAX_CONSECUTIVE_REINVOCATIONS, MonitorConfig,
};
pub use info::{RoutineInfo, RoutineKind};
pub use monitor::{Monitor, monitor_background_routines};
pub use periodic::PeriodicRoutine;
pub use shutdown::{ShutdownSignal, wait_for_shutdown_signal};
pub use state::RoutineState;
