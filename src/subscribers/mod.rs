//! # Event subscribers.
//!
//! Subscribers are the attachable observability layer: nothing in the engine depends on
//! them, and they never block a routine.
//!
//! ```text
//! PeriodicRoutine ── publish(Event) ──► Bus ──► SubscriberSet
//!                                                   ├──► Recorder   (run history, stats)
//!                                                   ├──► LogWriter  (feature "logging")
//!                                                   └──► custom Subscribe impls
//! ```
//!
//! - [`Subscribe`] trait for custom subscribers
//! - [`SubscriberSet`] non-blocking fan-out with per-subscriber queues
//! - [`Recorder`] in-memory run history with per-day aggregates

mod recorder;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use recorder::{Recorder, RecorderConfig, RoutineHistory, RunRecord, RunStats};
pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
