//! Per-invocation observation.
//!
//! An [`Operation`] is attached to a routine with
//! [`PeriodicRoutineBuilder::operation`](crate::PeriodicRoutineBuilder::operation) and is
//! called synchronously after every invocation. [`RedMetrics`] is the stock implementation.

mod operation;

pub use operation::{Operation, RedMetrics, RedSnapshot};
