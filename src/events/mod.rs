//! Runtime events: data model and broadcast bus.
//!
//! - [`Event`], [`EventKind`] event classification and payload
//! - [`Bus`] non-blocking publisher shared by routines and the monitor
//!
//! Publishers: [`PeriodicRoutine`](crate::PeriodicRoutine) (lifecycle, runs, pool changes),
//! [`Monitor`](crate::Monitor) (shutdown milestones), [`SubscriberSet`](crate::SubscriberSet)
//! workers (overflow/panic).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
