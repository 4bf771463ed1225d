//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for observing routines: run history, logs,
//! metrics exporters, dashboards.
//!
//! Each subscriber gets:
//! - **its own worker task**, so a slow subscriber never delays a routine;
//! - **its own bounded queue** (capacity via [`Subscribe::queue_capacity`]);
//! - **panic isolation**: a panic is caught, logged and reported as
//!   `EventKind::SubscriberPanicked`.
//!
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! On overflow the new event is dropped for that subscriber only and
//! `EventKind::SubscriberOverflow` is published.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use routinevisor::{Event, EventKind, Subscribe};
//!
//! struct FailureAlerts;
//!
//! #[async_trait]
//! impl Subscribe for FailureAlerts {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::RunFailed) {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "alerts" }
//!     fn queue_capacity(&self) -> usize { 256 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of runtime events.
///
/// Events arrive in FIFO order on a dedicated worker task. Use async I/O, handle errors
/// internally, and do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and in overflow/panic reports.
    ///
    /// The default is `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
