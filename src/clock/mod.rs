//! Time sources for the runtime.
//!
//! Routines never call `tokio::time` directly; they go through a [`Clock`] so tests can
//! drive sleeps by hand.
//!
//! ## Contents
//! - [`Clock`] the trait (`now` + `sleep`)
//! - [`SystemClock`] wall clock backed by `chrono` and `tokio::time`
//! - [`MockClock`] manual clock for deterministic tests

mod mock;
mod system;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

pub use mock::MockClock;
pub use system::SystemClock;

/// Source of the current time and of cancellable delays.
///
/// The timer is armed when [`sleep`](Clock::sleep) is **called**, not when the returned future
/// is first polled. Dropping the future disarms it.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Returns a future that completes once `dur` has elapsed on this clock.
    fn sleep(&self, dur: Duration) -> BoxFuture<'static, ()>;
}

/// Shared handle to a clock.
pub type ClockRef = Arc<dyn Clock>;
