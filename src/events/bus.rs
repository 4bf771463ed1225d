//! # Broadcast bus for runtime events.
//!
//! Routines and the monitor publish into a [`Bus`]; a [`SubscriberSet`](crate::SubscriberSet)
//! attached to it forwards every event to its subscribers.
//!
//! ```text
//!   PeriodicRoutine A ──┐
//!   PeriodicRoutine B ──┼──► Bus ──► SubscriberSet::attach ──► Recorder, LogWriter, ...
//!   Monitor           ──┘
//! ```
//!
//! Publishing never waits. The ring buffer keeps the last `capacity` events; a receiver that
//! falls further behind skips the oldest ones. With no receiver attached, events are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Cheaply cloneable event publisher.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus whose ring buffer holds `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to every current receiver without waiting.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Bus {
    /// A bus with room for 1024 events.
    fn default() -> Self {
        Self::new(1024)
    }
}
