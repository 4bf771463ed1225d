//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] hands every [`Event`] to each subscriber's queue **without awaiting**
//! the subscriber. This is what keeps recorders and log writers off the routines' hot path.
//!
//! ## Guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO.
//! - Subscriber panics are caught, logged and published as `SubscriberPanicked`.
//!
//! ## Non-guarantees
//! - No ordering across subscribers.
//! - No retry on overflow: the event is dropped for that subscriber and
//!   `SubscriberOverflow` is published.
//!
//! ```text
//!   Bus ──► listener ──► emit(&Event)
//!                            ├──► [queue S1] ─► worker S1 ─► on_event()
//!                            ├──► [queue S2] ─► worker S2 ─► on_event()
//!                            └──► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::events::{Bus, Event};
use crate::pool::panic_message;

use super::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

struct Fanout {
    channels: Vec<SubscriberChannel>,
    bus: Bus,
}

impl Fanout {
    fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            warn!(subscriber = channel.name, reason, seq = event.seq, "subscriber dropped event");
            if !event.is_subscriber_report() {
                self.bus.publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Emits a bus event, skipping subscriber reports so a failing subscriber cannot feed
    /// itself.
    fn forward(&self, event: &Event) {
        if !event.is_subscriber_report() {
            self.emit(event);
        }
    }
}

/// Fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    fanout: Arc<Fanout>,
    workers: Vec<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
    stop: CancellationToken,
}

impl SubscriberSet {
    /// Creates a set and spawns one worker per subscriber.
    ///
    /// Overflow and panic reports are published on `bus`. Events are only delivered through
    /// [`emit`](Self::emit); use [`attach`](Self::attach) to also forward everything
    /// published on the bus.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let reports = bus.clone();

            workers.push(tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(panic.as_ref());
                        error!(subscriber = name, panic = %info, "subscriber panicked");
                        reports.publish(Event::subscriber_panicked(name, info));
                    }
                }
            }));
            channels.push(SubscriberChannel { name, sender: tx });
        }

        Self {
            fanout: Arc::new(Fanout { channels, bus }),
            workers,
            listener: None,
            stop: CancellationToken::new(),
        }
    }

    /// Creates a set that receives every event published on `bus`.
    ///
    /// Subscriber reports (overflow/panic) are not forwarded back to subscribers, so one
    /// failing subscriber cannot feed itself.
    #[must_use]
    pub fn attach(subs: Vec<Arc<dyn Subscribe>>, bus: &Bus) -> Self {
        let mut set = Self::new(subs, bus.clone());
        let mut rx = bus.subscribe();
        let fanout = Arc::clone(&set.fanout);

        let stop = set.stop.clone();

        set.listener = Some(tokio::spawn(async move {
            loop {
                let res = tokio::select! {
                    biased;
                    res = rx.recv() => res,
                    _ = stop.cancelled() => break,
                };
                match res {
                    Ok(ev) => fanout.forward(&ev),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
            // Events published before shutdown are still delivered.
            loop {
                match rx.try_recv() {
                    Ok(ev) => fanout.forward(&ev),
                    Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(_) => return,
                }
            }
        }));
        set
    }

    /// Fans out one event to all subscribers (non-blocking).
    pub fn emit(&self, event: &Event) {
        self.fanout.emit(event);
    }

    /// Forwards whatever is still buffered on the bus, stops forwarding, lets every worker
    /// drain its queue, and waits for them.
    pub async fn shutdown(self) {
        self.stop.cancel();
        if let Some(listener) = self.listener {
            let _ = listener.await;
        }
        drop(self.fanout);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fanout.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fanout.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use tokio::sync::mpsc::UnboundedSender;

    struct Collect(UnboundedSender<EventKind>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &Event) {
            let _ = self.0.send(ev.kind);
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _ev: &Event) {
            panic!("subscriber bug");
        }

        fn name(&self) -> &'static str {
            "explode"
        }
    }

    #[tokio::test]
    async fn panicking_subscriber_does_not_starve_others() {
        let bus = Bus::new(16);
        let mut reports = bus.subscribe();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Explode), Arc::new(Collect(tx))];
        let set = SubscriberSet::new(subs, bus);
        assert_eq!(set.len(), 2);

        set.emit(&Event::now(EventKind::RoutineStarted));
        set.emit(&Event::now(EventKind::RoutineStopped));

        assert_eq!(rx.recv().await, Some(EventKind::RoutineStarted));
        assert_eq!(rx.recv().await, Some(EventKind::RoutineStopped));

        let report = reports.recv().await.unwrap();
        assert_eq!(report.kind, EventKind::SubscriberPanicked);
        assert_eq!(report.routine.as_deref(), Some("explode"));
        assert_eq!(report.error.as_deref(), Some("subscriber bug"));

        set.shutdown().await;
    }

    #[tokio::test]
    async fn attached_set_forwards_bus_events() {
        let bus = Bus::new(16);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let set = SubscriberSet::attach(vec![Arc::new(Collect(tx))], &bus);

        bus.publish(Event::now(EventKind::RunCompleted));
        bus.publish(Event::subscriber_overflow("other", "full"));
        bus.publish(Event::now(EventKind::AllStopped));

        assert_eq!(rx.recv().await, Some(EventKind::RunCompleted));
        assert_eq!(rx.recv().await, Some(EventKind::AllStopped));
        set.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_delivers_events_still_on_the_bus() {
        let bus = Bus::new(16);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Collect(tx))];
        let set = SubscriberSet::attach(subs, &bus);

        bus.publish(Event::now(EventKind::RoutineStopped));
        bus.publish(Event::now(EventKind::AllStopped));
        set.shutdown().await;

        assert_eq!(rx.try_recv().ok(), Some(EventKind::RoutineStopped));
        assert_eq!(rx.try_recv().ok(), Some(EventKind::AllStopped));
        assert!(rx.try_recv().is_err());
    }
}
