//! # Monitor: runs a set of background routines and stops them gracefully.
//!
//! ```text
//! Monitor::run(ctx, routines)
//!   ├─► spawn routine.start() for each routine          (JoinSet, errors logged)
//!   ├─► wait: ctx cancelled  OR  first termination signal
//!   │          └─ count signals: the second one overall ─► error! + forced exit(exit_code)
//!   ├─► publish ShutdownRequested
//!   ├─► stop() every routine concurrently
//!   │          └─ grace elapsed? warn! with the routines still stopping, keep waiting
//!   ├─► join the start tasks (panics logged)
//!   └─► publish AllStopped, return
//! ```
//!
//! The grace period is advisory: routines that are still draining are waited for, never
//! abandoned. A second signal is the operator's escape hatch.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::config::MonitorConfig;
use crate::core::shutdown::{self, ShutdownSignal};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::pool::panic_message;
use crate::routines::RoutineRef;

/// Starts routines and coordinates their graceful shutdown.
#[derive(Clone, Debug, Default)]
pub struct Monitor {
    cfg: MonitorConfig,
    bus: Option<Bus>,
}

impl Monitor {
    /// Creates a monitor with the given configuration and no event bus.
    pub fn new(cfg: MonitorConfig) -> Self {
        Self { cfg, bus: None }
    }

    /// Publishes shutdown progress to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Runs `routines` until `ctx` is cancelled or the process receives a termination
    /// signal, then stops all of them and waits for every one to finish.
    ///
    /// Once two termination signals have been received in total, the process exits with
    /// [`MonitorConfig::exit_code`] without waiting for the drain.
    pub async fn run(
        &self,
        ctx: CancellationToken,
        routines: Vec<RoutineRef>,
    ) -> Result<(), RuntimeError> {
        let signals = shutdown::listen()?;
        let code = self.cfg.exit_code;
        self.run_with_signals(ctx, signals, routines, move || std::process::exit(code))
            .await;
        Ok(())
    }

    pub(crate) async fn run_with_signals<F>(
        &self,
        ctx: CancellationToken,
        mut signals: mpsc::Receiver<ShutdownSignal>,
        routines: Vec<RoutineRef>,
        force_exit: F,
    ) where
        F: FnOnce() + Send + 'static,
    {
        let mut running = JoinSet::new();
        for routine in &routines {
            let routine = Arc::clone(routine);
            running.spawn(async move {
                if let Err(err) = routine.start().await {
                    warn!(routine = routine.name(), error = %err, "routine failed to start");
                }
            });
        }
        info!(routines = routines.len(), "background routines started");

        let (trigger, mut received) = tokio::select! {
            _ = ctx.cancelled() => ("context cancelled".to_string(), 0),
            Some(sig) = signals.recv() => (format!("received {sig}"), 1),
        };

        let watcher = tokio::spawn(async move {
            while let Some(sig) = signals.recv().await {
                received += 1;
                if received >= 2 {
                    error!(signal = %sig, "second signal received, forcing exit");
                    force_exit();
                    return;
                }
                warn!(signal = %sig, "signal received, send another one to force exit");
            }
        });

        info!(trigger = %trigger, "stopping background routines");
        self.publish(Event::now(EventKind::ShutdownRequested).with_error(trigger));

        self.stop_all(&routines).await;

        while let Some(res) = running.join_next().await {
            if let Err(err) = res {
                if err.is_panic() {
                    error!(panic = %panic_message(&*err.into_panic()), "routine panicked");
                }
            }
        }
        watcher.abort();

        info!("all background routines stopped");
        self.publish(Event::now(EventKind::AllStopped));
    }

    /// Stops every routine concurrently and warns once if the grace period runs out.
    async fn stop_all(&self, routines: &[RoutineRef]) {
        let mut pending: BTreeSet<usize> = (0..routines.len()).collect();
        let mut stopping: FuturesUnordered<_> = routines
            .iter()
            .enumerate()
            .map(|(idx, routine)| async move {
                routine.stop().await;
                idx
            })
            .collect();

        let grace = async {
            match self.cfg.grace_warning() {
                Some(grace) => tokio::time::sleep(grace).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(grace);
        let mut warned = false;

        loop {
            tokio::select! {
                next = stopping.next() => match next {
                    Some(idx) => {
                        pending.remove(&idx);
                    }
                    None => return,
                },
                _ = &mut grace, if !warned => {
                    warned = true;
                    let stuck = pending
                        .iter()
                        .map(|&idx| routines[idx].name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    warn!(
                        grace = ?self.cfg.grace,
                        stuck = %stuck,
                        "graceful shutdown is taking longer than expected"
                    );
                    self.publish(
                        Event::now(EventKind::GraceExceeded)
                            .with_delay(self.cfg.grace)
                            .with_error(stuck),
                    );
                }
            }
        }
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev);
        }
    }
}

/// Runs `routines` with the default [`Monitor`] until `ctx` is cancelled or a termination
/// signal arrives.
pub async fn monitor_background_routines(
    ctx: CancellationToken,
    routines: Vec<RoutineRef>,
) -> Result<(), RuntimeError> {
    Monitor::default().run(ctx, routines).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::routines::BackgroundRoutine;

    /// Runs until stopped; `stop` waits for `release` when `stubborn` is set.
    struct Probe {
        name: &'static str,
        token: CancellationToken,
        stubborn: bool,
        release: Arc<Notify>,
        stops: AtomicUsize,
    }

    impl Probe {
        fn arc(name: &'static str, stubborn: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                token: CancellationToken::new(),
                stubborn,
                release: Arc::new(Notify::new()),
                stops: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl BackgroundRoutine for Probe {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self) -> Result<(), RuntimeError> {
            self.token.cancelled().await;
            Ok(())
        }

        async fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            if self.stubborn {
                self.release.notified().await;
            }
            self.token.cancel();
        }
    }

    fn monitor() -> Monitor {
        Monitor::new(MonitorConfig {
            grace: Duration::from_millis(50),
            exit_code: 3,
        })
    }

    #[tokio::test]
    async fn stops_all_routines_when_context_is_cancelled() {
        let a = Probe::arc("a", false);
        let b = Probe::arc("b", false);
        let routines: Vec<RoutineRef> = vec![a.clone(), b.clone()];
        let ctx = CancellationToken::new();
        let (_tx, rx) = mpsc::channel(1);

        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let m = monitor().with_bus(bus);
        let run = tokio::spawn({
            let ctx = ctx.clone();
            async move { m.run_with_signals(ctx, rx, routines, || {}).await }
        });

        ctx.cancel();
        tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .expect("monitor should return")
            .unwrap();

        assert_eq!(a.stops.load(Ordering::SeqCst), 1);
        assert_eq!(b.stops.load(Ordering::SeqCst), 1);
        assert_eq!(events.recv().await.unwrap().kind, EventKind::ShutdownRequested);
        assert_eq!(events.recv().await.unwrap().kind, EventKind::AllStopped);
    }

    #[tokio::test]
    async fn first_signal_triggers_graceful_stop() {
        let a = Probe::arc("a", false);
        let (tx, rx) = mpsc::channel(1);
        let forced = Arc::new(AtomicBool::new(false));

        let run = tokio::spawn({
            let routines: Vec<RoutineRef> = vec![a.clone()];
            let forced = Arc::clone(&forced);
            async move {
                monitor()
                    .run_with_signals(CancellationToken::new(), rx, routines, move || {
                        forced.store(true, Ordering::SeqCst)
                    })
                    .await
            }
        });

        tx.send(ShutdownSignal::Terminate).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .expect("monitor should return")
            .unwrap();

        assert_eq!(a.stops.load(Ordering::SeqCst), 1);
        assert!(!forced.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn second_signal_forces_exit_and_grace_only_warns() {
        let slow = Probe::arc("slow", true);
        let (tx, rx) = mpsc::channel(1);
        let (forced_tx, forced_rx) = tokio::sync::oneshot::channel::<()>();

        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let m = monitor().with_bus(bus);
        let run = tokio::spawn({
            let routines: Vec<RoutineRef> = vec![slow.clone()];
            async move {
                m.run_with_signals(CancellationToken::new(), rx, routines, move || {
                    let _ = forced_tx.send(());
                })
                .await
            }
        });

        tx.send(ShutdownSignal::Interrupt).await.unwrap();
        assert_eq!(events.recv().await.unwrap().kind, EventKind::ShutdownRequested);

        // Grace (50ms) elapses while the routine is still stopping.
        let exceeded = events.recv().await.unwrap();
        assert_eq!(exceeded.kind, EventKind::GraceExceeded);
        assert_eq!(exceeded.error.as_deref(), Some("slow"));
        assert!(!run.is_finished());

        tx.send(ShutdownSignal::Interrupt).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), forced_rx)
            .await
            .expect("second signal should force exit")
            .unwrap();

        slow.release.notify_one();
        tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .expect("monitor should return once released")
            .unwrap();
        assert_eq!(events.recv().await.unwrap().kind, EventKind::AllStopped);
    }

    #[tokio::test]
    async fn returns_when_context_is_already_cancelled() {
        let routine = crate::routines::NoopRoutine::new("noop");
        let routines: Vec<RoutineRef> = vec![Arc::new(routine)];
        let ctx = CancellationToken::new();
        ctx.cancel();
        let (_tx, rx) = mpsc::channel(1);
        monitor().run_with_signals(ctx, rx, routines, || {}).await;
    }

    #[tokio::test]
    async fn context_shutdown_needs_two_signals_to_force_exit() {
        let slow = Probe::arc("slow", true);
        let ctx = CancellationToken::new();
        let (tx, rx) = mpsc::channel(1);
        let forced = Arc::new(AtomicUsize::new(0));

        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let m = monitor().with_bus(bus);
        let run = tokio::spawn({
            let ctx = ctx.clone();
            let routines: Vec<RoutineRef> = vec![slow.clone()];
            let forced = Arc::clone(&forced);
            async move {
                m.run_with_signals(ctx, rx, routines, move || {
                    forced.fetch_add(1, Ordering::SeqCst);
                })
                .await
            }
        });

        ctx.cancel();
        assert_eq!(events.recv().await.unwrap().kind, EventKind::ShutdownRequested);

        tx.send(ShutdownSignal::Terminate).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(forced.load(Ordering::SeqCst), 0);

        tx.send(ShutdownSignal::Terminate).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while forced.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("second signal should force exit");

        slow.release.notify_one();
        tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .expect("monitor should return once released")
            .unwrap();
        assert_eq!(forced.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn grace_warning_tracks_routines_sharing_a_name() {
        let quick = Probe::arc("worker", false);
        let slow = Probe::arc("worker", true);
        let ctx = CancellationToken::new();
        let (_tx, rx) = mpsc::channel(1);

        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let m = monitor().with_bus(bus);
        let run = tokio::spawn({
            let ctx = ctx.clone();
            let routines: Vec<RoutineRef> = vec![quick.clone(), slow.clone()];
            async move { m.run_with_signals(ctx, rx, routines, || {}).await }
        });

        ctx.cancel();
        assert_eq!(events.recv().await.unwrap().kind, EventKind::ShutdownRequested);
        let exceeded = events.recv().await.unwrap();
        assert_eq!(exceeded.kind, EventKind::GraceExceeded);
        assert_eq!(exceeded.error.as_deref(), Some("worker"));

        slow.release.notify_one();
        tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .expect("monitor should return once released")
            .unwrap();
        assert_eq!(quick.stops.load(Ordering::SeqCst), 1);
        assert_eq!(slow.stops.load(Ordering::SeqCst), 1);
    }
}
