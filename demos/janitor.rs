//! # Example: Janitor
//!
//! Two periodic routines under one monitor:
//! - `janitor` sweeps a fake backlog, asking to be reinvoked while work remains;
//! - `reporter` prints the recorder's view of `janitor` every few seconds.
//!
//! Press Ctrl-C once for a graceful stop, twice to force an exit.
//!
//! ```text
//! RUST_LOG=debug cargo run --example janitor --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use routinevisor::{
    Bus, HandlerError, HandlerFn, LogWriter, Monitor, MonitorConfig, PeriodicRoutine, Recorder,
    RedMetrics, RoutineRef, Subscribe, SubscriberSet, WithErrorMessage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let ctx = CancellationToken::new();
    let bus = Bus::default();
    let recorder = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![recorder.clone(), Arc::new(LogWriter::new())];
    let set = SubscriberSet::attach(subs, &bus);

    let backlog = Arc::new(AtomicUsize::new(0));
    let sweep = HandlerFn::new({
        let backlog = Arc::clone(&backlog);
        move |ctx: CancellationToken| {
            let backlog = Arc::clone(&backlog);
            async move {
                if ctx.is_cancelled() {
                    return Err(HandlerError::Canceled);
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
                match backlog.fetch_add(1, Ordering::SeqCst) % 7 {
                    0 => Err(HandlerError::fail("lock held by another sweeper")),
                    n if n < 4 => Err(HandlerError::ReinvokeImmediately),
                    _ => Ok(()),
                }
            }
        }
    })
    .on_shutdown(|| println!("[janitor] flushed"))
    .into_ref();

    let janitor = PeriodicRoutine::builder(
        &ctx,
        Arc::new(WithErrorMessage::new("sweep failed", sweep)),
    )
    .name("janitor")
    .description("removes stale rows")
    .job_name("maintenance")
    .interval(Duration::from_secs(2))
    .concurrency(2)
    .operation(Arc::new(RedMetrics::new("janitor.sweep")))
    .bus(bus.clone())
    .build();

    let reporter = PeriodicRoutine::builder(
        &ctx,
        HandlerFn::arc({
            let recorder = Arc::clone(&recorder);
            move |_ctx: CancellationToken| {
                let recorder = Arc::clone(&recorder);
                async move {
                    if let Some(h) = recorder.history("janitor").await {
                        let stats = h.stats();
                        println!(
                            "[reporter] janitor: runs={} errors={} avg={:?}",
                            stats.run_count,
                            stats.error_count,
                            stats.avg_duration()
                        );
                    }
                    Ok::<_, HandlerError>(())
                }
            }
        }),
    )
    .name("reporter")
    .interval(Duration::from_secs(5))
    .initial_delay(Duration::from_secs(5))
    .build();

    let routines: Vec<RoutineRef> = vec![Arc::new(janitor), Arc::new(reporter)];
    Monitor::new(MonitorConfig::default())
        .with_bus(bus)
        .run(ctx, routines)
        .await?;

    set.shutdown().await;
    Ok(())
}
