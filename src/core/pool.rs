//! Worker pool controller of a periodic routine.
//!
//! Runs `concurrency()` workers under a pool-scoped token, re-reads the provider every
//! recheck interval, and rebuilds the pool when the value changed. The old pool is fully
//! drained before the new one is spawned.

use std::panic::resume_unwind;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::core::periodic::Inner;
use crate::core::worker;
use crate::events::{Event, EventKind};

/// Runs worker pools until the routine's root token is cancelled.
pub(crate) async fn run(inner: Arc<Inner>) {
    let mut concurrency = inner.desired_concurrency();

    loop {
        let pool_token = inner.token.child_token();
        let mut workers = JoinSet::new();
        for id in 0..concurrency {
            workers.spawn(worker::run(Arc::clone(&inner), pool_token.clone(), id));
        }
        debug!(routine = %inner.name, concurrency, "worker pool started");

        let resized = watch(&inner, &mut workers, concurrency).await;
        pool_token.cancel();
        drain(&mut workers).await;

        match resized {
            Some(next) => {
                info!(
                    routine = %inner.name,
                    from = concurrency,
                    to = next,
                    "concurrency changed, restarting worker pool"
                );
                inner.publish(Event::now(EventKind::ConcurrencyChanged).with_concurrency(next));
                concurrency = next;
            }
            None => {
                debug!(routine = %inner.name, "worker pool drained");
                return;
            }
        }
    }
}

/// Waits for shutdown (`None`) or a concurrency change (`Some(new)`).
///
/// A worker panic is re-raised here as soon as it is observed.
async fn watch(inner: &Inner, workers: &mut JoinSet<()>, current: usize) -> Option<usize> {
    loop {
        tokio::select! {
            biased;
            _ = inner.token.cancelled() => return None,
            Some(Err(err)) = workers.join_next() => {
                if err.is_panic() {
                    resume_unwind(err.into_panic());
                }
            }
            _ = inner.concurrency_clock.sleep(inner.recheck_interval) => {
                let desired = inner.desired_concurrency();
                if desired != current {
                    return Some(desired);
                }
            }
        }
    }
}

/// Joins every worker of a cancelled pool.
async fn drain(workers: &mut JoinSet<()>) {
    while let Some(res) = workers.join_next().await {
        if let Err(err) = res {
            if err.is_panic() {
                resume_unwind(err.into_panic());
            }
        }
    }
}
