//! # Pool worker: invoke, pick the next delay, sleep, repeat.
//!
//! ```text
//! initial delay (cancellable, skipped when zero)
//! loop {
//!   ├─► invoke handler with a child token
//!   │     ├─ Ok                       → Done
//!   │     ├─ ReinvokeImmediately      → Reinvoke
//!   │     ├─ Canceled + token cancelled → Shutdown ─► exit
//!   │     └─ anything else            → handle_error(), Done
//!   ├─► observe (operation) + publish RunCompleted / RunFailed
//!   ├─► next_delay(): 0 while under the reinvocation cap, else interval()
//!   └─► sleep(delay) racing the pool token ─► exit on cancel
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span};

use crate::core::periodic::Inner;
use crate::error::HandlerError;
use crate::events::{Event, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Done,
    Reinvoke,
    Shutdown,
}

/// Runs one worker until `token` is cancelled.
pub(crate) async fn run(inner: Arc<Inner>, token: CancellationToken, worker: usize) {
    if !inner.initial_delay.is_zero() && !pause(&inner, inner.initial_delay, &token).await {
        return;
    }

    loop {
        let outcome = invoke(&inner, &token, worker).await;
        if outcome == Outcome::Shutdown {
            debug!(routine = %inner.name, worker, "worker observed shutdown");
            return;
        }

        let next = inner.next_delay(outcome == Outcome::Reinvoke);
        if next.capped {
            debug!(
                routine = %inner.name,
                worker,
                max = inner.max_reinvocations,
                "reinvocation cap reached, sleeping a full interval"
            );
            inner.publish(
                Event::now(EventKind::ReinvocationCapped)
                    .with_worker(worker)
                    .with_delay(next.delay),
            );
        }
        if !pause(&inner, next.delay, &token).await {
            return;
        }
    }
}

/// Sleeps on the routine clock. Returns `false` if the token was cancelled first.
async fn pause(inner: &Inner, delay: Duration, token: &CancellationToken) -> bool {
    if delay.is_zero() {
        tokio::task::yield_now().await;
        return !token.is_cancelled();
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = inner.clock.sleep(delay) => true,
    }
}

/// Runs the handler once and reports the run.
async fn invoke(inner: &Inner, token: &CancellationToken, worker: usize) -> Outcome {
    let started_at = inner.clock.now();
    let span = info_span!(
        "periodic_routine.run",
        routine = %inner.name,
        worker,
        operation = ?inner.operation.as_ref().map(|op| op.name()),
    );

    let res = inner
        .handler
        .handle(token.child_token())
        .instrument(span)
        .await;
    let elapsed = (inner.clock.now() - started_at)
        .to_std()
        .unwrap_or_default();

    let (outcome, failure) = match res {
        Ok(()) => (Outcome::Done, None),
        Err(HandlerError::ReinvokeImmediately) => (Outcome::Reinvoke, None),
        Err(HandlerError::Canceled) if token.is_cancelled() => (Outcome::Shutdown, None),
        Err(err) => (Outcome::Done, Some(err)),
    };

    if let Some(op) = &inner.operation {
        op.observe(elapsed, failure.as_ref());
    }

    let ev = match failure {
        Some(err) => {
            debug!(routine = %inner.name, worker, error = %err, "handler invocation failed");
            inner.handler.handle_error(&err);
            Event::now(EventKind::RunFailed).with_error(err.to_string())
        }
        None => Event::now(EventKind::RunCompleted),
    };
    inner.publish(ev.at(started_at).with_worker(worker).with_duration(elapsed));

    outcome
}
