use std::future::Future;

use tokio::task::JoinSet;

/// Runs `n` copies of `worker` concurrently (at least one) and waits for all of them.
///
/// Each copy receives its index. A panicking worker is re-raised here after the others
/// finished.
pub async fn run_workers<F, Fut>(n: usize, worker: F)
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut set = JoinSet::new();
    for id in 0..n.max(1) {
        set.spawn(worker(id));
    }

    let mut panic = None;
    while let Some(res) = set.join_next().await {
        if let Err(err) = res {
            if err.is_panic() && panic.is_none() {
                panic = Some(err.into_panic());
            }
        }
    }
    if let Some(payload) = panic {
        std::panic::resume_unwind(payload);
    }
}
