//! # Bounded: fire-and-collect with a fixed number of slots.
//!
//! ```text
//! go(f1) ─► acquire slot ─► spawn f1 ─┐
//! go(f2) ─► acquire slot ─► spawn f2 ─┼─► first Err kept
//! go(f3) ─► (waits for a free slot)   │
//! wait() ─────────────────────────────┴─► Ok(()) | Err(first)
//! ```
//!
//! [`Bounded::go`] waits for a free slot before spawning, so at most `capacity` futures run
//! at once and the producer is naturally throttled.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// One-shot pool running at most `capacity` futures at a time.
///
/// # Example
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use routinevisor::Bounded;
///
/// let mut pool = Bounded::new(4);
/// for n in 0..10u32 {
///     pool.go(async move {
///         if n == 7 { Err(format!("item {n} failed")) } else { Ok(()) }
///     })
///     .await;
/// }
/// assert_eq!(pool.wait().await, Err("item 7 failed".to_string()));
/// # }
/// ```
pub struct Bounded<E> {
    slots: Arc<Semaphore>,
    tasks: JoinSet<()>,
    first_err: Arc<Mutex<Option<E>>>,
}

impl<E: Send + 'static> Bounded<E> {
    /// Creates a pool with `capacity` slots (at least 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity.max(1))),
            tasks: JoinSet::new(),
            first_err: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits for a free slot, then runs `fut` on its own task.
    pub async fn go<F>(&mut self, fut: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
    {
        // The semaphore is never closed.
        let Ok(permit) = Arc::clone(&self.slots).acquire_owned().await else {
            return;
        };
        let first_err = Arc::clone(&self.first_err);

        self.tasks.spawn(async move {
            let _permit = permit;
            if let Err(err) = fut.await {
                let mut slot = first_err.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.is_none() {
                    *slot = Some(err);
                }
            }
        });
    }

    /// Waits for every spawned future and returns the first error observed.
    ///
    /// A panic in one of the futures is re-raised here.
    pub async fn wait(mut self) -> Result<(), E> {
        while let Some(res) = self.tasks.join_next().await {
            if let Err(err) = res {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }

        let first = self
            .first_err
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
