use std::borrow::Cow;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use crate::error::RuntimeError;
use crate::routines::{BackgroundRoutine, RoutineRef};

/// Group of routines exposed as a single routine.
///
/// `start` runs every member concurrently and returns when all of them returned (the first
/// start error, if any, is reported). `stop` stops every member concurrently.
pub struct CombinedRoutine {
    name: Cow<'static, str>,
    routines: Vec<RoutineRef>,
}

impl CombinedRoutine {
    /// Creates a named group.
    pub fn new(name: impl Into<Cow<'static, str>>, routines: Vec<RoutineRef>) -> Self {
        Self {
            name: name.into(),
            routines,
        }
    }

    /// Members of the group.
    pub fn routines(&self) -> &[RoutineRef] {
        &self.routines
    }
}

#[async_trait]
impl BackgroundRoutine for CombinedRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), RuntimeError> {
        debug!(group = %self.name, members = self.routines.len(), "starting combined routine");
        let results = join_all(self.routines.iter().map(|r| r.start())).await;
        results.into_iter().collect::<Result<Vec<()>, _>>().map(|_| ())
    }

    async fn stop(&self) {
        join_all(self.routines.iter().map(|r| r.stop())).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::NoopRoutine;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    struct Blocking {
        stopped: CancellationToken,
        stops: AtomicUsize,
    }

    #[async_trait]
    impl BackgroundRoutine for Blocking {
        fn name(&self) -> &str {
            "blocking"
        }

        async fn start(&self) -> Result<(), RuntimeError> {
            self.stopped.cancelled().await;
            Ok(())
        }

        async fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.stopped.cancel();
        }
    }

    #[tokio::test]
    async fn stops_every_member() {
        let a = Arc::new(Blocking {
            stopped: CancellationToken::new(),
            stops: AtomicUsize::new(0),
        });
        let b = Arc::new(Blocking {
            stopped: CancellationToken::new(),
            stops: AtomicUsize::new(0),
        });
        let members: Vec<RoutineRef> = vec![a.clone(), b.clone(), Arc::new(NoopRoutine::default())];
        let group = Arc::new(CombinedRoutine::new("group", members));

        let running = tokio::spawn({
            let group = group.clone();
            async move { group.start().await }
        });

        group.stop().await;
        running.await.unwrap().unwrap();
        assert_eq!(a.stops.load(Ordering::SeqCst), 1);
        assert_eq!(b.stops.load(Ordering::SeqCst), 1);
        assert_eq!(group.routines().len(), 3);
    }
}
