use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RuntimeError;

/// Start/stop lifecycle shared by every routine.
#[async_trait]
pub trait BackgroundRoutine: Send + Sync + 'static {
    /// Returns a stable, human-readable routine name.
    fn name(&self) -> &str;

    /// Runs the routine. Blocks until the routine has been stopped.
    ///
    /// Callers run this in its own task.
    async fn start(&self) -> Result<(), RuntimeError>;

    /// Signals the routine to stop and waits until it has fully drained.
    ///
    /// Safe to call more than once, and before `start`.
    async fn stop(&self);
}

/// Shared routine handle.
pub type RoutineRef = Arc<dyn BackgroundRoutine>;

/// Routine whose `start` and `stop` return immediately.
#[derive(Clone, Debug)]
pub struct NoopRoutine {
    name: Cow<'static, str>,
}

impl NoopRoutine {
    /// Creates a named no-op routine.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for NoopRoutine {
    fn default() -> Self {
        Self::new("noop")
    }
}

#[async_trait]
impl BackgroundRoutine for NoopRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn stop(&self) {}
}
