//! # Closure-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps `F: Fn(CancellationToken) -> Fut` and creates a fresh future per
//! invocation. Optional capabilities are supplied up front as callbacks instead of being
//! discovered at runtime.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use routinevisor::{HandlerError, HandlerFn, HandlerRef};
//!
//! let h: HandlerRef = HandlerFn::new(|_ctx: CancellationToken| async {
//!     Ok::<_, HandlerError>(())
//! })
//! .on_error(|err| eprintln!("tick failed: {err}"))
//! .on_shutdown(|| eprintln!("bye"))
//! .into_ref();
//! # let _ = h;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::handlers::{Handler, HandlerRef};

type ErrorCallback = Box<dyn Fn(&HandlerError) + Send + Sync>;
type ShutdownCallback = Box<dyn Fn() + Send + Sync>;

/// Function-backed handler.
pub struct HandlerFn<F> {
    f: F,
    on_error: Option<ErrorCallback>,
    on_shutdown: Option<ShutdownCallback>,
}

impl<F, Fut> HandlerFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    /// Creates a handler with no error or shutdown callbacks.
    pub fn new(f: F) -> Self {
        Self {
            f,
            on_error: None,
            on_shutdown: None,
        }
    }

    /// Creates the handler and returns it as a [`HandlerRef`].
    pub fn arc(f: F) -> HandlerRef {
        Arc::new(Self::new(f))
    }

    /// Sets the callback invoked with business errors.
    pub fn on_error(mut self, cb: impl Fn(&HandlerError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Sets the callback invoked once at shutdown.
    pub fn on_shutdown(mut self, cb: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_shutdown = Some(Box::new(cb));
        self
    }

    /// Converts into a shared [`HandlerRef`].
    pub fn into_ref(self) -> HandlerRef {
        Arc::new(self)
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, ctx: CancellationToken) -> Result<(), HandlerError> {
        (self.f)(ctx).await
    }

    fn handle_error(&self, err: &HandlerError) {
        if let Some(cb) = &self.on_error {
            cb(err);
        }
    }

    fn on_shutdown(&self) {
        if let Some(cb) = &self.on_shutdown {
            cb();
        }
    }
}
