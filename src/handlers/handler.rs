//! # Handler contract.
//!
//! A [`Handler`] runs one invocation per call to [`Handler::handle`]. The two extra
//! capabilities are plain trait methods with no-op defaults, so implementors opt in by
//! overriding them:
//!
//! - [`Handler::handle_error`] reacts to a business error without stopping the loop;
//! - [`Handler::on_shutdown`] runs exactly once after the last invocation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;

/// # Periodic unit of work.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use routinevisor::{Handler, HandlerError};
///
/// struct Drain;
///
/// #[async_trait]
/// impl Handler for Drain {
///     async fn handle(&self, ctx: CancellationToken) -> Result<(), HandlerError> {
///         if ctx.is_cancelled() {
///             return Err(HandlerError::Canceled);
///         }
///         // pop one item; ask to be called again right away while the queue is non-empty
///         Err(HandlerError::ReinvokeImmediately)
///     }
///
///     fn handle_error(&self, err: &HandlerError) {
///         eprintln!("drain failed: {err}");
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Runs one invocation.
    ///
    /// `ctx` is cancelled when the routine stops or its worker pool is resized. Long-running
    /// handlers should watch it and return [`HandlerError::Canceled`].
    async fn handle(&self, ctx: CancellationToken) -> Result<(), HandlerError>;

    /// Called with every [`HandlerError::Fail`] (and with `Canceled` returned while the token
    /// was still live). Never called for shutdown or reinvoke results.
    fn handle_error(&self, _err: &HandlerError) {}

    /// Called exactly once when the routine stops, after the final invocation returned.
    fn on_shutdown(&self) {}
}

/// Shared handler handle.
pub type HandlerRef = Arc<dyn Handler>;
