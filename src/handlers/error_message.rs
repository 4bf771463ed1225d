use std::borrow::Cow;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::error::HandlerError;
use crate::handlers::{Handler, HandlerRef};

/// Logs every business error of the wrapped handler under a fixed message.
///
/// Errors are still forwarded to the inner handler's [`Handler::handle_error`], and
/// [`Handler::on_shutdown`] is passed through untouched.
pub struct WithErrorMessage {
    message: Cow<'static, str>,
    inner: HandlerRef,
}

impl WithErrorMessage {
    /// Wraps `inner`, logging its errors as `message`.
    pub fn new(message: impl Into<Cow<'static, str>>, inner: HandlerRef) -> Self {
        Self {
            message: message.into(),
            inner,
        }
    }
}

#[async_trait]
impl Handler for WithErrorMessage {
    async fn handle(&self, ctx: CancellationToken) -> Result<(), HandlerError> {
        self.inner.handle(ctx).await
    }

    fn handle_error(&self, err: &HandlerError) {
        error!(error = %err, label = err.as_label(), "{}", self.message);
        self.inner.handle_error(err);
    }

    fn on_shutdown(&self) {
        self.inner.on_shutdown();
    }
}
