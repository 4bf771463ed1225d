//! # Handlers: the unit of work a periodic routine invokes.
//!
//! - [`Handler`] async trait with optional `handle_error` / `on_shutdown` capabilities
//! - [`HandlerFn`] closure-backed handler
//! - [`HandlerRef`] shared handle (`Arc<dyn Handler>`)
//! - [`WithErrorMessage`] wrapper that logs business errors

mod error_message;
mod handler;
mod handler_fn;

pub use error_message::WithErrorMessage;
pub use handler::{Handler, HandlerRef};
pub use handler_fn::HandlerFn;
