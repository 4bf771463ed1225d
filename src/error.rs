//! Error types used by periodic routines, their handlers and the lifecycle monitor.
//!
//! - [`HandlerError`] what a [`Handler`](crate::Handler) invocation can return.
//! - [`RuntimeError`] misuse of a routine lifecycle or failures of the monitor itself.
//!
//! Both types provide `as_label` / `as_message` helpers for logs and metrics.

use thiserror::Error;

/// # Result of a single handler invocation.
///
/// The engine classifies every non-`Ok` result before deciding what to do next:
///
/// | Variant               | Scheduling                         | `handle_error` called |
/// |-----------------------|------------------------------------|-----------------------|
/// | `Fail`                | sleep for the regular interval     | yes                   |
/// | `ReinvokeImmediately` | no sleep (capped, see below)       | no                    |
/// | `Canceled`            | worker exits (if token cancelled)  | no                    |
///
/// Consecutive `ReinvokeImmediately` results are capped by
/// [`MAX_CONSECUTIVE_REINVOCATIONS`](crate::MAX_CONSECUTIVE_REINVOCATIONS); once the cap is hit the
/// routine sleeps for a full interval anyway.
///
/// `Canceled` only means "shutdown" when the token handed to the invocation was actually
/// cancelled. A handler returning `Canceled` on its own is treated like `Fail`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The invocation failed; the routine retries after the regular interval.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The handler has more work queued and wants to be invoked again without sleeping.
    #[error("reinvoke immediately")]
    ReinvokeImmediately,

    /// The invocation observed its cancellation token.
    #[error("context cancelled")]
    Canceled,
}

impl HandlerError {
    /// Builds a [`HandlerError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use routinevisor::HandlerError;
    ///
    /// let err = HandlerError::fail("disk full");
    /// assert_eq!(err.to_string(), "execution failed: disk full");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        HandlerError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::ReinvokeImmediately => "handler_reinvoke",
            HandlerError::Canceled => "handler_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error } => format!("error: {error}"),
            HandlerError::ReinvokeImmediately => "reinvoke requested".to_string(),
            HandlerError::Canceled => "context cancelled".to_string(),
        }
    }

    /// True for the reinvoke-immediately sentinel.
    pub fn is_reinvoke(&self) -> bool {
        matches!(self, HandlerError::ReinvokeImmediately)
    }
}

/// # Errors produced by routine lifecycles and the monitor.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `start` was called on a routine that is already running or has run.
    #[error("routine {routine:?} was already started")]
    AlreadyStarted {
        /// Name of the routine.
        routine: String,
    },

    /// `start` was called on a routine that was stopped before it ever started.
    #[error("routine {routine:?} was stopped before it started")]
    AlreadyStopped {
        /// Name of the routine.
        routine: String,
    },

    /// Installing the OS signal handlers failed.
    #[error("failed to register shutdown signal handlers: {source}")]
    SignalRegistration {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use routinevisor::RuntimeError;
    ///
    /// let err = RuntimeError::AlreadyStarted { routine: "janitor".into() };
    /// assert_eq!(err.as_label(), "runtime_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted { .. } => "runtime_already_started",
            RuntimeError::AlreadyStopped { .. } => "runtime_already_stopped",
            RuntimeError::SignalRegistration { .. } => "runtime_signal_registration",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::AlreadyStarted { routine } => format!("already started: {routine}"),
            RuntimeError::AlreadyStopped { routine } => format!("already stopped: {routine}"),
            RuntimeError::SignalRegistration { source } => format!("signal registration: {source}"),
        }
    }
}
