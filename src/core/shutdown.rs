//! # Cross-platform termination signal handling.
//!
//! **Unix platforms:** `SIGHUP`, `SIGINT` (Ctrl-C in terminal), `SIGTERM` (default kill
//! signal, used by systemd/Kubernetes).
//!
//! **Other platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].
//!
//! [`listen`] keeps the listeners registered for the lifetime of the returned channel, so the
//! lifecycle monitor can tell a first signal (graceful stop) from a second one (forced exit).

use std::fmt;
use std::io;

use tokio::sync::mpsc;

/// Termination signal received by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownSignal {
    /// `SIGHUP`.
    Hangup,
    /// `SIGINT` or Ctrl-C.
    Interrupt,
    /// `SIGTERM`.
    Terminate,
}

impl ShutdownSignal {
    /// Conventional signal name.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownSignal::Hangup => "SIGHUP",
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
        }
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Registers signal listeners and forwards every received signal to the returned channel.
///
/// The forwarding task ends when the receiver is dropped.
#[cfg(unix)]
pub(crate) fn listen() -> io::Result<mpsc::Receiver<ShutdownSignal>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let (tx, rx) = mpsc::channel(4);
    tokio::spawn(async move {
        loop {
            let sig = tokio::select! {
                Some(()) = sighup.recv() => ShutdownSignal::Hangup,
                Some(()) = sigint.recv() => ShutdownSignal::Interrupt,
                Some(()) = sigterm.recv() => ShutdownSignal::Terminate,
                _ = tx.closed() => return,
                else => return,
            };
            if tx.send(sig).await.is_err() {
                return;
            }
        }
    });
    Ok(rx)
}

/// Registers a Ctrl-C listener and forwards every press to the returned channel.
#[cfg(not(unix))]
pub(crate) fn listen() -> io::Result<mpsc::Receiver<ShutdownSignal>> {
    let (tx, rx) = mpsc::channel(4);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if res.is_err() || tx.send(ShutdownSignal::Interrupt).await.is_err() {
                        return;
                    }
                }
                _ = tx.closed() => return,
            }
        }
    });
    Ok(rx)
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns the received signal, or `Err` if signal registration fails.
pub async fn wait_for_shutdown_signal() -> io::Result<ShutdownSignal> {
    let mut rx = listen()?;
    rx.recv()
        .await
        .ok_or_else(|| io::Error::other("signal listener stopped"))
}
