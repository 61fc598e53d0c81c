//! Graceful shutdown on SIGINT and SIGTERM.
//!
//! Signals never touch the connection themselves. They flip a
//! [`watch`] channel that the roaming loop checks between operations; the
//! loop then tears the link down on its own task and returns.

use log::{debug, info, warn};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Result;
use crate::api::models::RoamError;

/// Requests shutdown of a roaming loop.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    tx: watch::Sender<bool>,
}

/// Loop-side view of a shutdown request.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownHandler {
    /// Creates a handler and the signal it controls.
    pub fn new() -> (Self, ShutdownSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, ShutdownSignal { rx })
    }

    /// Requests shutdown. Repeated requests are harmless.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Installs SIGINT and SIGTERM handlers that request shutdown.
    ///
    /// Both handlers are registered before this returns, so a signal that
    /// arrives right after startup is not lost. The handlers stay installed
    /// for the life of the process: later signals only log that the
    /// teardown is still running. Use SIGKILL to stop a hung teardown.
    pub fn listen_for_signals(self) -> Result<JoinHandle<()>> {
        let mut interrupt = signal(SignalKind::interrupt()).map_err(RoamError::Signal)?;
        let mut terminate = signal(SignalKind::terminate()).map_err(RoamError::Signal)?;
        debug!("Installed SIGINT and SIGTERM handlers");

        Ok(tokio::spawn(async move {
            loop {
                let name = tokio::select! {
                    Some(()) = interrupt.recv() => "SIGINT",
                    Some(()) = terminate.recv() => "SIGTERM",
                    else => break,
                };

                if *self.tx.borrow() {
                    warn!("Received {name} again, teardown already in progress");
                } else {
                    info!("Received {name}, shutting down");
                    self.trigger();
                }
            }
        }))
    }
}

impl ShutdownSignal {
    /// Returns true once shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested.
    ///
    /// Never resolves if every [`ShutdownHandler`] is dropped without
    /// triggering.
    pub async fn requested(&mut self) {
        if self.rx.wait_for(|requested| *requested).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_is_observed() {
        let (handler, mut signal) = ShutdownHandler::new();
        assert!(!signal.is_requested());

        handler.trigger();
        signal.requested().await;
        assert!(signal.is_requested());
    }

    #[tokio::test]
    async fn clones_share_the_request() {
        let (handler, signal) = ShutdownHandler::new();
        let other = signal.clone();

        handler.clone().trigger();
        assert!(signal.is_requested());
        assert!(other.is_requested());
    }

    fn send_sigterm() {
        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn repeated_signals_keep_the_listener_alive() {
        let (handler, mut signal) = ShutdownHandler::new();
        let listener = handler.listen_for_signals().unwrap();

        send_sigterm();
        tokio::time::timeout(Duration::from_secs(5), signal.requested())
            .await
            .unwrap();

        send_sigterm();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!listener.is_finished());
        assert!(signal.is_requested());

        listener.abort();
    }
}
