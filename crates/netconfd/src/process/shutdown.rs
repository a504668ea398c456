//! Shutdown notification: termination signals or `EXIT` on the console.

use std::io::{self, BufRead};
use std::thread;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Console line that stops the server.
pub const EXIT_COMMAND: &str = "EXIT";

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the notification source cannot be set
    /// up.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The console watcher thread could not be started.
    #[error("failed to spawn console watcher: {source}")]
    Console {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Waits for SIGTERM, SIGINT, SIGQUIT, SIGHUP or an `EXIT` line on stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        let handle = signals.handle();
        thread::Builder::new()
            .name(String::from("netconf-console"))
            .spawn(move || {
                if wait_for_exit_command(io::stdin().lock()) {
                    info!(target: PROCESS_TARGET, "exit requested on console");
                    handle.close();
                }
            })
            .map_err(|source| ShutdownError::Console { source })?;

        if let Some(signal) = signals.forever().next() {
            info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        }
        Ok(())
    }
}

/// Reads lines until one equals [`EXIT_COMMAND`]; false at end of input.
pub(crate) fn wait_for_exit_command(input: impl BufRead) -> bool {
    input
        .lines()
        .map_while(Result::ok)
        .any(|line| line.trim() == EXIT_COMMAND)
}
