//! Error types for the dispatch loop.

use std::io;

use thiserror::Error;

/// Errors that end or disrupt request dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Writing a response to the client failed.
    #[error("failed to write response: {0}")]
    Io(#[from] io::Error),
    /// The action worker thread could not be started.
    #[error("failed to spawn action worker for message {message_id}: {source}")]
    WorkerSpawn {
        /// Request being handled.
        message_id: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl DispatchError {
    /// Returns true when the error means the client can no longer be reached.
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
