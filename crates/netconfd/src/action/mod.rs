//! Pluggable computation of RPC responses.
//!
//! The dispatcher hands every RPC other than `get-schema` to an
//! [`ActionExecutor`]. Two executors ship with the daemon: the
//! [`TemplateActionExecutor`] serving canned replies from the template tree
//! and the [`ScriptActionExecutor`] running a per-operation shell script.

mod script;
mod template;

use std::io;
use std::string::FromUtf8Error;
use std::time::Duration;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::message::RpcRequest;
use crate::reset_map::ResetMap;
use crate::session::CancellationToken;
use crate::templates::TemplateError;

pub use script::{RESPONSE_SCRIPT, ScriptActionExecutor};
pub use template::{RESPONSE_TEMPLATE, TemplateActionExecutor, builtin_response};

/// Tracing target for action execution.
pub(crate) const ACTION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::action");

/// Response text that tells the dispatcher to stay silent.
pub const IGNORE_SENTINEL: &str = "ignore";

/// Inputs handed to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// Message identifier of the request.
    pub message_id: String,
    /// Operation local name.
    pub operation: String,
    /// Datastore named by the request, `NA` when absent.
    pub datastore: String,
    /// Target the request names, if any.
    pub target_name: Option<String>,
    /// Re-serialised operation subtree.
    pub raw_content: String,
    /// Delay to apply before emitting events.
    pub event_delay: Duration,
}

impl ActionRequest {
    /// Builds the action inputs for `request`.
    #[must_use]
    pub fn from_rpc(request: &RpcRequest, event_delay: Duration) -> Self {
        Self {
            message_id: request.message_id.clone(),
            operation: request.operation.clone(),
            datastore: request.datastore.clone(),
            target_name: request.target_name.clone(),
            raw_content: request.raw_content.clone(),
            event_delay,
        }
    }
}

/// What an action decided to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Send this text, after placeholder substitution.
    Respond(String),
    /// Send nothing.
    Ignore,
}

impl ActionOutcome {
    /// Interprets action output, honouring the `ignore` sentinel.
    #[must_use]
    pub fn from_text(text: String) -> Self {
        if text.trim() == IGNORE_SENTINEL {
            Self::Ignore
        } else {
            Self::Respond(text)
        }
    }
}

/// Errors raised by action executors.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Nothing knows how to answer the operation.
    #[error("no handler for operation {operation} on datastore {datastore}")]
    NoHandler {
        /// Operation name.
        operation: String,
        /// Datastore name.
        datastore: String,
    },
    /// Reading a template failed.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// The action script could not be started.
    #[error("failed to spawn action script {path}: {source}")]
    Spawn {
        /// Script path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Communicating with the action script failed.
    #[error("I/O error while running action script {path}: {source}")]
    Io {
        /// Script path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The script ran past its deadline and was killed.
    #[error("action script {path} timed out after {timeout:?}")]
    Timeout {
        /// Script path.
        path: Utf8PathBuf,
        /// Configured timeout.
        timeout: Duration,
    },
    /// The script exited unsuccessfully.
    #[error("action script {path} exited with status {status}")]
    NonZeroExit {
        /// Script path.
        path: Utf8PathBuf,
        /// Exit code, `-1` when killed by a signal.
        status: i32,
    },
    /// The script wrote something other than UTF-8.
    #[error("action script {path} produced invalid UTF-8: {source}")]
    InvalidOutput {
        /// Script path.
        path: Utf8PathBuf,
        /// Decoding error.
        #[source]
        source: FromUtf8Error,
    },
    /// The session was cancelled while the action ran.
    #[error("action cancelled")]
    Cancelled,
}

/// Computes the response for an RPC.
pub trait ActionExecutor: Send + Sync {
    /// Runs the action for `request`.
    ///
    /// Implementations should return promptly once `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when no response can be computed; the
    /// dispatcher logs it and sends nothing.
    fn execute(
        &self,
        request: &ActionRequest,
        resets: &ResetMap,
        token: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError>;
}
