//! Canned responses read from the template tree.

use std::sync::Arc;

use tracing::debug;

use super::{ACTION_TARGET, ActionError, ActionExecutor, ActionOutcome, ActionRequest};
use crate::reset_map::ResetMap;
use crate::session::CancellationToken;
use crate::templates::{TemplateError, TemplateStore, response_template_name};

/// File name of a canned response below `<operation>/<datastore>/`.
pub const RESPONSE_TEMPLATE: &str = "response.xml";

const OK_REPLY: &str = concat!(
    "<rpc-reply message-id=\"<MID>\" xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\">",
    "<ok/></rpc-reply>",
);

const DATA_REPLY: &str = concat!(
    "<rpc-reply message-id=\"<MID>\" xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\">",
    "<data/></rpc-reply>",
);

const OK_OPERATIONS: &[&str] = &[
    "edit-config",
    "copy-config",
    "delete-config",
    "lock",
    "unlock",
    "commit",
    "discard-changes",
    "validate",
    "kill-session",
    "close-session",
];

const DATA_OPERATIONS: &[&str] = &["get", "get-config"];

/// Built-in reply for `operation`, used when no template exists.
#[must_use]
pub fn builtin_response(operation: &str) -> Option<&'static str> {
    if OK_OPERATIONS.contains(&operation) {
        Some(OK_REPLY)
    } else if DATA_OPERATIONS.contains(&operation) {
        Some(DATA_REPLY)
    } else {
        None
    }
}

/// Executor that answers from `<operation>/<datastore>/response.xml`.
#[derive(Clone)]
pub struct TemplateActionExecutor {
    store: Arc<dyn TemplateStore>,
}

impl TemplateActionExecutor {
    /// Creates an executor reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }
}

impl ActionExecutor for TemplateActionExecutor {
    fn execute(
        &self,
        request: &ActionRequest,
        _resets: &ResetMap,
        token: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError> {
        if token.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        let name =
            response_template_name(&request.operation, &request.datastore, RESPONSE_TEMPLATE);
        match self.store.read(&name) {
            Ok(text) => Ok(ActionOutcome::from_text(text)),
            Err(TemplateError::NotFound { path }) => {
                debug!(
                    target: ACTION_TARGET,
                    path = %path,
                    operation = %request.operation,
                    "no response template, using built-in reply"
                );
                builtin_response(&request.operation)
                    .map(|reply| ActionOutcome::Respond(reply.to_owned()))
                    .ok_or_else(|| ActionError::NoHandler {
                        operation: request.operation.clone(),
                        datastore: request.datastore.clone(),
                    })
            }
            Err(error) => Err(error.into()),
        }
    }
}
