//! Consumer side of a session: answers queued messages in order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{bounded, select};
use tracing::{debug, info, warn};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::response::ResponseWriter;
use crate::action::{ActionExecutor, ActionOutcome, ActionRequest};
use crate::message::{EDIT_CONFIG_OPERATION, Message, RpcRequest};
use crate::reset_map::ResetMap;
use crate::session::{CancellationToken, JoinOutcome, RequestQueue, SessionContext, Worker};
use crate::templates::{HELLO_TEMPLATE, TemplateError, TemplateStore, schema_template_name};

/// Operation value that ends the session after it is answered.
///
/// The quotes are part of the value, so a plain `close-session` element does
/// not match and the session stays open.
pub const CLOSE_SESSION_OPERATION: &str = "\"close-session\"";

/// Returns true when `operation` asks the dispatcher to end the session.
#[must_use]
pub fn is_close_request(operation: &str) -> bool {
    operation == CLOSE_SESSION_OPERATION
}

/// Name of the thread running an action. Request ids stay in log fields
/// because thread names may not contain NUL bytes.
const ACTION_THREAD_NAME: &str = "netconf-action";

/// Why the dispatch loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchEnd {
    /// The session token was cancelled.
    Cancelled,
    /// A close request was answered.
    Closed,
    /// Writing to the client failed.
    OutputFailed,
}

/// In-flight action worker, shared with the session so teardown can stop it.
#[derive(Debug, Clone, Default)]
pub struct ActionSlot {
    worker: Arc<Mutex<Option<Worker>>>,
}

impl ActionSlot {
    fn put(&self, worker: Worker) {
        *self
            .worker
            .lock()
            .unwrap_or_else(|poison| poison.into_inner()) = Some(worker);
    }

    /// Removes the in-flight worker, if any.
    pub fn take(&self) -> Option<Worker> {
        self.worker
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .take()
    }
}

enum Flow {
    Continue,
    Stop(DispatchEnd),
}

/// Answers messages taken from a session's [`RequestQueue`].
pub struct Dispatcher {
    templates: Arc<dyn TemplateStore>,
    executor: Arc<dyn ActionExecutor>,
    resets: ResetMap,
    event_delay: Duration,
    join_timeout: Duration,
    queue: RequestQueue,
    writer: ResponseWriter,
    actions: ActionSlot,
}

impl Dispatcher {
    /// Creates a dispatcher for one session.
    #[must_use]
    pub fn new(
        context: &SessionContext,
        queue: RequestQueue,
        writer: ResponseWriter,
        actions: ActionSlot,
    ) -> Self {
        Self {
            templates: Arc::clone(&context.templates),
            executor: Arc::clone(&context.executor),
            resets: context.resets.clone(),
            event_delay: context.settings.event_delay,
            join_timeout: context.settings.join_timeout,
            queue,
            writer,
            actions,
        }
    }

    /// Sends the server hello.
    ///
    /// A missing or unreadable template is logged and nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] when the client cannot be written to.
    pub fn send_hello(&self) -> Result<(), DispatchError> {
        match self.templates.read(HELLO_TEMPLATE) {
            Ok(hello) => self.writer.write_frame(&hello),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    error = %error,
                    "hello template unavailable, no hello sent"
                );
                Ok(())
            }
        }
    }

    /// Runs until the token is cancelled, a close request is answered or
    /// output fails. The token is cancelled on return.
    pub fn run(self, token: &CancellationToken) -> DispatchEnd {
        let end = loop {
            let Ok(message) = self.queue.dequeue_blocking(token) else {
                break DispatchEnd::Cancelled;
            };
            match self.handle(message, token) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop(end)) => break end,
                Err(error) if error.is_transport_failure() => {
                    warn!(
                        target: DISPATCH_TARGET,
                        error = %error,
                        "client output failed, closing session"
                    );
                    break DispatchEnd::OutputFailed;
                }
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, error = %error, "request dropped");
                }
            }
        };
        debug!(target: DISPATCH_TARGET, ?end, "dispatch loop finished");
        token.cancel();
        end
    }

    fn handle(&self, message: Message, token: &CancellationToken) -> Result<Flow, DispatchError> {
        match message {
            Message::Hello => {
                debug!(target: DISPATCH_TARGET, "client hello received");
                self.send_hello()?;
                Ok(Flow::Continue)
            }
            Message::Rpc(request) => self.handle_rpc(&request, token),
        }
    }

    fn handle_rpc(
        &self,
        request: &RpcRequest,
        token: &CancellationToken,
    ) -> Result<Flow, DispatchError> {
        debug!(
            target: DISPATCH_TARGET,
            message_id = %request.message_id,
            operation = %request.operation,
            datastore = %request.datastore,
            "dispatching rpc"
        );
        if let Some(target) = &request.target_name {
            self.resets
                .mark(target, request.operation == EDIT_CONFIG_OPERATION);
        }

        if request.is_get_schema() {
            self.reply_schema(request)?;
        } else if !self.run_action(request, token)? {
            return Ok(Flow::Stop(DispatchEnd::Cancelled));
        }

        if is_close_request(&request.operation) {
            info!(
                target: DISPATCH_TARGET,
                message_id = %request.message_id,
                "close requested"
            );
            return Ok(Flow::Stop(DispatchEnd::Closed));
        }
        Ok(Flow::Continue)
    }

    fn reply_schema(&self, request: &RpcRequest) -> Result<(), DispatchError> {
        let Some(identifier) = request.schema_identifier() else {
            debug!(
                target: DISPATCH_TARGET,
                message_id = %request.message_id,
                "get-schema without identifier ignored"
            );
            return Ok(());
        };
        match self.templates.read(&schema_template_name(identifier)) {
            Ok(schema) => self.writer.write_reply(&schema, &request.message_id),
            Err(error) => {
                log_template_error(&error, &request.message_id);
                Ok(())
            }
        }
    }

    /// Runs the action on a worker and writes its outcome. Returns false when
    /// the session was cancelled before the action finished.
    fn run_action(
        &self,
        request: &RpcRequest,
        token: &CancellationToken,
    ) -> Result<bool, DispatchError> {
        let action = ActionRequest::from_rpc(request, self.event_delay);
        let executor = Arc::clone(&self.executor);
        let resets = self.resets.clone();
        let (result_tx, result_rx) = bounded(1);
        let worker = Worker::spawn(
            ACTION_THREAD_NAME,
            token.clone(),
            move |token| {
                let result = executor.execute(&action, &resets, &token);
                drop(result_tx.send(result));
            },
        )
        .map_err(|source| DispatchError::WorkerSpawn {
            message_id: request.message_id.clone(),
            source,
        })?;
        self.actions.put(worker);

        let result = select! {
            recv(result_rx) -> result => result,
            recv(token.signal()) -> _ => return Ok(false),
        };
        if let Some(worker) = self.actions.take() {
            let outcome = worker.join_timeout(self.join_timeout);
            if outcome != JoinOutcome::Joined {
                warn!(
                    target: DISPATCH_TARGET,
                    message_id = %request.message_id,
                    ?outcome,
                    "action worker did not finish cleanly"
                );
            }
        }

        match result {
            Ok(Ok(ActionOutcome::Respond(text))) => {
                self.writer.write_reply(&text, &request.message_id)?;
            }
            Ok(Ok(ActionOutcome::Ignore)) => {
                debug!(
                    target: DISPATCH_TARGET,
                    message_id = %request.message_id,
                    "action asked for no response"
                );
            }
            Ok(Err(error)) => {
                warn!(
                    target: DISPATCH_TARGET,
                    message_id = %request.message_id,
                    operation = %request.operation,
                    error = %error,
                    "action failed, no response sent"
                );
            }
            Err(_) => {
                warn!(
                    target: DISPATCH_TARGET,
                    message_id = %request.message_id,
                    "action worker exited without a result"
                );
            }
        }
        Ok(true)
    }
}

fn log_template_error(error: &TemplateError, message_id: &str) {
    warn!(
        target: DISPATCH_TARGET,
        message_id,
        error = %error,
        "schema template unavailable, no response sent"
    );
}
