//! Per-connection NETCONF session.
//!
//! A [`NetconfSession`] sends the server hello, then splits into two threads
//! joined by a [`RequestQueue`]: the calling thread frames and recognizes
//! input, and a dispatcher [`Worker`] answers each message in order. Every
//! way a session can end cancels the shared [`CancellationToken`], after which
//! the in-flight action and the dispatcher are joined with a bounded wait.

mod cancel;
mod framing;
mod queue;
mod worker;

use std::io::{BufRead, BufReader, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::bounded;
use netconf_config::Config;
use tracing::{debug, info, warn};

use crate::action::ActionExecutor;
use crate::dispatch::{ActionSlot, DispatchEnd, Dispatcher, ResponseWriter};
use crate::message::recognize;
use crate::reset_map::ResetMap;
use crate::templates::TemplateStore;

pub use cancel::CancellationToken;
pub use framing::{END_OF_MESSAGE, FramingError, FramingReader, MAX_CHUNK_BYTES};
pub use queue::{QueueError, RequestQueue};
pub use worker::{JoinOutcome, Worker};

/// Tracing target for session lifecycle events.
pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Timing knobs applied to every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Delay handed to actions that emit events.
    pub event_delay: Duration,
    /// Bound on joining the action and dispatcher threads.
    pub join_timeout: Duration,
}

impl SessionSettings {
    /// Reads the settings from `config`.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            event_delay: config.event_delay(),
            join_timeout: config.join_timeout(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Collaborators shared by every session on a listener.
#[derive(Clone)]
pub struct SessionContext {
    /// Source of hello, schema and response templates.
    pub templates: Arc<dyn TemplateStore>,
    /// Computes responses for RPCs other than `get-schema`.
    pub executor: Arc<dyn ActionExecutor>,
    /// Listener-wide suppression map.
    pub resets: ResetMap,
    /// Timing knobs.
    pub settings: SessionSettings,
}

type Interrupt = Box<dyn FnOnce() + Send>;

/// Byte streams of one client connection.
///
/// The session reads on the calling thread, so a blocked read only returns
/// when the peer sends data or closes. Streams that can be woken from another
/// thread should supply [`Self::with_interrupt`]; without it a session ended
/// by its dispatcher waits for the peer's end of stream.
pub struct SessionIo {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
    interrupt: Option<Interrupt>,
}

impl SessionIo {
    /// Wraps the input and output halves of a connection.
    pub fn new(reader: impl Read + Send + 'static, writer: impl Write + Send + 'static) -> Self {
        Self {
            reader: Box::new(BufReader::new(reader)),
            writer: Box::new(writer),
            interrupt: None,
        }
    }

    /// Sets the action that unblocks the reader when the session is
    /// cancelled, such as shutting a socket down.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: impl FnOnce() + Send + 'static) -> Self {
        self.interrupt = Some(Box::new(interrupt));
        self
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client closed its side of the connection.
    EndOfStream,
    /// The client sent something that is not a valid message.
    Protocol,
    /// Reading from or writing to the client failed.
    Transport,
    /// The dispatcher answered a close request.
    Closed,
    /// The session was cancelled from outside.
    Cancelled,
}

/// One client session.
pub struct NetconfSession {
    context: SessionContext,
    token: CancellationToken,
}

impl NetconfSession {
    /// Creates a session with a fresh cancellation token.
    #[must_use]
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            token: CancellationToken::new(),
        }
    }

    /// Token that cancels the session; clone it before calling [`Self::run`].
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs the session until it ends, then tears it down.
    pub fn run(self, io: SessionIo) -> SessionEnd {
        let SessionIo {
            reader,
            writer,
            interrupt,
        } = io;
        if let Some(interrupt) = interrupt {
            self.token.on_cancel(interrupt);
        }
        let queue = RequestQueue::new();
        let actions = ActionSlot::default();
        let dispatcher = Dispatcher::new(
            &self.context,
            queue.clone(),
            ResponseWriter::new(writer),
            actions.clone(),
        );

        if let Err(error) = dispatcher.send_hello() {
            warn!(target: SESSION_TARGET, error = %error, "failed to send hello");
            self.token.cancel();
            return SessionEnd::Transport;
        }

        let (end_tx, end_rx) = bounded(1);
        let dispatch_worker = match Worker::spawn(
            "netconf-dispatch",
            self.token.clone(),
            move |token| {
                drop(end_tx.send(dispatcher.run(&token)));
            },
        ) {
            Ok(worker) => worker,
            Err(error) => {
                warn!(target: SESSION_TARGET, error = %error, "failed to spawn dispatcher");
                self.token.cancel();
                return SessionEnd::Transport;
            }
        };

        info!(target: SESSION_TARGET, "session started");
        let read_end = read_messages(reader, &queue, &self.token);
        self.token.cancel();

        let join_timeout = self.context.settings.join_timeout;
        if let Some(action) = actions.take() {
            action.stop();
            log_join(action.name().to_owned(), action.join_timeout(join_timeout));
        }
        dispatch_worker.stop();
        log_join(
            dispatch_worker.name().to_owned(),
            dispatch_worker.join_timeout(join_timeout),
        );

        let end = match (read_end, end_rx.try_recv().ok()) {
            (SessionEnd::Cancelled, Some(DispatchEnd::Closed)) => SessionEnd::Closed,
            (SessionEnd::Cancelled, Some(DispatchEnd::OutputFailed)) => SessionEnd::Transport,
            (end, _) => end,
        };
        info!(target: SESSION_TARGET, ?end, "session ended");
        end
    }
}

fn read_messages(
    reader: impl BufRead,
    queue: &RequestQueue,
    token: &CancellationToken,
) -> SessionEnd {
    let mut framing = FramingReader::new(reader);
    loop {
        let chunk = match framing.next_chunk() {
            Ok(Some(chunk)) => chunk,
            Ok(None) if token.is_cancelled() => return SessionEnd::Cancelled,
            Ok(None) => {
                debug!(target: SESSION_TARGET, "client closed the connection");
                return SessionEnd::EndOfStream;
            }
            Err(_) if token.is_cancelled() => return SessionEnd::Cancelled,
            Err(error @ FramingError::Io { .. }) => {
                warn!(target: SESSION_TARGET, error = %error, "transport read failed");
                return SessionEnd::Transport;
            }
            Err(error) => {
                warn!(target: SESSION_TARGET, error = %error, "framing failed");
                return SessionEnd::Protocol;
            }
        };
        if token.is_cancelled() {
            return SessionEnd::Cancelled;
        }
        match recognize(&chunk) {
            Ok(message) => queue.enqueue(message),
            Err(error) => {
                warn!(
                    target: SESSION_TARGET,
                    error = %error,
                    "unrecognised message, closing session"
                );
                return SessionEnd::Protocol;
            }
        }
    }
}

fn log_join(name: String, outcome: JoinOutcome) {
    match outcome {
        JoinOutcome::Joined => debug!(target: SESSION_TARGET, thread = %name, "thread joined"),
        JoinOutcome::Panicked => warn!(target: SESSION_TARGET, thread = %name, "thread panicked"),
        JoinOutcome::TimedOut => warn!(
            target: SESSION_TARGET,
            thread = %name,
            "thread did not stop in time, abandoning it"
        ),
    }
}

#[cfg(test)]
mod tests;
