//! Connection handling for the NETCONF listener.

use std::collections::HashMap;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::{info, warn};

use super::LISTENER_TARGET;
use crate::session::{CancellationToken, NetconfSession, SessionContext, SessionIo};

/// Handles accepted socket connections.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: TcpStream, peer: SocketAddr);

    /// Called once the listener stops accepting.
    fn shutdown(&self) {}
}

/// Runs a [`NetconfSession`] for every accepted connection.
///
/// All sessions share the handler's [`SessionContext`], and with it one reset
/// map per listener.
pub struct SessionConnectionHandler {
    context: SessionContext,
    sessions: Mutex<HashMap<u64, CancellationToken>>,
    next_id: AtomicU64,
    closing: AtomicBool,
}

impl SessionConnectionHandler {
    /// Creates a handler whose sessions use `context`.
    #[must_use]
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            closing: AtomicBool::new(false),
        }
    }

    /// Number of sessions currently running.
    #[must_use]
    pub fn live_sessions(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    fn register(&self, token: &CancellationToken) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .insert(id, token.clone());
        if self.closing.load(Ordering::SeqCst) {
            token.cancel();
        }
        id
    }

    fn unregister(&self, id: u64) {
        self.sessions
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .remove(&id);
    }
}

impl ConnectionHandler for SessionConnectionHandler {
    fn handle(&self, stream: TcpStream, peer: SocketAddr) {
        let (reader, closer) = match (stream.try_clone(), stream.try_clone()) {
            (Ok(reader), Ok(closer)) => (reader, closer),
            (Err(error), _) | (_, Err(error)) => {
                warn!(
                    target: LISTENER_TARGET,
                    error = %error,
                    peer = %peer,
                    "failed to clone connection"
                );
                return;
            }
        };

        let session = NetconfSession::new(self.context.clone());
        let id = self.register(session.token());

        info!(target: LISTENER_TARGET, peer = %peer, session = id, "session opened");
        let io = SessionIo::new(reader, stream)
            .with_interrupt(move || drop(closer.shutdown(Shutdown::Both)));
        let end = session.run(io);
        self.unregister(id);
        info!(
            target: LISTENER_TARGET,
            peer = %peer,
            session = id,
            ?end,
            "session closed"
        );
    }

    fn shutdown(&self) {
        self.closing.store(true, Ordering::SeqCst);
        let tokens: Vec<_> = self
            .sessions
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .values()
            .cloned()
            .collect();
        for token in tokens {
            token.cancel();
        }
    }
}
