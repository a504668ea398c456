//! FIFO hand-off between a session's reader and its dispatcher.

use crossbeam_channel::{Receiver, Sender, select, unbounded};
use thiserror::Error;

use super::CancellationToken;
use crate::message::Message;

/// Errors returned while waiting on the queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The session was cancelled while waiting.
    #[error("session cancelled while waiting for a request")]
    Cancelled,
    /// Every producer has gone and the queue is empty.
    #[error("request queue closed")]
    Closed,
}

/// Unbounded queue of recognised messages.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    sender: Sender<Message>,
    receiver: Receiver<Message>,
}

impl RequestQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Appends `message` and wakes a waiting consumer.
    pub fn enqueue(&self, message: Message) {
        // The queue holds its own receiver, so the channel cannot be disconnected.
        drop(self.sender.send(message));
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns true when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Takes the oldest message, blocking until one arrives or `token` is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Cancelled`] once the token is cancelled.
    pub fn dequeue_blocking(&self, token: &CancellationToken) -> Result<Message, QueueError> {
        if token.is_cancelled() {
            return Err(QueueError::Cancelled);
        }
        select! {
            recv(self.receiver) -> message => message.map_err(|_| QueueError::Closed),
            recv(token.signal()) -> _ => Err(QueueError::Cancelled),
        }
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}
