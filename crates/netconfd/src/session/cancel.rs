//! Cooperative cancellation shared by a session's threads.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, bounded};

type CancelHook = Box<dyn FnOnce() + Send>;

/// Cloneable cancellation flag.
///
/// Cancelling runs every hook registered through [`Self::on_cancel`] exactly
/// once and disconnects the channel returned by [`Self::signal`], which lets
/// blocked `select!` calls observe cancellation.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    hooks: Mutex<Vec<CancelHook>>,
    sender: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                hooks: Mutex::new(Vec::new()),
                sender: Mutex::new(Some(sender)),
                receiver,
            }),
        }
    }

    /// Cancels the token. Only the first call runs hooks.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner
            .sender
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .take();
        let hooks = std::mem::take(
            &mut *self
                .inner
                .hooks
                .lock()
                .unwrap_or_else(|poison| poison.into_inner()),
        );
        for hook in hooks {
            hook();
        }
    }

    /// Returns true once [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Channel that never yields a value and disconnects on cancellation.
    #[must_use]
    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.receiver
    }

    /// Registers `hook` to run on cancellation.
    ///
    /// The hook runs immediately when the token is already cancelled.
    pub fn on_cancel(&self, hook: impl FnOnce() + Send + 'static) {
        {
            let mut hooks = self
                .inner
                .hooks
                .lock()
                .unwrap_or_else(|poison| poison.into_inner());
            if !self.is_cancelled() {
                hooks.push(Box::new(hook));
                return;
            }
        }
        hook();
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
