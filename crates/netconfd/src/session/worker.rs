//! Named threads bound to a cancellation token and joined with a deadline.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};

use super::CancellationToken;

/// Result of joining a [`Worker`] with a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The thread finished within the deadline.
    Joined,
    /// The thread finished by panicking.
    Panicked,
    /// The thread was still running at the deadline and has been abandoned.
    TimedOut,
}

struct CancelOnUnwind(CancellationToken);

impl Drop for CancelOnUnwind {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.cancel();
        }
    }
}

/// Background thread whose lifetime is tied to a [`CancellationToken`].
#[derive(Debug)]
pub struct Worker {
    name: String,
    token: CancellationToken,
    done: Receiver<()>,
    handle: JoinHandle<()>,
}

impl Worker {
    /// Spawns `body` on a thread called `name`.
    ///
    /// A panic in `body` cancels `token`, so the threads sharing it wind down
    /// instead of waiting on a worker that no longer exists.
    ///
    /// # Errors
    ///
    /// Returns the OS error when the thread cannot be created, including when
    /// `name` contains a NUL byte.
    pub fn spawn<F>(name: impl Into<String>, token: CancellationToken, body: F) -> io::Result<Self>
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        let name = name.into();
        if name.contains('\0') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "thread name contains a NUL byte",
            ));
        }
        let (done_tx, done) = bounded::<()>(1);
        let thread_token = token.clone();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            // Dropped on return or unwind, which disconnects `done`.
            let _done = done_tx;
            let _unwind = CancelOnUnwind(thread_token.clone());
            body(thread_token);
        })?;
        Ok(Self {
            name,
            token,
            done,
            handle,
        })
    }

    /// Thread name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requests the worker to stop by cancelling its token.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Channel that disconnects when the worker's body returns.
    #[must_use]
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }

    /// Returns true once the worker's body has returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits up to `timeout` for the thread to finish.
    #[must_use]
    pub fn join_timeout(self, timeout: Duration) -> JoinOutcome {
        match self.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => JoinOutcome::TimedOut,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => match self.handle.join() {
                Ok(()) => JoinOutcome::Joined,
                Err(_) => JoinOutcome::Panicked,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crossbeam_channel::select;

    use super::*;

    #[test]
    fn stop_unblocks_a_cooperative_worker() {
        let token = CancellationToken::new();
        let worker = Worker::spawn("cooperative", token, |token| {
            select! {
                recv(token.signal()) -> _ => {},
                default(Duration::from_secs(10)) => {},
            }
        })
        .expect("spawn worker");

        worker.stop();
        assert_eq!(worker.join_timeout(Duration::from_secs(2)), JoinOutcome::Joined);
    }

    #[test]
    fn stubborn_worker_times_out() {
        let release = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&release);
        let worker = Worker::spawn("stubborn", CancellationToken::new(), move |_| {
            while !flag.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
        })
        .expect("spawn worker");

        worker.stop();
        assert_eq!(
            worker.join_timeout(Duration::from_millis(50)),
            JoinOutcome::TimedOut
        );
        release.store(true, Ordering::SeqCst);
    }

    #[test]
    fn panics_are_reported_and_cancel_the_token() {
        let token = CancellationToken::new();
        let worker = Worker::spawn("panicking", token.clone(), |_| {
            panic!("worker failure");
        })
        .expect("spawn worker");
        assert_eq!(
            worker.join_timeout(Duration::from_secs(2)),
            JoinOutcome::Panicked
        );
        assert!(token.is_cancelled());
    }

    #[test]
    fn nul_in_name_is_an_error() {
        let error = Worker::spawn("bad\0name", CancellationToken::new(), |_| {})
            .expect_err("NUL name rejected");
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn clean_exit_leaves_the_token_alone() {
        let token = CancellationToken::new();
        let worker = Worker::spawn("quiet", token.clone(), |_| {}).expect("spawn worker");
        assert_eq!(worker.join_timeout(Duration::from_secs(2)), JoinOutcome::Joined);
        assert!(!token.is_cancelled());
    }
}
