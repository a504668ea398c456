//! TCP listener that turns each connection into a NETCONF session.
//!
//! The listener accepts connections on a background thread and hands each to
//! a [`ConnectionHandler`] on its own thread. Shutting the listener down
//! stops accepting and asks the handler to end every live session.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub use self::handler::{ConnectionHandler, SessionConnectionHandler};
pub use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
