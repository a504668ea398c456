//! Request dispatch for NETCONF sessions.
//!
//! The [`Dispatcher`] drains a session's request queue one message at a time:
//! hellos are answered with the server hello, `get-schema` requests with the
//! matching schema template, and every other RPC with the output of the
//! configured action executor. All output goes through a [`ResponseWriter`],
//! which appends the NETCONF 1.0 end-of-message marker.

mod dispatcher;
mod errors;
mod response;

pub use dispatcher::{
    ActionSlot, CLOSE_SESSION_OPERATION, DispatchEnd, Dispatcher, is_close_request,
};
pub use errors::DispatchError;
pub use response::{MESSAGE_ID_PLACEHOLDERS, ResponseWriter, substitute_message_id};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
