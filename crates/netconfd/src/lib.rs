//! NETCONF test server core.
//!
//! `netconfd` answers NETCONF 1.0 sessions from canned templates so that
//! orchestration code can be exercised against a simulated network function.
//! Each accepted connection becomes a [`NetconfSession`] that frames its input
//! on `]]>]]>`-delimited lines, recognizes `<hello>` and `<rpc>` messages, and
//! queues them for a dispatcher thread that writes the replies.
//!
//! Replies come from the `netconftemplates` directory below the configured
//! templates root:
//!
//! * `hello.xml` is sent when a session starts and whenever the client says
//!   hello.
//! * `<identifier>-schema.yang` answers `get-schema`.
//! * `<operation>/<datastore>/response.xml` (template backend) or
//!   `<operation>/<datastore>/response.sh` (script backend) answers every
//!   other RPC.
//!
//! `<MID>` and `<MID/>` placeholders in any reply are replaced by the
//! request's `message-id`. An `edit-config` that names a `target-name` marks
//! that target in the listener-wide [`ResetMap`]; any other operation naming
//! it clears the mark.

pub mod action;
mod bootstrap;
pub mod dispatch;
pub mod message;
mod process;
mod reset_map;
pub mod session;
mod telemetry;
pub mod templates;
#[cfg(test)]
mod test_utils;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Server, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
    session_context,
};
pub use process::{
    EXIT_COMMAND, LaunchError, LaunchPlan, ShutdownError, ShutdownSignal, SystemShutdownSignal,
    run_server, run_server_with,
};
pub use reset_map::ResetMap;
pub use session::{NetconfSession, SessionContext, SessionEnd, SessionIo, SessionSettings};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

#[cfg(test)]
mod tests;
