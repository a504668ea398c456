//! Process entry point: bootstrap, listen, wait for shutdown.

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub use launch::{LaunchPlan, run_server, run_server_with};
pub use shutdown::{EXIT_COMMAND, ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
