//! Server launch sequencing.

use std::sync::Arc;

use tracing::info;

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::PROCESS_TARGET;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::transport::{SessionConnectionHandler, SocketListener};

/// Collaborators required to run the server.
pub struct LaunchPlan<L, S> {
    /// Source of configuration.
    pub loader: L,
    /// Blocks until the server should stop.
    pub shutdown: S,
}

/// Runs the server with the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, listening or shutdown handling
/// fails.
pub fn run_server() -> Result<(), LaunchError> {
    run_server_with(LaunchPlan {
        loader: SystemConfigLoader,
        shutdown: SystemShutdownSignal,
    })
}

/// Runs the server with injected collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, listening or shutdown handling
/// fails.
pub fn run_server_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan { loader, shutdown } = plan;
    let server = bootstrap_with(&loader)?;
    info!(
        target: PROCESS_TARGET,
        listen = %server.config().listen(),
        templates_dir = %server.config().templates_dir(),
        backend = %server.config().action_backend(),
        "starting netconf server"
    );

    let listener = SocketListener::bind(server.config().listen())?;
    let local_addr = listener.local_addr();
    let handler = Arc::new(SessionConnectionHandler::new(server.context().clone()));
    let listener_handle = listener.start(handler)?;
    info!(target: PROCESS_TARGET, %local_addr, "netconf server ready");

    shutdown.wait()?;
    listener_handle.shutdown();
    listener_handle.join()?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
