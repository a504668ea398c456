//! Shared configuration for the NETCONF test server.
//!
//! [`Config`] is layered by `ortho_config`: built-in defaults, then
//! configuration files, then `NETCONF_*` environment variables, then command
//! line flags. The daemon reads the listen address, the template directory
//! holding `netconftemplates/`, the action backend and the timing knobs used
//! by sessions from here.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod backend;
mod defaults;
mod listen;
mod logging;

pub use backend::{ActionBackend, ActionBackendParseError};
pub use defaults::{
    DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_EVENT_DELAY_MS, DEFAULT_HOST, DEFAULT_JOIN_TIMEOUT_MS,
    DEFAULT_LOG_FILTER, DEFAULT_PORT, default_action_backend, default_listen_address,
    default_log_filter, default_log_filter_string, default_log_format, default_templates_dir,
};
pub use listen::{ListenAddress, ListenAddressParseError};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for the NETCONF listener and its sessions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "NETCONF")]
pub struct Config {
    /// Address the listener binds to.
    #[ortho_config(default = default_listen_address())]
    pub listen: ListenAddress,
    /// Directory containing the `netconftemplates` tree.
    #[ortho_config(default = default_templates_dir())]
    pub templates_dir: Utf8PathBuf,
    /// Delay handed to actions that emit events, in milliseconds.
    #[ortho_config(default = DEFAULT_EVENT_DELAY_MS)]
    pub event_delay_ms: u64,
    /// Backend computing responses for RPC operations.
    #[ortho_config(default = default_action_backend())]
    pub action_backend: ActionBackend,
    /// Upper bound for a scripted action, in seconds.
    #[ortho_config(default = DEFAULT_ACTION_TIMEOUT_SECS)]
    pub action_timeout_secs: u64,
    /// Bound on joining session threads during teardown, in milliseconds.
    #[ortho_config(default = DEFAULT_JOIN_TIMEOUT_MS)]
    pub join_timeout_ms: u64,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log events.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen_address(),
            templates_dir: default_templates_dir(),
            event_delay_ms: DEFAULT_EVENT_DELAY_MS,
            action_backend: default_action_backend(),
            action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Address the listener binds to.
    #[must_use]
    pub const fn listen(&self) -> &ListenAddress {
        &self.listen
    }

    /// Directory containing the `netconftemplates` tree.
    #[must_use]
    pub fn templates_dir(&self) -> &Utf8Path {
        self.templates_dir.as_path()
    }

    /// Delay handed to actions that emit events.
    #[must_use]
    pub const fn event_delay(&self) -> Duration {
        Duration::from_millis(self.event_delay_ms)
    }

    /// Backend computing responses for RPC operations.
    #[must_use]
    pub const fn action_backend(&self) -> ActionBackend {
        self.action_backend
    }

    /// Upper bound for a scripted action.
    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    /// Bound on joining session threads during teardown.
    #[must_use]
    pub const fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for log events.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
