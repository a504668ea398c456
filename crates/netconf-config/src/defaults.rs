use camino::Utf8PathBuf;

use crate::backend::ActionBackend;
use crate::listen::ListenAddress;
use crate::logging::LogFormat;

/// Default bind host, matching the listener of the test VNF.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default TCP port for NETCONF sessions.
pub const DEFAULT_PORT: u16 = 2052;

/// Default delay between events emitted by actions, in milliseconds.
pub const DEFAULT_EVENT_DELAY_MS: u64 = 1000;

/// Default timeout for scripted actions, in seconds.
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;

/// Default bound on joining session threads during teardown, in milliseconds.
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 2000;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default listen address for the NETCONF listener.
#[must_use]
pub fn default_listen_address() -> ListenAddress {
    ListenAddress::new(DEFAULT_HOST, DEFAULT_PORT)
}

/// Default directory holding the `netconftemplates` tree.
#[must_use]
pub fn default_templates_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(".")
}

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default action backend.
#[must_use]
pub const fn default_action_backend() -> ActionBackend {
    ActionBackend::Template
}
