//! Server bootstrap: configuration, telemetry and the shared session context.

use std::sync::Arc;

use netconf_config::{ActionBackend, Config};
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use crate::action::{ActionExecutor, ScriptActionExecutor, TemplateActionExecutor};
use crate::reset_map::ResetMap;
use crate::session::{SessionContext, SessionSettings};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::templates::{DirectoryTemplateStore, TemplateStore};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when no valid configuration can be built.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap.
pub struct Server {
    config: Config,
    context: SessionContext,
    telemetry: TelemetryHandle,
}

impl Server {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Context shared by every session of the listener.
    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }
}

/// Loads configuration, initialises telemetry and builds the session context.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration or telemetry fails.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<Server, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let context = session_context(&config);
    Ok(Server {
        config,
        context,
        telemetry,
    })
}

/// Builds the listener-wide session context described by `config`.
#[must_use]
pub fn session_context(config: &Config) -> SessionContext {
    let store = DirectoryTemplateStore::new(config.templates_dir());
    let executor: Arc<dyn ActionExecutor> = match config.action_backend() {
        ActionBackend::Template => Arc::new(TemplateActionExecutor::new(Arc::new(store.clone()))),
        ActionBackend::Script => {
            Arc::new(ScriptActionExecutor::new(store.clone(), config.action_timeout()))
        }
    };
    let templates: Arc<dyn TemplateStore> = Arc::new(store);
    SessionContext {
        templates,
        executor,
        resets: ResetMap::new(),
        settings: SessionSettings::from_config(config),
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    struct ArgsLoader(&'static [&'static str]);

    impl ConfigLoader for ArgsLoader {
        fn load(&self) -> Result<Config, Arc<OrthoError>> {
            Config::load_from_iter(self.0.iter().copied())
        }
    }

    #[test]
    fn layered_loading_reaches_the_session_context() {
        let loader = ArgsLoader(&["netconfd", "--event-delay-ms", "40", "--log-filter", "off"]);
        let server = bootstrap_with(&loader).expect("bootstrap");
        assert_eq!(server.config().event_delay_ms, 40);
        assert_eq!(
            server.context().settings.event_delay,
            std::time::Duration::from_millis(40)
        );
    }

    #[test]
    fn bootstrap_uses_loaded_configuration() {
        let config = Config {
            templates_dir: Utf8PathBuf::from("/srv/vnf"),
            event_delay_ms: 250,
            log_filter: String::from("off"),
            ..Config::default()
        };
        let server = bootstrap_with(&StaticConfigLoader::new(config.clone())).expect("bootstrap");
        assert_eq!(server.config(), &config);
        assert_eq!(
            server.context().settings.event_delay,
            std::time::Duration::from_millis(250)
        );
        assert!(server.context().resets.snapshot().is_empty());
    }
}
