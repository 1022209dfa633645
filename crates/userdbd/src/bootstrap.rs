//! Service bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::warn;

use userdb_config::{Config, ServiceNameError, SocketPreparationError};

use crate::database::{DatabaseError, StaticDatabase, UserDatabase};
use crate::health::HealthReporter;
use crate::multiplexer::{BackendTimeouts, Multiplexer, SocketDirectory};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the service configuration.
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

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
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
    /// The configured service name cannot name a socket.
    #[error("invalid service name: {source}")]
    ServiceName {
        /// Validation failure.
        #[source]
        source: ServiceNameError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare runtime directory: {source}")]
    Socket {
        /// Filesystem error reported while preparing the runtime directory.
        #[source]
        source: SocketPreparationError,
    },
    /// The record backend could not be opened.
    #[error("failed to open user database: {source}")]
    Database {
        /// Underlying load error.
        #[source]
        source: DatabaseError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Service {
    config: Config,
    database: Arc<dyn UserDatabase>,
    telemetry: TelemetryHandle,
}

impl Service {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Database answering requests for the configured service.
    #[must_use]
    pub fn database(&self) -> Arc<dyn UserDatabase> {
        Arc::clone(&self.database)
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }
}

/// Bootstraps the service using the supplied collaborators.
///
/// The multiplexer service name selects the merging backend. Any other name
/// serves the records found in the configured records directory.
///
/// # Errors
///
/// Returns [`BootstrapError`] for the first step that fails. The reporter is
/// notified before the error is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Service, BootstrapError> {
    reporter.bootstrap_starting();
    match bootstrap_steps(loader) {
        Ok(service) => {
            reporter.bootstrap_succeeded(&service.config);
            Ok(service)
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn bootstrap_steps(loader: &dyn ConfigLoader) -> Result<Service, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    config
        .socket_path()
        .map_err(|source| BootstrapError::ServiceName { source })?;
    config
        .runtime_directory()
        .prepare_filesystem()
        .map_err(|source| BootstrapError::Socket { source })?;
    let database = open_database(&config).map_err(|source| BootstrapError::Database { source })?;
    Ok(Service {
        config,
        database,
        telemetry,
    })
}

fn open_database(config: &Config) -> Result<Arc<dyn UserDatabase>, DatabaseError> {
    if config.serves_multiplexer() {
        let directory =
            SocketDirectory::new(config.runtime_directory().path(), config.service());
        let timeouts = BackendTimeouts {
            connect: config.connect_timeout(),
            reply: config.reply_timeout(),
        };
        return Ok(Arc::new(Multiplexer::new(directory, timeouts)));
    }
    match config.records_directory() {
        Some(directory) => Ok(Arc::new(StaticDatabase::from_directory(directory)?)),
        None => {
            warn!(
                target: BOOTSTRAP_TARGET,
                service = %config.service(),
                "no records directory configured; serving an empty database"
            );
            Ok(Arc::new(StaticDatabase::new(Vec::new())))
        }
    }
}
