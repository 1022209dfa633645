//! Shared configuration for the user database daemon and query tool.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, an
//! optional configuration file, `USERDB_*` environment variables, and finally
//! command-line flags. Both binaries agree on the runtime directory layout so
//! that the multiplexer can discover every service socket by listing it.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod socket;

pub use defaults::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_REPLY_TIMEOUT_MS,
    DEFAULT_RUNTIME_DIRECTORY, MULTIPLEXER_SERVICE, default_connect_timeout_ms, default_log_filter,
    default_log_filter_string, default_log_format, default_reply_timeout_ms,
    default_runtime_directory, default_service,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{
    RuntimeDirectory, ServiceNameError, SocketPreparationError, validate_service_name,
};

/// Resolved configuration shared by `userdbd` and `userdb-query`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "USERDB")]
pub struct Config {
    /// Directory holding one socket per service.
    #[serde(default = "default_runtime_directory")]
    pub runtime_directory: Utf8PathBuf,
    /// Service served by the daemon. The multiplexer name selects aggregation.
    #[serde(default = "default_service")]
    pub service: String,
    /// Directory of `*.user` JSON records backing a static service.
    #[serde(default)]
    pub records_directory: Option<Utf8PathBuf>,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Budget for connecting to a backend socket, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Longest silence tolerated from a backend mid-stream, in milliseconds.
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime_directory: default_runtime_directory(),
            service: default_service(),
            records_directory: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            connect_timeout_ms: default_connect_timeout_ms(),
            reply_timeout_ms: default_reply_timeout_ms(),
        }
    }
}

impl Config {
    /// Runtime directory wrapper for socket path derivation.
    #[must_use]
    pub fn runtime_directory(&self) -> RuntimeDirectory {
        RuntimeDirectory::new(self.runtime_directory.clone())
    }

    /// Socket path of the configured service.
    pub fn socket_path(&self) -> Result<Utf8PathBuf, ServiceNameError> {
        self.runtime_directory().service_socket(&self.service)
    }

    /// Name of the served service.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Whether the configured service is the aggregating multiplexer.
    #[must_use]
    pub fn serves_multiplexer(&self) -> bool {
        self.service == MULTIPLEXER_SERVICE
    }

    /// Directory of static records, if configured.
    #[must_use]
    pub fn records_directory(&self) -> Option<&Utf8Path> {
        self.records_directory.as_deref()
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Reply timeout as a [`Duration`].
    #[must_use]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}
