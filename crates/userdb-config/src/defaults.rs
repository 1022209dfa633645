use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Directory under which every user database service exposes its socket.
pub const DEFAULT_RUNTIME_DIRECTORY: &str = "/run/systemd/userdb";

/// Reserved service name of the aggregating multiplexer.
pub const MULTIPLEXER_SERVICE: &str = "io.systemd.Multiplexer";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default budget for connecting to a service socket.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default silence a backend may keep before the multiplexer gives up on it.
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 10_000;

/// Default runtime directory holding service sockets.
pub fn default_runtime_directory() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_RUNTIME_DIRECTORY)
}

/// Default service served by the daemon.
pub fn default_service() -> String {
    MULTIPLEXER_SERVICE.to_string()
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default connect timeout in milliseconds.
pub fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default reply timeout in milliseconds.
pub fn default_reply_timeout_ms() -> u64 {
    DEFAULT_REPLY_TIMEOUT_MS
}
