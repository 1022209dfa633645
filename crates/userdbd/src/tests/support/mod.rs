//! Test harness utilities shared by the service test suites.

mod config_loader;
mod reporter;
mod services;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use services::{
    BACKEND_TIMEOUTS, RunningService, StalledService, query_users, stale_socket, utf8_tempdir,
};
