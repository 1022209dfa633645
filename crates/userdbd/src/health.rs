//! Structured health reporting for service lifecycle events.

use std::sync::Arc;

use camino::Utf8Path;
use userdb_config::Config;

use crate::bootstrap::BootstrapError;

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the service socket accepts connections.
    fn listener_ready(&self, service: &str, path: &Utf8Path);

    /// Invoked when a shutdown signal has been received.
    fn shutdown_requested(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, service: &str, path: &Utf8Path) {
        (**self).listener_ready(service, path);
    }

    fn shutdown_requested(&self) {
        (**self).shutdown_requested();
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: "userdbd::health",
            event = "bootstrap_starting",
            "starting service bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        let runtime_directory = config.runtime_directory();
        tracing::info!(
            target: "userdbd::health",
            event = "bootstrap_succeeded",
            service = %config.service(),
            runtime_directory = %runtime_directory.path(),
            multiplexer = config.serves_multiplexer(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "service bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: "userdbd::health",
            event = "bootstrap_failed",
            error = %error,
            "service bootstrap failed"
        );
    }

    fn listener_ready(&self, service: &str, path: &Utf8Path) {
        tracing::info!(
            target: "userdbd::health",
            event = "listener_ready",
            service = %service,
            socket = %path,
            "service socket ready"
        );
    }

    fn shutdown_requested(&self) {
        tracing::info!(
            target: "userdbd::health",
            event = "shutdown_requested",
            "shutdown requested"
        );
    }
}
