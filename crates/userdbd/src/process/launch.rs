//! Supervises service launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::info;

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::cancellation::CancellationToken;
use crate::dispatch::DispatchConnectionHandler;
use crate::health::HealthReporter;
use crate::transport::SocketListener;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to launch the service runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
}

/// Runs the service using the production collaborators.
///
/// Blocks until a termination signal arrives, then stops accepting
/// connections, cancels in-flight sessions and removes the socket.
///
/// # Errors
///
/// Returns [`LaunchError`] if bootstrap, socket binding or signal handling
/// fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal::new(),
    })
}

/// Runs the service with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
    } = plan;

    let service = bootstrap_with(&loader, Arc::clone(&reporter))?;
    let config = service.config();
    let path = config.socket_path()?;
    info!(
        target: PROCESS_TARGET,
        service = %config.service(),
        socket = %path,
        "starting service runtime"
    );
    let listener = SocketListener::bind(&path)?;
    let handler = Arc::new(DispatchConnectionHandler::new(
        config.service(),
        service.database(),
    ));

    let listener_handle = listener.start(handler, CancellationToken::new())?;
    reporter.listener_ready(config.service(), &path);
    shutdown.wait()?;
    reporter.shutdown_requested();
    listener_handle.shutdown();
    listener_handle.join()?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}
