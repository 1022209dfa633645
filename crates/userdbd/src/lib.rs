//! User database service for the systemd `io.systemd.UserDatabase` interface.
//!
//! `userdbd` binds one service socket inside the runtime directory and
//! answers user lookups over the NUL-framed JSON protocol implemented by
//! [`userdb_protocol`]. Configuration is loaded through [`userdb_config`].
//!
//! Two kinds of service can be run:
//!
//! - A record service, which serves the `*.user` JSON records found in a
//!   configured directory through [`StaticDatabase`].
//! - The multiplexer, selected by the `io.systemd.Multiplexer` service name,
//!   which discovers every other socket in the runtime directory on each
//!   request, queries them concurrently and merges their replies.
//!
//! Each connection carries exactly one request and is served on its own
//! thread. Blocking I/O observes a [`CancellationToken`], so shutdown and
//! early termination of merged streams abort in-flight socket operations
//! promptly.

mod bootstrap;
mod cancellation;
mod database;
mod dispatch;
mod health;
mod multiplexer;
mod process;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Service, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use cancellation::{CancellableStream, CancellationToken};
pub use database::{
    DatabaseError, Replies, StaticDatabase, UserDatabase, UserRecordLookup, single,
};
pub use dispatch::DispatchError;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use multiplexer::{
    BackendTimeouts, DirectoryError, MergedReplies, Multiplexer, ServiceDirectory,
    ServiceEndpoint, SocketDirectory,
};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
