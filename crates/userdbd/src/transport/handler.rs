//! Connection handling abstractions for the service listener.

use std::os::unix::net::UnixStream;

use crate::cancellation::CancellableStream;

/// Stream type handed to connection handlers.
///
/// Reads and writes abort with `ConnectionAborted` once the listener's token
/// is cancelled.
pub(crate) type ConnectionStream = CancellableStream<UnixStream>;

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}
