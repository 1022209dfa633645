//! Unix socket listener for the service endpoint.
//!
//! The transport module binds the service socket inside the runtime directory
//! and accepts connections in a background thread. Each accepted connection is
//! wrapped in a [`CancellableStream`](crate::cancellation::CancellableStream)
//! tied to the listener's token and handed to a [`ConnectionHandler`] on its
//! own thread.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
#[cfg(test)]
pub(crate) use self::listener::ListenerHandle;
pub(crate) use self::listener::SocketListener;
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
