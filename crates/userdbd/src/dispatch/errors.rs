//! Error types for request dispatch failures.
//!
//! None of these errors is reported to the client. A request that cannot be
//! read or parsed, or whose replies cannot be written, ends the connection.

use thiserror::Error;
use userdb_protocol::{CodecError, Method};

/// Errors surfaced while serving a connection.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request frame could not be read or decoded.
    #[error("failed to read request: {0}")]
    Read(#[source] CodecError),

    /// The parameters do not match the schema of the named method.
    #[error("invalid parameters for {method}: {source}")]
    InvalidParameters {
        method: Method,
        #[source]
        source: serde_json::Error,
    },

    /// A reply could not be written.
    #[error("failed to write reply: {0}")]
    Write(#[source] CodecError),
}

impl DispatchError {
    /// Creates an invalid parameters error.
    pub fn invalid_parameters(method: Method, source: serde_json::Error) -> Self {
        Self::InvalidParameters { method, source }
    }
}
