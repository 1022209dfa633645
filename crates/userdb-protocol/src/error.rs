//! Symbolic error codes carried in the `error` field of a reply.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of errors a service may report on the wire.
///
/// Transport and framing failures never appear here: they end the connection
/// instead of producing a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The backend cannot enumerate all records.
    #[serde(rename = "io.systemd.UserDatabase.EnumerationNotSupported")]
    EnumerationNotSupported,
    /// The `uid` and `userName` lookups resolved to different records.
    #[serde(rename = "io.systemd.UserDatabase.ConflictingRecordFound")]
    ConflictingRecordFound,
    /// The named service could not be reached.
    #[serde(rename = "io.systemd.UserDatabase.ServiceNotAvailable")]
    ServiceNotAvailable,
    /// The request named a service this endpoint does not serve.
    #[serde(rename = "io.systemd.UserDatabase.BadService")]
    BadService,
    /// A point lookup matched nothing.
    #[serde(rename = "io.systemd.UserDatabase.NoRecordFound")]
    NoRecordFound,
    /// The method is not supported by this endpoint.
    #[serde(rename = "org.varlink.service.MethodNotImplemented")]
    Unimplemented,
}

impl ErrorCode {
    /// Wire representation of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnumerationNotSupported => "io.systemd.UserDatabase.EnumerationNotSupported",
            Self::ConflictingRecordFound => "io.systemd.UserDatabase.ConflictingRecordFound",
            Self::ServiceNotAvailable => "io.systemd.UserDatabase.ServiceNotAvailable",
            Self::BadService => "io.systemd.UserDatabase.BadService",
            Self::NoRecordFound => "io.systemd.UserDatabase.NoRecordFound",
            Self::Unimplemented => "org.varlink.service.MethodNotImplemented",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
