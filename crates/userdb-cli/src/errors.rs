//! Error types for the query runtime.

use std::io;
use std::sync::Arc;

use ortho_config::OrthoError;

use thiserror::Error;
use userdb_config::ServiceNameError;
use userdb_protocol::{ClientError, ErrorCode};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<OrthoError>),
    #[error("invalid service name: {0}")]
    ServiceName(#[from] ServiceNameError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to serialise reply: {0}")]
    SerialiseReply(serde_json::Error),
    #[error("failed to write reply: {0}")]
    WriteReply(io::Error),
    #[error("service replied with {}", .0.as_str())]
    Service(ErrorCode),
}
