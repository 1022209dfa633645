//! Errors raised while loading records.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while loading a record directory.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to read record directory {path}: {source}")]
    ReadDirectory {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("record path {path} is not valid UTF-8")]
    NonUtf8Path { path: String },
    #[error("failed to read user record {path}: {source}")]
    ReadRecord {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse user record {path}: {source}")]
    ParseRecord {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
