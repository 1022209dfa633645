//! Discovery of backend services in the runtime directory.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::debug;

use super::MULTIPLEXER_TARGET;

/// A backend service reachable over a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Service name, equal to the socket's file name.
    pub name: String,
    /// Socket path.
    pub path: Utf8PathBuf,
}

impl ServiceEndpoint {
    /// Creates an endpoint.
    pub fn new(name: impl Into<String>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Errors raised while listing backend services.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to list services in {path}: {source}")]
    List {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Source of the backend services a multiplexer fans out to.
pub trait ServiceDirectory: Send + Sync {
    /// Lists the currently available services.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the listing itself fails.
    fn services(&self) -> Result<Vec<ServiceEndpoint>, DirectoryError>;
}

/// Directory of service sockets, one socket per service name.
///
/// Entries that are not sockets, are not valid UTF-8, or carry the excluded
/// name (normally the multiplexer's own) are skipped.
#[derive(Debug, Clone)]
pub struct SocketDirectory {
    path: Utf8PathBuf,
    exclude: String,
}

impl SocketDirectory {
    /// Lists sockets in `path`, skipping `exclude`.
    pub fn new(path: impl Into<Utf8PathBuf>, exclude: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            exclude: exclude.into(),
        }
    }
}

impl ServiceDirectory for SocketDirectory {
    fn services(&self) -> Result<Vec<ServiceEndpoint>, DirectoryError> {
        let list_error = |source: io::Error| DirectoryError::List {
            path: self.path.clone(),
            source,
        };
        let mut services = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(list_error)? {
            let entry = entry.map_err(list_error)?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name == self.exclude {
                continue;
            }
            match entry.file_type() {
                Ok(file_type) if file_type.is_socket() => {
                    let path = self.path.join(&name);
                    services.push(ServiceEndpoint::new(name, path));
                }
                Ok(_) => {}
                Err(error) => {
                    debug!(
                        target: MULTIPLEXER_TARGET,
                        %error,
                        entry = %name,
                        "skipping unreadable directory entry"
                    );
                }
            }
        }
        services.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(services)
    }
}
