use std::fs::DirBuilder;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Directory containing one socket per user database service.
///
/// Each service listens on `<directory>/<service name>`, so the directory
/// listing doubles as the registry of available services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeDirectory {
    path: Utf8PathBuf,
}

impl RuntimeDirectory {
    /// Wraps the given directory path.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Socket path for the named service.
    pub fn service_socket(&self, service: &str) -> Result<Utf8PathBuf, ServiceNameError> {
        validate_service_name(service)?;
        Ok(self.path.join(service))
    }

    /// Ensures the directory exists.
    ///
    /// The directory is world-readable because every service socket in it must
    /// be reachable by the multiplexer and by unprivileged callers.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }

        if let Err(source) = builder.create(self.path.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketPreparationError::CreateDirectory {
                path: self.path.clone(),
                source,
            });
        }

        Ok(())
    }
}

/// Checks that a service name can be used as a single path component.
pub fn validate_service_name(service: &str) -> Result<(), ServiceNameError> {
    if service.is_empty() {
        return Err(ServiceNameError::Empty);
    }
    if service == "." || service == ".." || service.contains('/') || service.contains('\0') {
        return Err(ServiceNameError::Invalid {
            service: service.to_string(),
        });
    }
    Ok(())
}

/// Errors raised for service names that cannot address a socket.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceNameError {
    /// The service name was empty.
    #[error("service name is empty")]
    Empty,
    /// The service name is not a single path component.
    #[error("service name '{service}' is not a valid socket file name")]
    Invalid { service: String },
}

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// Failed to create the runtime directory.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
