//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;
use userdb_config::Config;

use crate::bootstrap::ConfigLoader;

use super::services::utf8_tempdir;

/// Loader that places the runtime directory under a temporary directory.
pub struct TestConfigLoader {
    _dir: TempDir,
    runtime_directory: Utf8PathBuf,
    service: String,
    records_directory: Option<Utf8PathBuf>,
}

impl TestConfigLoader {
    /// Serves `service` from a fresh runtime directory.
    #[must_use]
    pub fn new(service: &str) -> Self {
        let (dir, path) = utf8_tempdir();
        Self {
            _dir: dir,
            runtime_directory: path.join("userdb"),
            service: service.to_owned(),
            records_directory: None,
        }
    }

    /// Serves records from `directory`.
    #[must_use]
    pub fn with_records_directory(mut self, directory: &Utf8Path) -> Self {
        self.records_directory = Some(directory.to_path_buf());
        self
    }

    /// Runtime directory handed to the service.
    #[must_use]
    pub fn runtime_directory(&self) -> &Utf8Path {
        &self.runtime_directory
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            runtime_directory: self.runtime_directory.clone(),
            service: self.service.clone(),
            records_directory: self.records_directory.clone(),
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("userdbd"),
            OsString::from("--connect-timeout-ms"),
            OsString::from("soon"),
        ];
        Config::load_from_iter(args)
    }
}
