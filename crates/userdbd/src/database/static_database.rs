//! Backend serving a fixed set of records.

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;
use userdb_protocol::{GetUserRecordReplyParams, GetUserRecordRequest, UserRecord};

use super::{DatabaseError, Replies, UserDatabase, UserRecordLookup};
use crate::cancellation::CancellationToken;

const DATABASE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::database");
const RECORD_EXTENSION: &str = "user";

/// In-memory database over an immutable record list.
#[derive(Debug, Clone)]
pub struct StaticDatabase {
    records: Arc<[UserRecord]>,
    enumerable: bool,
}

impl StaticDatabase {
    /// Creates an enumerable database over `records`.
    #[must_use]
    pub fn new(records: Vec<UserRecord>) -> Self {
        Self {
            records: Arc::from(records),
            enumerable: true,
        }
    }

    /// Refuses enumeration requests with `EnumerationNotSupported`.
    #[must_use]
    pub fn without_enumeration(mut self) -> Self {
        self.enumerable = false;
        self
    }

    /// Loads every `*.user` JSON file in `directory`, ordered by file name.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the directory cannot be listed or a
    /// record file cannot be read or parsed.
    pub fn from_directory(directory: &Utf8Path) -> Result<Self, DatabaseError> {
        let entries = fs::read_dir(directory).map_err(|source| DatabaseError::ReadDirectory {
            path: directory.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DatabaseError::ReadDirectory {
                path: directory.to_path_buf(),
                source,
            })?;
            let path = Utf8PathBuf::from_path_buf(entry.path()).map_err(|path| {
                DatabaseError::NonUtf8Path {
                    path: path.display().to_string(),
                }
            })?;
            if path.extension() == Some(RECORD_EXTENSION) && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let records = paths
            .iter()
            .map(|path| load_record(path))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            target: DATABASE_TARGET,
            directory = %directory,
            records = records.len(),
            "loaded user records"
        );
        Ok(Self::new(records))
    }

    /// Number of records served.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the database holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn load_record(path: &Utf8Path) -> Result<UserRecord, DatabaseError> {
    let contents = fs::read(path).map_err(|source| DatabaseError::ReadRecord {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&contents).map_err(|source| DatabaseError::ParseRecord {
        path: path.to_path_buf(),
        source,
    })
}

impl UserDatabase for StaticDatabase {
    fn get_user_record(
        &self,
        request: &GetUserRecordRequest,
        _cancel: &CancellationToken,
    ) -> Replies<GetUserRecordReplyParams> {
        Box::new(UserRecordLookup::new(
            Arc::clone(&self.records),
            request,
            self.enumerable,
        ))
    }
}
