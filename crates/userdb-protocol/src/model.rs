//! JSON schema of user and group records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identity fields shared by a record and its overlays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFields {
    /// Login name.
    pub user_name: String,
    /// Numeric user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    /// Numeric primary group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
}

impl UserFields {
    /// Builds fields carrying only a user name.
    #[must_use]
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            uid: None,
            gid: None,
        }
    }
}

/// Overrides applied only on machines matching the predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerMachine {
    /// Machine id the override applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_machine_id: Option<String>,
    /// Host name the override applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_hostname: Option<String>,
    /// Overriding identity fields.
    #[serde(flatten)]
    pub fields: UserFields,
}

/// Operational facts a service reports about the storage behind a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Bytes used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_usage: Option<u64>,
    /// Bytes free.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_free: Option<u64>,
    /// Total size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<u64>,
    /// Upper bound for resizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_ceiling: Option<u64>,
    /// Lower bound for resizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_floor: Option<u64>,
    /// Lifecycle state, for example `active`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Name of the reporting service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// A user account as exchanged on the wire.
///
/// Records are built once per reply and never mutated after they are handed
/// to the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Identity fields, flattened into the record object.
    #[serde(flatten)]
    pub fields: UserFields,
    /// Overlay visible only to privileged callers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<UserFields>,
    /// Overrides keyed by machine or service id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binding: BTreeMap<String, UserFields>,
    /// Machine-scoped override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_machine: Option<PerMachine>,
    /// Storage status keyed by reporting service.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub status: BTreeMap<String, Status>,
}

impl UserRecord {
    /// Builds a record carrying only a user name.
    #[must_use]
    pub fn new(user_name: impl Into<String>) -> Self {
        Self::from_fields(UserFields::new(user_name))
    }

    /// Builds a record from identity fields.
    #[must_use]
    pub fn from_fields(fields: UserFields) -> Self {
        Self {
            fields,
            privileged: None,
            binding: BTreeMap::new(),
            per_machine: None,
            status: BTreeMap::new(),
        }
    }

    /// Sets the numeric user id.
    #[must_use]
    pub fn with_uid(mut self, uid: u32) -> Self {
        self.fields.uid = Some(uid);
        self
    }

    /// Sets the numeric primary group id.
    #[must_use]
    pub fn with_gid(mut self, gid: u32) -> Self {
        self.fields.gid = Some(gid);
        self
    }

    /// Adds a status entry for the given service.
    #[must_use]
    pub fn with_status(mut self, service: impl Into<String>, status: Status) -> Self {
        self.status.insert(service.into(), status);
        self
    }

    /// Login name.
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.fields.user_name
    }

    /// Numeric user id.
    #[must_use]
    pub fn uid(&self) -> Option<u32> {
        self.fields.uid
    }
}

/// A group as exchanged on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    /// Group name.
    pub group_name: String,
    /// Numeric group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
}
