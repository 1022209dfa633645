//! Request and reply envelopes for the `io.systemd.UserDatabase` interface.
//!
//! Every method shares one envelope shape. Requests carry the method name,
//! typed parameters and the `more` flag; replies carry typed parameters, the
//! `continues` flag and an optional [`ErrorCode`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::model::{GroupRecord, UserRecord};

/// Methods of the user database interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Look up or enumerate user records.
    GetUserRecord,
    /// Look up or enumerate group records.
    GetGroupRecord,
    /// Enumerate user/group memberships.
    GetMemberships,
}

impl Method {
    /// Every declared method.
    pub const ALL: [Self; 3] = [Self::GetUserRecord, Self::GetGroupRecord, Self::GetMemberships];

    /// Fully qualified method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetUserRecord => "io.systemd.UserDatabase.GetUserRecord",
            Self::GetGroupRecord => "io.systemd.UserDatabase.GetGroupRecord",
            Self::GetMemberships => "io.systemd.UserDatabase.GetMemberships",
        }
    }

    /// Resolves a fully qualified method name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == name)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request<P> {
    /// Fully qualified method name.
    pub method: String,
    /// Method parameters.
    pub parameters: P,
    /// Whether the caller accepts a multi-message reply.
    #[serde(default)]
    pub more: bool,
}

impl<P> Request<P> {
    /// Builds a request for the given method.
    #[must_use]
    pub fn new(method: Method, parameters: P, more: bool) -> Self {
        Self {
            method: method.as_str().to_string(),
            parameters,
            more,
        }
    }
}

/// Reply envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "P: Serialize",
    deserialize = "P: Deserialize<'de> + Default"
))]
pub struct Reply<P> {
    /// Method-specific reply parameters.
    #[serde(default)]
    pub parameters: P,
    /// Whether another reply follows for the same request.
    #[serde(default, skip_serializing_if = "is_false")]
    pub continues: bool,
    /// Error reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl<P> Reply<P> {
    /// Builds a terminal reply carrying parameters.
    #[must_use]
    pub const fn new(parameters: P) -> Self {
        Self {
            parameters,
            continues: false,
            error: None,
        }
    }

    /// Builds a terminal error reply with empty parameters.
    #[must_use]
    pub fn error(code: ErrorCode) -> Self
    where
        P: Default,
    {
        Self {
            parameters: P::default(),
            continues: false,
            error: Some(code),
        }
    }

    /// Sets the continuation flag.
    #[must_use]
    pub const fn with_continues(mut self, continues: bool) -> Self {
        self.continues = continues;
        self
    }

    /// Whether this reply ends the stream for its request.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !self.continues
    }
}

/// Parameters of `GetUserRecord`.
///
/// Setting neither `user_name` nor `uid` together with `more` asks for every
/// record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserRecordRequestParams {
    /// Login name to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Numeric user id to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    /// Service addressed by the request.
    #[serde(default)]
    pub service: String,
}

impl GetUserRecordRequestParams {
    /// Parameters that enumerate every record of `service`.
    #[must_use]
    pub fn all(service: impl Into<String>) -> Self {
        Self {
            user_name: None,
            uid: None,
            service: service.into(),
        }
    }

    /// Parameters that look a user up by name.
    #[must_use]
    pub fn by_name(service: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_name: Some(user_name.into()),
            uid: None,
            service: service.into(),
        }
    }

    /// Parameters that look a user up by numeric id.
    #[must_use]
    pub fn by_uid(service: impl Into<String>, uid: u32) -> Self {
        Self {
            user_name: None,
            uid: Some(uid),
            service: service.into(),
        }
    }

    /// Whether the parameters name a specific user.
    #[must_use]
    pub const fn is_point_lookup(&self) -> bool {
        self.user_name.is_some() || self.uid.is_some()
    }
}

/// Reply parameters of `GetUserRecord`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserRecordReplyParams {
    /// Matched record; absent on error or at the end of an empty stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<UserRecord>,
}

/// Parameters of `GetGroupRecord`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetGroupRecordRequestParams {
    /// Group name to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// Numeric group id to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    /// Service addressed by the request.
    #[serde(default)]
    pub service: String,
}

/// Reply parameters of `GetGroupRecord`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetGroupRecordReplyParams {
    /// Matched record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<GroupRecord>,
}

/// Parameters of `GetMemberships`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMembershipsRequestParams {
    /// Restrict to memberships of this user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Restrict to members of this group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// Service addressed by the request.
    #[serde(default)]
    pub service: String,
}

/// Reply parameters of `GetMemberships`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMembershipsReplyParams {
    /// Member user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Group name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

/// `GetUserRecord` request.
pub type GetUserRecordRequest = Request<GetUserRecordRequestParams>;
/// `GetUserRecord` reply.
pub type GetUserRecordReply = Reply<GetUserRecordReplyParams>;
/// `GetGroupRecord` request.
pub type GetGroupRecordRequest = Request<GetGroupRecordRequestParams>;
/// `GetGroupRecord` reply.
pub type GetGroupRecordReply = Reply<GetGroupRecordReplyParams>;
/// `GetMemberships` request.
pub type GetMembershipsRequest = Request<GetMembershipsRequestParams>;
/// `GetMemberships` reply.
pub type GetMembershipsReply = Reply<GetMembershipsReplyParams>;

impl GetUserRecordReply {
    /// Builds a terminal reply carrying a record.
    #[must_use]
    pub const fn record(record: UserRecord) -> Self {
        Self::new(GetUserRecordReplyParams {
            record: Some(record),
        })
    }

    /// Builds a terminal reply with no record and no error.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(GetUserRecordReplyParams { record: None })
    }
}
