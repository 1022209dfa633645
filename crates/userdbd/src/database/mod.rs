//! User database backends.
//!
//! A backend answers each request with a lazily evaluated sequence of
//! replies. The session drains the sequence onto the connection, stopping at
//! the first terminal reply, so a backend streaming many records never
//! materializes them all at once.

mod errors;
mod lookup;
mod static_database;

use userdb_protocol::{
    ErrorCode, GetGroupRecordReply, GetGroupRecordReplyParams, GetGroupRecordRequest,
    GetMembershipsReply, GetMembershipsReplyParams, GetMembershipsRequest, GetUserRecordReply,
    GetUserRecordReplyParams, GetUserRecordRequest, Reply,
};

use crate::cancellation::CancellationToken;

pub use self::errors::DatabaseError;
pub use self::lookup::UserRecordLookup;
pub use self::static_database::StaticDatabase;

/// Lazily produced replies to one request.
pub type Replies<P> = Box<dyn Iterator<Item = Reply<P>> + Send>;

/// Source of user, group and membership records.
///
/// Only user lookups are required. Group and membership lookups answer with
/// a single `MethodNotImplemented` error unless a backend overrides them.
pub trait UserDatabase: Send + Sync {
    /// Answers a `GetUserRecord` request.
    ///
    /// `cancel` is cancelled when the caller stops consuming replies or the
    /// service shuts down.
    fn get_user_record(
        &self,
        request: &GetUserRecordRequest,
        cancel: &CancellationToken,
    ) -> Replies<GetUserRecordReplyParams>;

    /// Answers a `GetGroupRecord` request.
    fn get_group_record(
        &self,
        _request: &GetGroupRecordRequest,
        _cancel: &CancellationToken,
    ) -> Replies<GetGroupRecordReplyParams> {
        single(GetGroupRecordReply::error(ErrorCode::Unimplemented))
    }

    /// Answers a `GetMemberships` request.
    fn get_memberships(
        &self,
        _request: &GetMembershipsRequest,
        _cancel: &CancellationToken,
    ) -> Replies<GetMembershipsReplyParams> {
        single(GetMembershipsReply::error(ErrorCode::Unimplemented))
    }
}

/// Wraps one terminal reply.
pub fn single<P: Send + 'static>(reply: Reply<P>) -> Replies<P> {
    Box::new(std::iter::once(reply))
}

/// Convenience for backends that answer a user lookup with one error.
pub(crate) fn user_error(code: ErrorCode) -> Replies<GetUserRecordReplyParams> {
    single(GetUserRecordReply::error(code))
}
