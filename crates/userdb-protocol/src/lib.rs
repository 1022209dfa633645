//! Wire protocol for the systemd user database interface.
//!
//! Services exchange JSON messages over Unix domain sockets, each message
//! terminated by a single NUL byte. A caller sends exactly one request per
//! connection; the service answers with one or more replies, every reply but
//! the last carrying `"continues": true`.
//!
//! The crate provides the record model ([`model`]), the request and reply
//! envelopes ([`message`]), the error taxonomy ([`ErrorCode`]), the framing
//! codec ([`codec`]) and a blocking client ([`client`]).

#[cfg(unix)]
pub mod client;
pub mod codec;
mod error;
pub mod message;
pub mod model;

#[cfg(unix)]
pub use client::{ClientError, ReplyStream, connect, query};
pub use codec::{CodecError, MAX_MESSAGE_BYTES, MessageReader, NUL, encode, parse};
pub use error::ErrorCode;
pub use message::{
    GetGroupRecordReply, GetGroupRecordReplyParams, GetGroupRecordRequest,
    GetGroupRecordRequestParams, GetMembershipsReply, GetMembershipsReplyParams,
    GetMembershipsRequest, GetMembershipsRequestParams, GetUserRecordReply,
    GetUserRecordReplyParams, GetUserRecordRequest, GetUserRecordRequestParams, Method, Reply,
    Request,
};
pub use model::{GroupRecord, PerMachine, Status, UserFields, UserRecord};
