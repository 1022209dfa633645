//! Request dispatch for the user database interface.
//!
//! This module reads the single request a client sends on a connection,
//! routes it by method name to the configured [`UserDatabase`] and streams the
//! replies back. The dispatcher integrates with the transport layer via the
//! `ConnectionHandler` trait.
//!
//! ## Protocol
//!
//! Clients send one NUL-terminated JSON request:
//!
//! ```json
//! {"method":"io.systemd.UserDatabase.GetUserRecord","parameters":{"service":"io.example.Db"},"more":true}
//! ```
//!
//! The service answers with one or more NUL-terminated replies. Every reply
//! but the last carries `"continues": true`:
//!
//! ```json
//! {"parameters":{"record":{"userName":"alice","uid":1000}},"continues":true}
//! {"parameters":{"record":{"userName":"bob","uid":1001}}}
//! ```
//!
//! Unknown methods are answered with `org.varlink.service.MethodNotImplemented`
//! and requests addressed to another service with
//! `io.systemd.UserDatabase.BadService`. Requests that cannot be parsed are
//! dropped without a reply.
//!
//! [`UserDatabase`]: crate::database::UserDatabase

mod errors;
mod handler;
mod request;
mod response;
mod router;

pub use self::errors::DispatchError;
pub(crate) use self::handler::DispatchConnectionHandler;
