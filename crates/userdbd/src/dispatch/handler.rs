//! Connection handler that serves one request per connection.
//!
//! This module provides the `DispatchConnectionHandler` which implements the
//! `ConnectionHandler` trait from the transport layer. It reads exactly one
//! NUL-terminated request, routes it and streams the replies before closing
//! the connection. Anything the client sends after the first request is
//! ignored.

use std::sync::Arc;

use tracing::{debug, warn};
use userdb_protocol::MessageReader;

use crate::database::UserDatabase;
use crate::transport::{ConnectionHandler, ConnectionStream};

use super::errors::DispatchError;
use super::request::RequestEnvelope;
use super::response::{DispatchResult, ReplyWriter};
use super::router::{DISPATCH_TARGET, MethodRouter};

/// Connection handler that parses and dispatches user database requests.
pub struct DispatchConnectionHandler {
    router: MethodRouter,
}

impl DispatchConnectionHandler {
    /// Creates a handler serving `database` under the name `service`.
    pub fn new(service: impl Into<String>, database: Arc<dyn UserDatabase>) -> Self {
        Self {
            router: MethodRouter::new(service, database),
        }
    }

    /// Handles a connection by reading the request and dispatching.
    fn dispatch(
        &self,
        mut stream: ConnectionStream,
    ) -> Result<Option<DispatchResult>, DispatchError> {
        let frame = {
            let mut reader = MessageReader::new(&mut stream);
            reader.read_frame().map_err(DispatchError::Read)?
        };
        let Some(frame) = frame else {
            debug!(target: DISPATCH_TARGET, "client disconnected without request");
            return Ok(None);
        };

        let envelope = RequestEnvelope::parse(&frame)?;
        debug!(
            target: DISPATCH_TARGET,
            method = %envelope.method,
            more = envelope.more,
            service = self.router.service(),
            "dispatching request"
        );

        let cancel = stream.token().child();
        let mut writer = ReplyWriter::new(&mut stream, envelope.more);
        let result = self.router.route(envelope, &mut writer, &cancel);
        cancel.cancel();
        result.map(Some)
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        match self.dispatch(stream) {
            Ok(Some(result)) if !result.terminated => {
                warn!(
                    target: DISPATCH_TARGET,
                    replies = result.replies,
                    "reply stream ended without a terminal reply"
                );
            }
            Ok(_) => {}
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "dispatch failed");
            }
        }
    }
}
