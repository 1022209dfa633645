//! Method routing for request dispatch.
//!
//! Requests are routed on the envelope's method name. Known methods have
//! their parameters bound, their target service checked and are then handed
//! to the database. Unknown methods receive a `MethodNotImplemented` error.

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use userdb_protocol::{
    ErrorCode, GetGroupRecordRequest, GetMembershipsRequest, GetUserRecordRequest, Method, Request,
};

use super::errors::DispatchError;
use super::request::{RequestEnvelope, ServiceAddressed};
use super::response::{DispatchResult, ReplyWriter};
use crate::cancellation::CancellationToken;
use crate::database::{Replies, UserDatabase};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes requests to the database serving one service name.
pub struct MethodRouter {
    service: String,
    database: Arc<dyn UserDatabase>,
}

impl MethodRouter {
    /// Creates a router answering for `service`.
    pub fn new(service: impl Into<String>, database: Arc<dyn UserDatabase>) -> Self {
        Self {
            service: service.into(),
            database,
        }
    }

    /// Service name requests must be addressed to.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Routes `envelope` and streams its replies into `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters do not match the method's schema or
    /// a reply cannot be written.
    pub fn route<W: Write>(
        &self,
        envelope: RequestEnvelope,
        writer: &mut ReplyWriter<W>,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult, DispatchError> {
        let Some(method) = Method::parse(&envelope.method) else {
            debug!(
                target: DISPATCH_TARGET,
                method = %envelope.method,
                "unknown method"
            );
            return writer.write_error(ErrorCode::Unimplemented);
        };

        let database = &self.database;
        match method {
            Method::GetUserRecord => {
                self.serve(envelope, method, writer, |request: &GetUserRecordRequest| {
                    database.get_user_record(request, cancel)
                })
            }
            Method::GetGroupRecord => {
                self.serve(envelope, method, writer, |request: &GetGroupRecordRequest| {
                    database.get_group_record(request, cancel)
                })
            }
            Method::GetMemberships => {
                self.serve(envelope, method, writer, |request: &GetMembershipsRequest| {
                    database.get_memberships(request, cancel)
                })
            }
        }
    }

    fn serve<P, R, W, F>(
        &self,
        envelope: RequestEnvelope,
        method: Method,
        writer: &mut ReplyWriter<W>,
        lookup: F,
    ) -> Result<DispatchResult, DispatchError>
    where
        P: DeserializeOwned + ServiceAddressed,
        R: Serialize,
        W: Write,
        F: FnOnce(&Request<P>) -> Replies<R>,
    {
        let request = envelope.into_request::<P>(method)?;
        let target = request.parameters.service();
        if target != self.service {
            debug!(
                target: DISPATCH_TARGET,
                %method,
                requested = target,
                served = %self.service,
                "request addressed to another service"
            );
            return writer.write_error(ErrorCode::BadService);
        }
        writer.stream(lookup(&request))
    }
}
