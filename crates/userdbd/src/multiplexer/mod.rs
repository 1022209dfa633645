//! Multiplexing service that merges every backend in the runtime directory.
//!
//! The multiplexer discovers backends by listing the socket directory on each
//! request, queries them concurrently and merges their replies into one
//! stream. It answers as an ordinary [`UserDatabase`], so it is served through
//! the same dispatch path as any other backend.

mod directory;
mod merge;

use tracing::{debug, warn};
use userdb_protocol::{ErrorCode, GetUserRecordReplyParams, GetUserRecordRequest};

use crate::cancellation::CancellationToken;
use crate::database::{Replies, UserDatabase, user_error};

pub use self::directory::{DirectoryError, ServiceDirectory, ServiceEndpoint, SocketDirectory};
pub use self::merge::{BackendTimeouts, MergedReplies};

/// Tracing target for multiplexer operations.
pub(crate) const MULTIPLEXER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::multiplexer");

/// Database merging the records of every discovered backend.
#[derive(Debug, Clone)]
pub struct Multiplexer<D> {
    directory: D,
    timeouts: BackendTimeouts,
}

impl<D: ServiceDirectory> Multiplexer<D> {
    /// Creates a multiplexer over `directory`.
    pub fn new(directory: D, timeouts: BackendTimeouts) -> Self {
        Self {
            directory,
            timeouts,
        }
    }
}

impl<D: ServiceDirectory> UserDatabase for Multiplexer<D> {
    fn get_user_record(
        &self,
        request: &GetUserRecordRequest,
        cancel: &CancellationToken,
    ) -> Replies<GetUserRecordReplyParams> {
        if !request.parameters.is_point_lookup() && !request.more {
            return user_error(ErrorCode::Unimplemented);
        }
        let backends = match self.directory.services() {
            Ok(backends) => backends,
            Err(error) => {
                warn!(target: MULTIPLEXER_TARGET, %error, "failed to list backend services");
                return user_error(ErrorCode::ServiceNotAvailable);
            }
        };
        debug!(
            target: MULTIPLEXER_TARGET,
            backends = backends.len(),
            more = request.more,
            "querying backends"
        );
        Box::new(MergedReplies::spawn(
            backends,
            request,
            cancel.child(),
            self.timeouts,
        ))
    }
}
