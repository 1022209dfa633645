//! Fan-in of backend reply streams.
//!
//! One worker thread per backend forwards that backend's replies into a
//! bounded channel. [`MergedReplies`] consumes the channel on the session
//! thread, holding back one record so that the last merged record can be sent
//! as the terminal reply once every backend has finished.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use tracing::{debug, warn};
use userdb_protocol::{
    ClientError, ErrorCode, GetUserRecordReply, GetUserRecordReplyParams, GetUserRecordRequest,
    ReplyStream, client,
};

use super::MULTIPLEXER_TARGET;
use super::directory::ServiceEndpoint;
use crate::cancellation::{CancellableStream, CancellationToken, POLL_INTERVAL};

const CHANNEL_CAPACITY: usize = 64;

/// Limits applied to every backend query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    /// Budget for the backend to accept the connection.
    pub connect: Duration,
    /// Longest silence tolerated while waiting on the backend. A backend that
    /// exceeds it is counted as failed.
    pub reply: Duration,
}

#[derive(Debug)]
enum BackendEvent {
    Reply {
        service: String,
        reply: GetUserRecordReply,
    },
    Finished {
        service: String,
    },
    Failed {
        service: String,
        error: ClientError,
    },
}

/// Merged reply stream over every backend queried for one request.
///
/// Records are forwarded in arrival order. When no record arrives, the
/// terminal reply reports a conflict if any backend saw one, then
/// `ServiceNotAvailable` if every backend failed, then `NoRecordFound` for a
/// point lookup, and otherwise carries neither record nor error. Dropping the
/// stream cancels the outstanding backend queries.
pub struct MergedReplies {
    events: Receiver<BackendEvent>,
    backends: usize,
    pending: usize,
    failed: usize,
    conflict: bool,
    more: bool,
    point_lookup: bool,
    held: Option<GetUserRecordReply>,
    token: CancellationToken,
    finished: bool,
}

impl MergedReplies {
    /// Starts querying `backends` with `request`.
    ///
    /// Each backend receives a copy of the request addressed to its own
    /// service name. Workers observe `token` and stop once it is cancelled.
    pub fn spawn(
        backends: Vec<ServiceEndpoint>,
        request: &GetUserRecordRequest,
        token: CancellationToken,
        timeouts: BackendTimeouts,
    ) -> Self {
        let (sender, events) = bounded(CHANNEL_CAPACITY);
        let count = backends.len();
        for endpoint in backends {
            let mut request = request.clone();
            request.parameters.service.clone_from(&endpoint.name);
            let sender = sender.clone();
            let token = token.clone();
            thread::spawn(move || {
                run_backend(&endpoint, &request, timeouts, &token, &sender);
            });
        }
        Self {
            events,
            backends: count,
            pending: count,
            failed: 0,
            conflict: false,
            more: request.more,
            point_lookup: request.parameters.is_point_lookup(),
            held: None,
            token,
            finished: false,
        }
    }

    fn absorb(&mut self, event: BackendEvent) -> Option<GetUserRecordReply> {
        match event {
            BackendEvent::Reply { service, reply } => {
                if let Some(record) = reply.parameters.record {
                    let merged = GetUserRecordReply::record(record);
                    if !self.more {
                        return Some(self.finish_with(merged));
                    }
                    return self
                        .held
                        .replace(merged)
                        .map(|previous| previous.with_continues(true));
                }
                if let Some(code) = reply.error {
                    self.conflict |= code == ErrorCode::ConflictingRecordFound;
                    debug!(
                        target: MULTIPLEXER_TARGET,
                        %service,
                        error = %code,
                        "backend reported error"
                    );
                }
                None
            }
            BackendEvent::Finished { service } => {
                self.pending -= 1;
                debug!(target: MULTIPLEXER_TARGET, %service, "backend finished");
                None
            }
            BackendEvent::Failed { service, error } => {
                self.pending -= 1;
                self.failed += 1;
                warn!(
                    target: MULTIPLEXER_TARGET,
                    %service,
                    %error,
                    "backend query failed"
                );
                None
            }
        }
    }

    fn terminal(&mut self) -> GetUserRecordReply {
        let reply = if let Some(last) = self.held.take() {
            last
        } else if self.conflict {
            GetUserRecordReply::error(ErrorCode::ConflictingRecordFound)
        } else if self.backends > 0 && self.failed == self.backends {
            GetUserRecordReply::error(ErrorCode::ServiceNotAvailable)
        } else if self.point_lookup {
            GetUserRecordReply::error(ErrorCode::NoRecordFound)
        } else {
            GetUserRecordReply::empty()
        };
        self.finish_with(reply)
    }

    fn finish_with(&mut self, reply: GetUserRecordReply) -> GetUserRecordReply {
        self.finished = true;
        self.token.cancel();
        reply.with_continues(false)
    }
}

impl Iterator for MergedReplies {
    type Item = GetUserRecordReply;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        while self.pending > 0 {
            if self.token.is_cancelled() {
                self.finished = true;
                return None;
            }
            let event = match self.events.recv_timeout(POLL_INTERVAL) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!(
                        target: MULTIPLEXER_TARGET,
                        lost = self.pending,
                        "backend workers exited without reporting"
                    );
                    self.failed += self.pending;
                    self.pending = 0;
                    break;
                }
            };
            if let Some(reply) = self.absorb(event) {
                return Some(reply);
            }
        }
        Some(self.terminal())
    }
}

impl Drop for MergedReplies {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

fn run_backend(
    endpoint: &ServiceEndpoint,
    request: &GetUserRecordRequest,
    timeouts: BackendTimeouts,
    token: &CancellationToken,
    sender: &Sender<BackendEvent>,
) {
    let service = endpoint.name.clone();
    let event = match query_backend(endpoint, request, timeouts, token, sender) {
        Ok(()) => BackendEvent::Finished { service },
        Err(error) => BackendEvent::Failed { service, error },
    };
    if sender.send(event).is_err() {
        debug!(
            target: MULTIPLEXER_TARGET,
            service = %endpoint.name,
            "merge stopped before backend completed"
        );
    }
}

fn query_backend(
    endpoint: &ServiceEndpoint,
    request: &GetUserRecordRequest,
    timeouts: BackendTimeouts,
    token: &CancellationToken,
    sender: &Sender<BackendEvent>,
) -> Result<(), ClientError> {
    let path = endpoint.path.as_std_path();
    let stream = client::connect(path, timeouts.connect)?;
    let stream = CancellableStream::for_unix(stream, token.clone())
        .map_err(|source| ClientError::Connect {
            path: path.to_path_buf(),
            source,
        })?
        .with_idle_limit(timeouts.reply);
    let replies = ReplyStream::<_, GetUserRecordReplyParams>::start(stream, request)?;
    for reply in replies {
        let event = BackendEvent::Reply {
            service: endpoint.name.clone(),
            reply: reply?,
        };
        if sender.send(event).is_err() {
            break;
        }
    }
    Ok(())
}
