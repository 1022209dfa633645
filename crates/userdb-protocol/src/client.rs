//! Blocking client for user database services.
//!
//! A query opens one connection, writes one request and then reads replies
//! until one arrives without the `continues` flag. The connection is never
//! reused for a second request.

use std::io::{self, Read, Write};
use std::marker::PhantomData;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use socket2::{Domain, SockAddr, Socket, Type};
use thiserror::Error;

use crate::codec::{self, CodecError, MessageReader};
use crate::message::{Reply, Request};

/// Errors raised while querying a service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service socket could not be reached.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        /// Socket path.
        path: PathBuf,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Framing or parsing failed on the connection.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Connects to a service socket within `timeout`.
///
/// # Errors
///
/// Returns [`ClientError::Connect`] when the socket is missing, refuses the
/// connection, or does not accept it in time.
pub fn connect(path: &Path, timeout: Duration) -> Result<UnixStream, ClientError> {
    connect_unix(path, timeout).map_err(|source| ClientError::Connect {
        path: path.to_path_buf(),
        source,
    })
}

fn connect_unix(path: &Path, timeout: Duration) -> io::Result<UnixStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, timeout)?;
    Ok(socket.into())
}

/// Connects to `path`, sends `request`, and returns the reply stream.
///
/// # Errors
///
/// Returns an error if connecting or writing the request fails.
pub fn query<P, Q>(
    path: &Path,
    timeout: Duration,
    request: &Request<Q>,
) -> Result<ReplyStream<UnixStream, P>, ClientError>
where
    P: DeserializeOwned + Default,
    Q: Serialize,
{
    let stream = connect(path, timeout)?;
    ReplyStream::start(stream, request)
}

/// Iterator over the replies to one request.
///
/// The iterator yields each reply in arrival order and stops after the
/// terminal reply or after the first error.
#[derive(Debug)]
pub struct ReplyStream<S, P> {
    reader: MessageReader<S>,
    finished: bool,
    _reply: PhantomData<fn() -> P>,
}

impl<S, P> ReplyStream<S, P>
where
    S: Read + Write,
    P: DeserializeOwned + Default,
{
    /// Writes `request` on `stream` and prepares to read its replies.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be encoded or written.
    pub fn start<Q: Serialize>(mut stream: S, request: &Request<Q>) -> Result<Self, ClientError> {
        codec::encode(&mut stream, request)?;
        Ok(Self {
            reader: MessageReader::new(stream),
            finished: false,
            _reply: PhantomData,
        })
    }

    /// Collects every reply, failing on the first error.
    ///
    /// # Errors
    ///
    /// Returns the first framing or transport error encountered.
    pub fn collect_replies(self) -> Result<Vec<Reply<P>>, ClientError> {
        self.collect()
    }
}

impl<S, P> Iterator for ReplyStream<S, P>
where
    S: Read + Write,
    P: DeserializeOwned + Default,
{
    type Item = Result<Reply<P>, ClientError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.reader.decode::<Reply<P>>() {
            Ok(reply) => {
                self.finished = reply.is_terminal();
                Some(Ok(reply))
            }
            Err(error) => {
                self.finished = true;
                Some(Err(error.into()))
            }
        }
    }
}
