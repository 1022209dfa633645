//! Cooperative cancellation shared by the listener, sessions and multiplexer
//! workers.
//!
//! Blocking socket calls cannot be interrupted directly, so every stream is
//! given a short read/write timeout and [`CancellableStream`] re-checks the
//! token each time an operation times out. An optional idle limit bounds how
//! long a single operation may make no progress at all.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Interval at which blocked I/O re-checks its cancellation token.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared flag signalling that work should stop.
///
/// Child tokens observe their own flag and every ancestor's, so cancelling a
/// parent stops all derived work while a child can be cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<CancellationToken>>,
}

impl CancellationToken {
    /// Creates a root token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a token cancelled together with `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Requests cancellation of this token and its children.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether this token or any ancestor was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.is_cancelled())
    }
}

/// Stream wrapper whose blocking operations give up once cancelled.
#[derive(Debug)]
pub struct CancellableStream<S> {
    inner: S,
    token: CancellationToken,
    idle_limit: Option<Duration>,
}

impl<S> CancellableStream<S> {
    /// Wraps a stream whose timeouts are already configured.
    pub fn new(inner: S, token: CancellationToken) -> Self {
        Self {
            inner,
            token,
            idle_limit: None,
        }
    }

    /// Fails any single read or write that stalls for longer than `limit`
    /// with [`io::ErrorKind::TimedOut`].
    #[must_use]
    pub fn with_idle_limit(mut self, limit: Duration) -> Self {
        self.idle_limit = Some(limit);
        self
    }

    /// Token observed by this stream.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    fn retry<T>(&mut self, mut operation: impl FnMut(&mut S) -> io::Result<T>) -> io::Result<T> {
        let started = Instant::now();
        loop {
            if self.token.is_cancelled() {
                return Err(cancelled());
            }
            match operation(&mut self.inner) {
                Err(error) if is_poll_timeout(&error) => {
                    if self
                        .idle_limit
                        .is_some_and(|limit| started.elapsed() >= limit)
                    {
                        return Err(idle_expired());
                    }
                }
                result => return result,
            }
        }
    }
}

impl CancellableStream<UnixStream> {
    /// Wraps a Unix stream, arming the poll timeouts.
    pub fn for_unix(stream: UnixStream, token: CancellationToken) -> io::Result<Self> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(POLL_INTERVAL))?;
        stream.set_write_timeout(Some(POLL_INTERVAL))?;
        Ok(Self::new(stream, token))
    }
}

fn cancelled() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionAborted, "operation cancelled")
}

fn idle_expired() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "peer stayed silent past the idle limit")
}

fn is_poll_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

impl<S: Read> Read for CancellableStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.retry(|inner| inner.read(buf))
    }
}

impl<S: Write> Write for CancellableStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.retry(|inner| inner.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Instant;

    use super::*;

    #[test]
    fn child_follows_parent() {
        let parent = CancellationToken::new();
        let child = parent.child();
        assert!(!child.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn child_cancellation_does_not_reach_parent() {
        let parent = CancellationToken::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn blocked_read_returns_after_cancel() {
        let (local, _peer) = UnixStream::pair().expect("socket pair");
        let token = CancellationToken::new();
        let mut stream = CancellableStream::for_unix(local, token.clone()).expect("wrap stream");

        let started = Instant::now();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            token.cancel();
        });
        let mut buf = [0_u8; 8];
        let error = stream.read(&mut buf).expect_err("read should abort");
        assert_eq!(error.kind(), io::ErrorKind::ConnectionAborted);
        assert!(started.elapsed() < Duration::from_secs(2));
        canceller.join().expect("join canceller");
    }

    #[test]
    fn reads_pass_through_before_cancel() {
        let (local, mut peer) = UnixStream::pair().expect("socket pair");
        let mut stream =
            CancellableStream::for_unix(local, CancellationToken::new()).expect("wrap stream");
        peer.write_all(b"ok").expect("write");
        let mut buf = [0_u8; 2];
        stream.read_exact(&mut buf).expect("read");
        assert_eq!(&buf, b"ok");
    }

    #[test]
    fn silent_peer_trips_idle_limit() {
        let (local, _peer) = UnixStream::pair().expect("socket pair");
        let mut stream = CancellableStream::for_unix(local, CancellationToken::new())
            .expect("wrap stream")
            .with_idle_limit(Duration::from_millis(250));

        let started = Instant::now();
        let mut buf = [0_u8; 8];
        let error = stream.read(&mut buf).expect_err("read should time out");
        assert_eq!(error.kind(), io::ErrorKind::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn idle_limit_restarts_for_each_read() {
        let (local, mut peer) = UnixStream::pair().expect("socket pair");
        let mut stream = CancellableStream::for_unix(local, CancellationToken::new())
            .expect("wrap stream")
            .with_idle_limit(Duration::from_millis(300));
        let writer = thread::spawn(move || {
            for chunk in [b"a", b"b", b"c"] {
                thread::sleep(Duration::from_millis(200));
                peer.write_all(chunk).expect("write");
            }
        });

        let mut buf = [0_u8; 3];
        stream.read_exact(&mut buf).expect("each read sees progress");
        assert_eq!(&buf, b"abc");
        writer.join().expect("join writer");
    }
}
