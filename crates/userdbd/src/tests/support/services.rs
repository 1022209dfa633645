//! Helpers that run real services on sockets inside a temporary directory.

use std::io::Read;
use std::os::unix::net::UnixListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use crossbeam_channel::{Receiver, bounded};
use tempfile::TempDir;
use userdb_protocol::{
    GetUserRecordReply, GetUserRecordReplyParams, GetUserRecordRequestParams, Method, Request,
    UserRecord,
};

use crate::cancellation::CancellationToken;
use crate::database::{StaticDatabase, UserDatabase};
use crate::dispatch::DispatchConnectionHandler;
use crate::multiplexer::BackendTimeouts;
use crate::transport::{ListenerHandle, SocketListener};

const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Backend limits used by multiplexers under test.
pub const BACKEND_TIMEOUTS: BackendTimeouts = BackendTimeouts {
    connect: Duration::from_secs(2),
    reply: Duration::from_secs(30),
};

/// Creates a temporary directory and returns it with its UTF-8 path.
pub fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("create temporary directory");
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .expect("temporary directory path was not valid UTF-8");
    (dir, path)
}

/// Service listening on `<directory>/<name>` until dropped.
pub struct RunningService {
    path: Utf8PathBuf,
    handle: Option<ListenerHandle>,
}

impl RunningService {
    /// Serves `database` under `name`.
    pub fn start(directory: &Utf8Path, name: &str, database: Arc<dyn UserDatabase>) -> Self {
        let path = directory.join(name);
        let listener = SocketListener::bind(&path).expect("bind service socket");
        let handler = Arc::new(DispatchConnectionHandler::new(name, database));
        let handle = listener
            .start(handler, CancellationToken::new())
            .expect("start service listener");
        Self {
            path,
            handle: Some(handle),
        }
    }

    /// Serves a static set of records under `name`.
    pub fn with_records(directory: &Utf8Path, name: &str, records: Vec<UserRecord>) -> Self {
        Self::start(directory, name, Arc::new(StaticDatabase::new(records)))
    }

    /// Socket path of the service.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for RunningService {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
            let _ = handle.join();
        }
    }
}

/// Backend that accepts one connection, reads the request and never answers.
pub struct StalledService {
    released: Receiver<()>,
}

impl StalledService {
    /// Listens on `<directory>/<name>`.
    pub fn start(directory: &Utf8Path, name: &str) -> Self {
        let listener = UnixListener::bind(directory.join(name)).expect("bind stalled socket");
        let (sender, released) = bounded(1);
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut buf = [0_u8; 256];
            while matches!(stream.read(&mut buf), Ok(count) if count > 0) {}
            let _ = sender.send(());
        });
        Self { released }
    }

    /// Whether the client closed its connection within `timeout`.
    pub fn released_within(&self, timeout: Duration) -> bool {
        self.released.recv_timeout(timeout).is_ok()
    }
}

/// Leaves a socket file behind with nobody listening on it.
pub fn stale_socket(directory: &Utf8Path, name: &str) -> Utf8PathBuf {
    let path = directory.join(name);
    drop(UnixListener::bind(&path).expect("bind stale socket"));
    path
}

/// Sends one `GetUserRecord` request and collects every reply.
pub fn query_users(
    path: &Utf8Path,
    parameters: GetUserRecordRequestParams,
    more: bool,
) -> Vec<GetUserRecordReply> {
    let request = Request::new(Method::GetUserRecord, parameters, more);
    userdb_protocol::query::<GetUserRecordReplyParams, _>(
        path.as_std_path(),
        QUERY_TIMEOUT,
        &request,
    )
    .expect("send query")
    .collect_replies()
    .expect("collect replies")
}
