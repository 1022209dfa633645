//! Behavioural tests for lookups against running services.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use tempfile::TempDir;
use userdb_config::MULTIPLEXER_SERVICE;
use userdb_protocol::{Reply, Request, UserRecord};

use crate::multiplexer::{Multiplexer, SocketDirectory};

use super::support::{BACKEND_TIMEOUTS, RunningService, stale_socket, utf8_tempdir};

const RECORD_SERVICE: &str = "io.example.Records";
const GET_USER_RECORD: &str = "io.systemd.UserDatabase.GetUserRecord";

struct LookupWorld {
    _dir: TempDir,
    directory: Utf8PathBuf,
    services: Vec<RunningService>,
    backends: usize,
    target: Option<(String, Utf8PathBuf)>,
    replies: Vec<Reply<Value>>,
}

impl LookupWorld {
    fn new() -> Self {
        let (dir, directory) = utf8_tempdir();
        Self {
            _dir: dir,
            directory,
            services: Vec::new(),
            backends: 0,
            target: None,
            replies: Vec::new(),
        }
    }

    fn users(count: usize) -> Vec<UserRecord> {
        (0..count)
            .map(|index| {
                let uid = u32::try_from(index).expect("small index") + 60_000;
                UserRecord::new(format!("user{index}")).with_uid(uid)
            })
            .collect()
    }

    fn serve(&mut self, name: &str, count: usize) {
        let service = RunningService::with_records(&self.directory, name, Self::users(count));
        self.services.push(service);
    }

    fn next_backend_name(&mut self) -> String {
        self.backends += 1;
        format!("io.example.Backend{}", self.backends)
    }

    fn target_service(&self) -> String {
        self.target
            .as_ref()
            .map(|(service, _)| service.clone())
            .expect("no target service started")
    }

    fn send(&mut self, method: &str, parameters: Value, more: bool) {
        let (_, path) = self.target.as_ref().expect("no target service started");
        let request = Request {
            method: method.to_owned(),
            parameters,
            more,
        };
        self.replies = userdb_protocol::query::<Value, _>(
            path.as_std_path(),
            Duration::from_secs(2),
            &request,
        )
        .expect("send request")
        .collect_replies()
        .expect("collect replies");
    }

    fn records(&self) -> Vec<&Value> {
        self.replies
            .iter()
            .filter_map(|reply| reply.parameters.get("record"))
            .filter(|record| !record.is_null())
            .collect()
    }
}

#[fixture]
fn world() -> RefCell<LookupWorld> {
    RefCell::new(LookupWorld::new())
}

#[given("a record service with {count} users")]
fn given_record_service(world: &RefCell<LookupWorld>, count: usize) {
    let mut world = world.borrow_mut();
    world.serve(RECORD_SERVICE, count);
    let path = world.directory.join(RECORD_SERVICE);
    world.target = Some((RECORD_SERVICE.to_owned(), path));
}

#[given("a backend service with {count} users")]
fn given_backend_service(world: &RefCell<LookupWorld>, count: usize) {
    let mut world = world.borrow_mut();
    let name = world.next_backend_name();
    world.serve(&name, count);
}

#[given("a backend service that is not running")]
fn given_dead_backend(world: &RefCell<LookupWorld>) {
    let mut world = world.borrow_mut();
    let name = world.next_backend_name();
    stale_socket(&world.directory, &name);
}

#[given("the multiplexer is running")]
fn given_multiplexer(world: &RefCell<LookupWorld>) {
    let mut world = world.borrow_mut();
    let multiplexer = Multiplexer::new(
        SocketDirectory::new(world.directory.clone(), MULTIPLEXER_SERVICE),
        BACKEND_TIMEOUTS,
    );
    let service =
        RunningService::start(&world.directory, MULTIPLEXER_SERVICE, Arc::new(multiplexer));
    let path = service.path().to_path_buf();
    world.services.push(service);
    world.target = Some((MULTIPLEXER_SERVICE.to_owned(), path));
}

#[when("a client enumerates users")]
fn when_enumerate(world: &RefCell<LookupWorld>) {
    let service = world.borrow().target_service();
    world
        .borrow_mut()
        .send(GET_USER_RECORD, json!({"service": service}), true);
}

#[when(r#"a client looks up the user "{name}""#)]
fn when_lookup(world: &RefCell<LookupWorld>, name: String) {
    let name = strip_quotes(&name);
    let service = world.borrow().target_service();
    world.borrow_mut().send(
        GET_USER_RECORD,
        json!({"userName": name, "service": service}),
        false,
    );
}

#[when(r#"a client asks the service "{service}" for the user "{name}""#)]
fn when_lookup_elsewhere(world: &RefCell<LookupWorld>, service: String, name: String) {
    let service = strip_quotes(&service);
    let name = strip_quotes(&name);
    world.borrow_mut().send(
        GET_USER_RECORD,
        json!({"userName": name, "service": service}),
        false,
    );
}

#[when(r#"a client calls the method "{method}""#)]
fn when_call_method(world: &RefCell<LookupWorld>, method: String) {
    let method = strip_quotes(&method);
    let service = world.borrow().target_service();
    world
        .borrow_mut()
        .send(method, json!({"service": service}), false);
}

#[then("the client receives {count} records")]
fn then_records_received(world: &RefCell<LookupWorld>, count: usize) {
    let world = world.borrow();
    assert_eq!(world.records().len(), count, "replies: {:?}", world.replies);
    assert!(
        world.replies.iter().all(|reply| reply.error.is_none()),
        "replies: {:?}",
        world.replies
    );
}

#[then("every reply but the last continues")]
fn then_continuation(world: &RefCell<LookupWorld>) {
    let world = world.borrow();
    let (last, rest) = world.replies.split_last().expect("at least one reply");
    assert!(rest.iter().all(|reply| reply.continues));
    assert!(!last.continues);
}

#[then(r#"the record for "{name}" is returned"#)]
fn then_record_returned(world: &RefCell<LookupWorld>, name: String) {
    let name = strip_quotes(&name);
    let world = world.borrow();
    let records = world.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["userName"], name);
}

#[then(r#"the client receives the error "{code}""#)]
fn then_error_received(world: &RefCell<LookupWorld>, code: String) {
    let code = strip_quotes(&code);
    let world = world.borrow();
    assert_eq!(world.replies.len(), 1, "replies: {:?}", world.replies);
    let error = world.replies[0].error.expect("reply should carry an error");
    assert_eq!(error.as_str(), code);
    assert!(!world.replies[0].continues);
}

/// Strips surrounding double quotes from a captured step argument.
fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

#[scenario(
    path = "tests/features/user_lookup.feature",
    name = "Enumerating a record service streams every record"
)]
fn enumerate_record_service(world: RefCell<LookupWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/user_lookup.feature",
    name = "Looking up a single user by name"
)]
fn lookup_single_user(world: RefCell<LookupWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/user_lookup.feature",
    name = "Looking up an unknown user"
)]
fn lookup_unknown_user(world: RefCell<LookupWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/user_lookup.feature",
    name = "Unknown methods are not implemented"
)]
fn unknown_method(world: RefCell<LookupWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/user_lookup.feature",
    name = "Requests addressed to another service are rejected"
)]
fn foreign_service(world: RefCell<LookupWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/user_lookup.feature",
    name = "The multiplexer merges every running backend"
)]
fn multiplexer_merges_backends(world: RefCell<LookupWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/user_lookup.feature",
    name = "The multiplexer reports when no backend answers"
)]
fn multiplexer_without_backends(world: RefCell<LookupWorld>) {
    drop(world);
}
