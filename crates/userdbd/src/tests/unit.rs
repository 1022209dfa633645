//! Unit tests for bootstrap and launch sequencing.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, bounded};
use rstest::rstest;
use userdb_config::MULTIPLEXER_SERVICE;
use userdb_protocol::{GetUserRecordReply, GetUserRecordRequestParams, Method, Request};

use crate::bootstrap::{BootstrapError, bootstrap_with};
use crate::cancellation::CancellationToken;
use crate::process::launch::{LaunchPlan, run_daemon_with};
use crate::process::{ShutdownError, ShutdownSignal};

use super::support::{
    FailingConfigLoader, HealthEvent, RecordingHealthReporter, TestConfigLoader, query_users,
    utf8_tempdir,
};

const RECORD_SERVICE: &str = "io.example.Records";

/// Shutdown signal released by the test through a channel.
struct ChannelShutdownSignal {
    release: Receiver<()>,
}

impl ShutdownSignal for ChannelShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let _ = self.release.recv();
        Ok(())
    }
}

#[rstest]
fn bootstrap_serves_records_from_directory() {
    let (_records, records_dir) = utf8_tempdir();
    fs::write(
        records_dir.join("alice.user"),
        r#"{"userName":"alice","uid":1000}"#,
    )
    .expect("write record");
    let loader = TestConfigLoader::new(RECORD_SERVICE).with_records_directory(&records_dir);
    let reporter = Arc::new(RecordingHealthReporter::default());

    let service = bootstrap_with(&loader, reporter.clone()).expect("bootstrap should succeed");

    assert_eq!(
        reporter.events(),
        vec![HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
    );
    assert!(loader.runtime_directory().is_dir());
    let request = Request::new(
        Method::GetUserRecord,
        GetUserRecordRequestParams::by_name(RECORD_SERVICE, "alice"),
        false,
    );
    let replies: Vec<_> = service
        .database()
        .get_user_record(&request, &CancellationToken::new())
        .collect();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].parameters.record.is_some());
}

#[rstest]
fn bootstrap_reports_configuration_failure() {
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = bootstrap_with(&FailingConfigLoader, reporter.clone())
        .err()
        .expect("bootstrap should fail");

    assert!(matches!(error, BootstrapError::Configuration { .. }));
    assert!(matches!(
        reporter.events().last(),
        Some(HealthEvent::BootstrapFailed(_))
    ));
}

#[rstest]
#[case::parent_directory("..")]
#[case::nested("io.example/Records")]
fn bootstrap_rejects_unusable_service_names(#[case] service: &str) {
    let loader = TestConfigLoader::new(service);
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = bootstrap_with(&loader, reporter)
        .err()
        .expect("bootstrap should fail");

    assert!(matches!(error, BootstrapError::ServiceName { .. }));
}

#[rstest]
fn bootstrap_reports_missing_records_directory() {
    let (_dir, path) = utf8_tempdir();
    let loader = TestConfigLoader::new(RECORD_SERVICE)
        .with_records_directory(&path.join("does-not-exist"));
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = bootstrap_with(&loader, reporter)
        .err()
        .expect("bootstrap should fail");

    assert!(matches!(error, BootstrapError::Database { .. }));
}

#[rstest]
fn multiplexer_name_selects_merging_backend() {
    let loader = TestConfigLoader::new(MULTIPLEXER_SERVICE);
    let reporter = Arc::new(RecordingHealthReporter::default());
    let service = bootstrap_with(&loader, reporter).expect("bootstrap should succeed");

    let request = Request::new(
        Method::GetUserRecord,
        GetUserRecordRequestParams::all(MULTIPLEXER_SERVICE),
        true,
    );
    let replies: Vec<_> = service
        .database()
        .get_user_record(&request, &CancellationToken::new())
        .collect();

    assert_eq!(replies, vec![GetUserRecordReply::empty()]);
}

fn wait_for_socket(path: &camino::Utf8Path) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[rstest]
fn service_runs_until_shutdown_signal() {
    let (_records, records_dir) = utf8_tempdir();
    fs::write(records_dir.join("bob.user"), r#"{"userName":"bob","uid":1001}"#)
        .expect("write record");
    let loader = TestConfigLoader::new(RECORD_SERVICE).with_records_directory(&records_dir);
    let socket = loader.runtime_directory().join(RECORD_SERVICE);
    let reporter = Arc::new(RecordingHealthReporter::default());
    let (release, receiver) = bounded(1);
    let plan = LaunchPlan {
        loader,
        reporter: reporter.clone(),
        shutdown: ChannelShutdownSignal { release: receiver },
    };
    let runtime = thread::spawn(move || run_daemon_with(plan));

    assert!(wait_for_socket(&socket), "service socket never appeared");
    let replies = query_users(
        &socket,
        GetUserRecordRequestParams::by_uid(RECORD_SERVICE, 1001),
        false,
    );
    assert_eq!(
        replies[0]
            .parameters
            .record
            .as_ref()
            .map(|record| record.user_name()),
        Some("bob")
    );

    release.send(()).expect("release shutdown");
    runtime
        .join()
        .expect("join runtime thread")
        .expect("service should shut down cleanly");

    assert!(!socket.exists(), "socket should be removed on shutdown");
    let events = reporter.events();
    assert!(events.contains(&HealthEvent::ListenerReady(RECORD_SERVICE.to_owned())));
    assert_eq!(events.last(), Some(&HealthEvent::ShutdownRequested));
}
