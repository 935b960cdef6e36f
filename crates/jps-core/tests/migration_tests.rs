#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Mutex;

use common::{harness, report};
use jps_core::guest::{AccountReport, MigrationOutcome, RemoteReportStore};
use jps_core::{migrate_guest_report, migrate_guest_report_in, ExError, ExErrorKind, Result};
use jps_core_types::{RequestContext, Sensitive};

/// Remote store that records submissions and answers with a canned result
struct FakeRemote {
    submitted: Mutex<Vec<AccountReport>>,
    fail_with: Option<ExErrorKind>,
}

impl FakeRemote {
    fn accepting() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    fn failing(kind: ExErrorKind) -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            fail_with: Some(kind),
        }
    }

    fn submitted(&self) -> Vec<AccountReport> {
        self.submitted.lock().unwrap().clone()
    }
}

impl RemoteReportStore for FakeRemote {
    fn submit(&self, report: &AccountReport, token: &Sensitive<String>) -> Result<String> {
        assert_eq!(token.expose(), "token-123");
        self.submitted.lock().unwrap().push(report.clone());
        match self.fail_with {
            Some(kind) => Err(ExError::new(kind).with_message("remote said no")),
            None => Ok("acct-report-1".to_string()),
        }
    }
}

fn token() -> Sensitive<String> {
    Sensitive::new("token-123".to_string())
}

#[test]
fn test_migrates_current_report_and_purges_cache() {
    // GIVEN a guest with a current report and history
    let h = harness();
    h.api.save(&report("r1", "Engineer"));
    let remote = FakeRemote::accepting();

    // WHEN the guest signs in
    let outcome = migrate_guest_report(&h.api, &remote, &token(), "user-9");

    // THEN the report is stored in the account, tagged as a guest conversion
    match outcome {
        MigrationOutcome::Migrated { report_id } => assert_eq!(report_id, "acct-report-1"),
        other => panic!("expected migration, got {:?}", other),
    }
    let submitted = remote.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].userid.as_deref(), Some("user-9"));
    assert_eq!(submitted[0].job_title, "Engineer");
    assert_eq!(submitted[0].job_body, "Engineer wanted");
    assert_eq!(submitted[0].source, "guest_conversion");

    // AND the guest cache is empty
    assert_eq!(h.api.load(), None);
    assert!(h.api.get_history().is_empty());
}

#[test]
fn test_remote_failure_keeps_guest_cache() {
    let h = harness();
    h.api.save(&report("r1", "Engineer"));
    let remote = FakeRemote::failing(ExErrorKind::ExternalService);

    let outcome = migrate_guest_report(&h.api, &remote, &token(), "user-9");

    match outcome {
        MigrationOutcome::Failed { error } => {
            assert_eq!(error.kind(), ExErrorKind::ExternalService);
            assert_eq!(error.op(), Some("migrate_guest_report"));
            assert!(error.request_id().is_some());
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(h.api.has_report());
    assert_eq!(h.api.get_history().len(), 1);
}

#[test]
fn test_nothing_to_migrate() {
    let h = harness();
    let remote = FakeRemote::accepting();

    let outcome = migrate_guest_report(&h.api, &remote, &token(), "user-9");

    assert!(matches!(outcome, MigrationOutcome::NothingToMigrate));
    assert!(remote.submitted().is_empty());
}

#[test]
fn test_missing_token_is_unauthorised() {
    let h = harness();
    h.api.save(&report("r1", "Engineer"));
    let remote = FakeRemote::accepting();

    let outcome =
        migrate_guest_report(&h.api, &remote, &Sensitive::new(String::new()), "user-9");

    match outcome {
        MigrationOutcome::Failed { error } => {
            assert_eq!(error.kind(), ExErrorKind::Unauthorised)
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(remote.submitted().is_empty());
    assert!(h.api.has_report());
}

#[test]
fn test_token_is_redacted_in_debug_output() {
    let rendered = format!("{:?}", token());
    assert!(!rendered.contains("token-123"));
}

#[test]
fn test_failure_carries_caller_trace() {
    let h = harness();
    h.api.save(&report("r1", "Engineer"));
    let remote = FakeRemote::failing(ExErrorKind::ExternalService);
    let ctx = RequestContext::traced("trace-from-ui");

    let outcome = migrate_guest_report_in(&ctx, &h.api, &remote, &token(), "user-9");

    match outcome {
        MigrationOutcome::Failed { error } => {
            assert_eq!(error.request_id(), Some(&ctx.request_id));
            assert_eq!(error.trace_id().map(|t| t.as_str()), Some("trace-from-ui"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}
