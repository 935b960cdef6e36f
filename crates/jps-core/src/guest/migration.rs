//! Guest → account migration
//!
//! On sign-in the current guest report is mapped to the account schema and
//! submitted to the remote report store. The guest cache is purged only once
//! the remote write succeeded; on failure it stays intact for a retry.

use chrono::{DateTime, SecondsFormat, Utc};
use jps_core_types::{RequestContext, Sensitive};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;

use crate::errors::{ExError, JpsError, Result};
use crate::guest::cache::GuestReportsApi;
use crate::{log_op_end, log_op_error, log_op_start};

pub const DEFAULT_SOURCE: &str = "web_app";
pub const GUEST_CONVERSION_SOURCE: &str = "guest_conversion";
pub const UNTITLED_JOB: &str = "Untitled Job";

/// Report row as persisted in a user's account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountReport {
    pub userid: Option<String>,
    pub job_title: String,
    pub job_body: String,
    pub feedback: String,
    pub total_score: Value,
    pub categories: Map<String, Value>,
    pub recommendations: Vec<Value>,
    pub red_flags: Vec<Value>,
    /// RFC 3339
    pub savedat: String,
    pub source: String,
    pub original_text: String,
    pub original_report: Value,
}

/// Account-side report persistence
pub trait RemoteReportStore: Send + Sync {
    /// Persist `report` on behalf of the token holder, returning its new id
    ///
    /// # Errors
    ///
    /// `Unauthorised` for a refused token, `ExternalService` for any other
    /// remote failure.
    fn submit(&self, report: &AccountReport, token: &Sensitive<String>) -> Result<String>;
}

/// What [`migrate_guest_report`] did
#[derive(Debug, Clone)]
pub enum MigrationOutcome {
    /// No unexpired current guest report
    NothingToMigrate,
    /// Submitted and the guest cache purged
    Migrated { report_id: String },
    /// Nothing was purged; the migration can be retried
    Failed { error: ExError },
}

/// Map a report document to the account schema
///
/// Missing or empty fields take defaults (`"Untitled Job"`, score `0`,
/// source `"web_app"`). `categories`, `recommendations` and `red_flags` may
/// arrive JSON-encoded as strings; they are parsed, and anything of the
/// wrong shape becomes an empty object or array.
pub fn format_report_for_account(
    report: &Value,
    user_id: Option<&str>,
    saved_at: DateTime<Utc>,
) -> AccountReport {
    let categories = match parse_embedded(report.get("categories")) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let recommendations = as_array(parse_embedded(report.get("recommendations")));
    let red_flags = as_array(parse_embedded(report.get("red_flags")));

    let original_report = match report.get("original_report") {
        Some(Value::Null) | None => parse_embedded(Some(report)),
        present => parse_embedded(present),
    }
    .unwrap_or_else(|| Value::Object(Map::new()));

    let job_body = text(report, "job_body")
        .or_else(|| text(report, "content"))
        .unwrap_or_default();

    let total_score = report
        .get("total_score")
        .filter(|v| is_truthy(v))
        .cloned()
        .unwrap_or_else(|| Value::from(0));

    AccountReport {
        userid: user_id.map(str::to_string),
        job_title: text(report, "job_title").unwrap_or_else(|| UNTITLED_JOB.to_string()),
        original_text: job_body.clone(),
        job_body,
        feedback: text(report, "feedback").unwrap_or_default(),
        total_score,
        categories,
        recommendations,
        red_flags,
        savedat: saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        source: text(report, "source").unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        original_report,
    }
}

/// Move the current guest report into the signed-in user's account
///
/// Never panics and never clears the guest cache unless the remote store
/// accepted the report.
pub fn migrate_guest_report(
    api: &GuestReportsApi,
    remote: &dyn RemoteReportStore,
    token: &Sensitive<String>,
    user_id: &str,
) -> MigrationOutcome {
    migrate_guest_report_in(&RequestContext::new(), api, remote, token, user_id)
}

/// [`migrate_guest_report`] under a caller-supplied correlation context
pub fn migrate_guest_report_in(
    ctx: &RequestContext,
    api: &GuestReportsApi,
    remote: &dyn RemoteReportStore,
    token: &Sensitive<String>,
    user_id: &str,
) -> MigrationOutcome {
    let start = Instant::now();
    log_op_start!(
        "migrate_guest_report",
        request_id = %ctx.request_id,
        trace_id = ctx.trace_str()
    );

    let result = migrate(api, remote, token, user_id);
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(None) => {
            log_op_end!(
                "migrate_guest_report",
                duration_ms = duration_ms,
                request_id = %ctx.request_id,
                migrated = false
            );
            MigrationOutcome::NothingToMigrate
        }
        Ok(Some(report_id)) => {
            log_op_end!(
                "migrate_guest_report",
                duration_ms = duration_ms,
                request_id = %ctx.request_id,
                migrated = true
            );
            MigrationOutcome::Migrated { report_id }
        }
        Err(err) => {
            let mut error = err.with_request_id(ctx.request_id.clone());
            if let Some(trace_id) = &ctx.trace_id {
                error = error.with_trace_id(trace_id.clone());
            }
            log_op_error!(
                "migrate_guest_report",
                error.clone(),
                duration_ms = duration_ms,
                request_id = %ctx.request_id
            );
            MigrationOutcome::Failed { error }
        }
    }
}

fn migrate(
    api: &GuestReportsApi,
    remote: &dyn RemoteReportStore,
    token: &Sensitive<String>,
    user_id: &str,
) -> Result<Option<String>> {
    if token.expose().is_empty() {
        return Err(JpsError::NotAuthorised {
            reason: "no access token".to_string(),
        }
        .into());
    }

    let Some(report) = api.try_load()? else {
        return Ok(None);
    };

    let saved_at = DateTime::<Utc>::from_timestamp_millis(api.now_ms()).unwrap_or_else(Utc::now);
    let mut account = format_report_for_account(&report, Some(user_id), saved_at);
    account.source = GUEST_CONVERSION_SOURCE.to_string();

    let report_id = remote
        .submit(&account, token)
        .map_err(|e| e.with_op("migrate_guest_report"))?;

    // The remote copy is authoritative now; a failed purge only leaves a
    // stale guest copy behind.
    if !api.clear_all() {
        tracing::warn!(op = "migrate_guest_report", report_id = %report_id, "guest cache not purged");
    }

    Ok(Some(report_id))
}

/// `Some(parsed)` for JSON strings, the value itself otherwise; `None` for
/// absent, null or unparseable input
fn parse_embedded(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::Null => None,
        Value::String(s) => serde_json::from_str(s).ok(),
        other => Some(other.clone()),
    }
}

fn as_array(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn text(report: &Value, field: &str) -> Option<String> {
    report
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
