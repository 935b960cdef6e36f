//! Guest report cache
//!
//! Holds the most recent report (the current slot) and a bounded, deduplicated,
//! most-recent-first history in a [`KeyValueStore`]. Both carry their own TTL.
//! Expired records are purged as a side effect of reading them.
//!
//! Every operation comes in two forms:
//! - `try_*` returns `Result`, so `Ok(None)` (nothing cached) and `Err`
//!   (storage broken) stay distinguishable
//! - the plain form is the UI path: it logs the error with its code and
//!   degrades to `false` / `None` / an empty list

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::config::GuestCacheConfig;
use crate::errors::{ExError, JpsError, Result};
use crate::guest::model::{document_id, GuestReport, GuestReportSummary, StoredHistory};
use crate::kv::KeyValueStore;
use crate::{log_op_degraded, log_op_end, log_op_error, log_op_start};

const MINUTE_MS: i64 = 60 * 1000;

/// Guest report cache over a key-value store
pub struct GuestReportsApi {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: GuestCacheConfig,
}

impl std::fmt::Debug for GuestReportsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestReportsApi")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GuestReportsApi {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: GuestCacheConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Cache on the system clock with default configuration
    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, Arc::new(SystemClock), GuestCacheConfig::default())
    }

    pub fn config(&self) -> &GuestCacheConfig {
        &self.config
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    // ---------- save ----------

    /// Store `report` as the current report and push it onto the history
    ///
    /// The id is taken from `report.id`, then `report.report_id`, then the
    /// current time. A history entry with the same id is replaced and moved
    /// to the front.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the record cannot be encoded and `Storage`
    /// or `QuotaExceeded` if the store refuses the write.
    pub fn try_save(&self, report: &Value) -> Result<GuestReport> {
        let start = Instant::now();
        log_op_start!("guest_save");

        let result = self.save_inner(report);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(saved) => {
                log_op_end!("guest_save", duration_ms = duration_ms, report_id = %saved.id)
            }
            Err(err) => log_op_error!("guest_save", err.clone(), duration_ms = duration_ms),
        }
        result
    }

    /// UI-path [`try_save`](Self::try_save): `false` on failure
    pub fn save(&self, report: &Value) -> bool {
        degrade("guest_save", self.try_save(report).map(|_| true), false)
    }

    fn save_inner(&self, report: &Value) -> Result<GuestReport> {
        let now = self.clock.now_ms();
        let id = document_id(report).unwrap_or_else(|| now.to_string());
        let record =
            GuestReport::from_document(id, report, now, &self.config.guest_results_path);

        self.write_json(&self.config.current_key, &record, "guest_save")?;
        self.save_to_history(record.clone())?;
        Ok(record)
    }

    fn save_to_history(&self, record: GuestReport) -> Result<()> {
        let mut entries = self.read_history("guest_save")?;

        entries.retain(|entry| entry.id != record.id);
        entries.insert(0, record);

        let capacity = self.config.history_capacity;
        if entries.len() > capacity {
            let evicted = entries.len() - capacity;
            entries.truncate(capacity);
            tracing::info!(
                op = "guest_save",
                evicted,
                history_len = entries.len(),
                "history over capacity, dropped oldest entries"
            );
        }

        self.write_json(&self.config.history_key, &entries, "guest_save")
    }

    // ---------- current slot ----------

    /// Document of the current report, unless absent or expired
    ///
    /// An expired current report is removed from the store.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store cannot be read and `InvalidRecord` if
    /// the slot holds something other than a report record.
    pub fn try_load(&self) -> Result<Option<Value>> {
        Ok(self
            .current_record("guest_load")?
            .and_then(|record| record.data))
    }

    /// UI-path [`try_load`](Self::try_load)
    pub fn load(&self) -> Option<Value> {
        degrade("guest_load", self.try_load(), None)
    }

    /// # Errors
    ///
    /// Same as [`try_load`](Self::try_load).
    pub fn try_has_report(&self) -> Result<bool> {
        Ok(self.try_load()?.is_some())
    }

    pub fn has_report(&self) -> bool {
        self.load().is_some()
    }

    /// Remove the current report; history is untouched
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store refuses the removal.
    pub fn try_clear(&self) -> Result<()> {
        self.store
            .remove(&self.config.current_key)
            .map_err(|e| e.with_op("guest_clear"))?;
        tracing::debug!(op = "guest_clear", "cleared current guest report");
        Ok(())
    }

    pub fn clear(&self) -> bool {
        degrade("guest_clear", self.try_clear().map(|_| true), false)
    }

    /// Remove the current report and the whole history
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store refuses either removal.
    pub fn try_clear_all(&self) -> Result<()> {
        self.try_clear()?;
        self.store
            .remove(&self.config.history_key)
            .map_err(|e| e.with_op("guest_clear_all"))?;
        tracing::debug!(op = "guest_clear_all", "cleared guest cache");
        Ok(())
    }

    pub fn clear_all(&self) -> bool {
        degrade("guest_clear_all", self.try_clear_all().map(|_| true), false)
    }

    /// Overwrite the current slot with `data` under `id`; history is untouched
    ///
    /// # Errors
    ///
    /// Returns `Serialization`, `Storage` or `QuotaExceeded` on write failure.
    pub fn try_set_current_report(&self, data: &Value, id: &str) -> Result<()> {
        let record = GuestReport::from_document(
            id,
            data,
            self.clock.now_ms(),
            &self.config.guest_results_path,
        );
        self.write_json(&self.config.current_key, &record, "guest_set_current")?;
        tracing::debug!(op = "guest_set_current", report_id = id, "set current report");
        Ok(())
    }

    pub fn set_current_report(&self, data: &Value, id: &str) -> bool {
        degrade(
            "guest_set_current",
            self.try_set_current_report(data, id).map(|_| true),
            false,
        )
    }

    /// Whole minutes since the current report was written
    ///
    /// # Errors
    ///
    /// Returns `Storage` or `InvalidRecord` if the slot cannot be read.
    pub fn try_get_report_age(&self) -> Result<Option<i64>> {
        let Some(raw) = self.read_key(&self.config.current_key, "guest_report_age")? else {
            return Ok(None);
        };
        let record = self.decode_current(&raw)?;
        Ok(Some(
            self.clock.now_ms().saturating_sub(record.timestamp) / MINUTE_MS,
        ))
    }

    pub fn get_report_age(&self) -> Option<i64> {
        degrade("guest_report_age", self.try_get_report_age(), None)
    }

    /// Relative time of `timestamp` from now ("Just now", "5m ago", ...)
    pub fn time_ago(&self, timestamp: i64) -> String {
        get_time_ago(timestamp, self.clock.now_ms())
    }

    // ---------- history ----------

    /// Summaries of every unexpired history entry, most recent first
    ///
    /// Legacy entries are upgraded and expired ones dropped; if either
    /// happened the healed history is written back.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the history cannot be read.
    pub fn try_get_history(&self) -> Result<Vec<GuestReportSummary>> {
        Ok(self
            .read_history("guest_history")?
            .iter()
            .map(GuestReport::summary)
            .collect())
    }

    /// UI-path [`try_get_history`](Self::try_get_history): empty on failure
    pub fn get_history(&self) -> Vec<GuestReportSummary> {
        degrade("guest_history", self.try_get_history(), Vec::new())
    }

    /// Document of the cached report with `id`
    ///
    /// Looks at the current slot first, then the history. A legacy
    /// placeholder has no document, so a minimal reconstructed one is
    /// returned and promoted to the current slot.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store cannot be read or the promotion cannot
    /// be written.
    pub fn try_load_report_from_history(&self, id: &str) -> Result<Option<Value>> {
        let op = "guest_open";

        if let Some(current) = self.current_record(op)? {
            if current.id == id {
                if let Some(data) = current.data {
                    return Ok(Some(data));
                }
            }
        }

        let entries = self.read_history(op)?;
        let Some(entry) = entries.into_iter().find(|entry| entry.id == id) else {
            tracing::debug!(op, report_id = id, "report not in guest cache");
            return Ok(None);
        };

        match entry.data {
            Some(data) => Ok(Some(data)),
            None => {
                let reconstructed = entry.reconstructed_document();
                self.try_set_current_report(&reconstructed, id)
                    .map_err(|e| e.with_op(op).with_entity_id(id))?;
                tracing::info!(op, report_id = id, "reconstructed legacy report");
                Ok(Some(reconstructed))
            }
        }
    }

    pub fn load_report_from_history(&self, id: &str) -> Option<Value> {
        degrade("guest_open", self.try_load_report_from_history(id), None)
    }

    /// Like [`try_load_report_from_history`](Self::try_load_report_from_history)
    /// but a missing report is `NotFound`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no cached report has this id.
    pub fn try_require_report(&self, id: &str) -> Result<Value> {
        self.try_load_report_from_history(id)?.ok_or_else(|| {
            ExError::from(JpsError::ReportNotFound {
                report_id: id.to_string(),
            })
            .with_op("guest_open")
        })
    }

    /// Drop one history entry; `Ok(false)` if there was none
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the history cannot be read or rewritten.
    pub fn try_remove_from_history(&self, id: &str) -> Result<bool> {
        let op = "guest_remove";
        let mut entries = self.read_history(op)?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write_json(&self.config.history_key, &entries, op)?;
        tracing::debug!(op, report_id = id, history_len = entries.len(), "removed history entry");
        Ok(true)
    }

    pub fn remove_from_history(&self, id: &str) -> bool {
        degrade("guest_remove", self.try_remove_from_history(id), false)
    }

    // ---------- internals ----------

    /// Current record if present and unexpired; expired records are removed
    fn current_record(&self, op: &'static str) -> Result<Option<GuestReport>> {
        let Some(raw) = self.read_key(&self.config.current_key, op)? else {
            return Ok(None);
        };
        let record = self.decode_current(&raw).map_err(|e| e.with_op(op))?;

        let age = self.clock.now_ms().saturating_sub(record.timestamp);
        if age > self.config.current_ttl_ms {
            tracing::debug!(op, report_id = %record.id, age_ms = age, "current report expired");
            self.store
                .remove(&self.config.current_key)
                .map_err(|e| e.with_op(op))?;
            return Ok(None);
        }

        tracing::debug!(op, report_id = %record.id, "loaded current report");
        Ok(Some(record))
    }

    fn decode_current(&self, raw: &str) -> Result<GuestReport> {
        serde_json::from_str(raw).map_err(|e| {
            JpsError::CorruptRecord {
                key: self.config.current_key.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Decode, upgrade and expire the history, writing it back if it changed
    fn read_history(&self, op: &'static str) -> Result<Vec<GuestReport>> {
        let Some(raw) = self.read_key(&self.config.history_key, op)? else {
            return Ok(Vec::new());
        };

        let generic_path = &self.config.guest_results_path;
        let (entries, mut rewrite) = match StoredHistory::decode(&raw) {
            StoredHistory::Full { entries, skipped } => {
                if skipped > 0 {
                    tracing::warn!(op, skipped, "dropped undecodable history entries");
                }
                (entries, skipped > 0)
            }
            StoredHistory::Legacy { summaries, skipped } => {
                tracing::info!(
                    op,
                    history_len = summaries.len(),
                    skipped,
                    "upgrading legacy history entries"
                );
                let upgraded = summaries
                    .into_iter()
                    .map(|summary| summary.upgrade(generic_path))
                    .collect();
                (upgraded, true)
            }
            StoredHistory::Unrecognised => {
                let err: ExError = JpsError::UnrecognisedHistoryFormat {
                    key: self.config.history_key.clone(),
                }
                .into();
                log_op_degraded!(op, &err);
                return Ok(Vec::new());
            }
        };

        let now = self.clock.now_ms();
        let ttl = self.config.history_ttl_ms;
        let before = entries.len();
        let entries: Vec<GuestReport> = entries
            .into_iter()
            .filter(|entry| now.saturating_sub(entry.timestamp) <= ttl)
            .collect();

        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::info!(op, evicted, history_len = entries.len(), "expired history entries");
            rewrite = true;
        }

        let (entries, trimmed) = bound_history(entries, self.config.history_capacity);
        if trimmed > 0 {
            tracing::info!(op, trimmed, history_len = entries.len(), "trimmed history");
            rewrite = true;
        }

        if rewrite {
            // A failed rewrite leaves stale entries on disk; they are
            // filtered again on the next read.
            if let Err(err) = self.write_json(&self.config.history_key, &entries, op) {
                log_op_degraded!(op, &err);
            }
        }

        Ok(entries)
    }

    fn read_key(&self, key: &str, op: &'static str) -> Result<Option<String>> {
        self.store.get(key).map_err(|e| e.with_op(op))
    }

    fn write_json<T: serde::Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        op: &'static str,
    ) -> Result<()> {
        let text = serde_json::to_string(value).map_err(|e| {
            ExError::from(JpsError::EncodeFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })
            .with_op(op)
        })?;
        self.store.set(key, &text).map_err(|e| e.with_op(op))
    }
}

/// Drop repeated ids (first occurrence wins) and cut to `capacity`
///
/// Returns the kept entries and how many were dropped.
fn bound_history(entries: Vec<GuestReport>, capacity: usize) -> (Vec<GuestReport>, usize) {
    let before = entries.len();
    let mut seen = HashSet::new();
    let kept: Vec<GuestReport> = entries
        .into_iter()
        .filter(|entry| seen.insert(entry.id.clone()))
        .take(capacity)
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Relative-time label for `timestamp` as seen at `now` (both epoch ms)
///
/// Under a minute (including future timestamps) is "Just now", then whole
/// minutes, hours and days.
pub fn get_time_ago(timestamp: i64, now: i64) -> String {
    let minutes = now.saturating_sub(timestamp) / MINUTE_MS;
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 24 * 60 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (24 * 60))
    }
}

/// Log a swallowed failure and fall back
fn degrade<T>(op: &'static str, result: Result<T>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            log_op_degraded!(op, &err);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{DAY_MS, HOUR_MS};
    use crate::errors::ExErrorKind;
    use crate::kv::MemoryStore;
    use serde_json::json;

    const T0: i64 = 1_700_000_000_000;

    fn api() -> (GuestReportsApi, Arc<MemoryStore>, ManualClock) {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(T0);
        let api = GuestReportsApi::new(
            store.clone(),
            Arc::new(clock.clone()),
            GuestCacheConfig::default(),
        );
        (api, store, clock)
    }

    #[test]
    fn test_save_then_load_returns_document() {
        let (api, _, _) = api();
        let doc = json!({"id": "r-1", "job_title": "Engineer"});
        assert!(api.save(&doc));
        assert_eq!(api.load(), Some(doc));
        assert!(api.has_report());
    }

    #[test]
    fn test_id_falls_back_to_time() {
        let (api, _, _) = api();
        let saved = api.try_save(&json!({"job_title": "No id"})).unwrap();
        assert_eq!(saved.id, T0.to_string());
    }

    #[test]
    fn test_load_empty_is_none_not_error() {
        let (api, _, _) = api();
        assert_eq!(api.try_load().unwrap(), None);
        assert!(!api.has_report());
    }

    #[test]
    fn test_expired_current_is_removed() {
        let (api, store, clock) = api();
        api.save(&json!({"id": "r-1"}));
        clock.advance_ms(25 * HOUR_MS);

        assert_eq!(api.load(), None);
        assert_eq!(store.get(DEFAULT_KEY).unwrap(), None);
    }

    const DEFAULT_KEY: &str = crate::config::DEFAULT_CURRENT_KEY;

    #[test]
    fn test_current_at_exact_ttl_is_kept() {
        let (api, _, clock) = api();
        api.save(&json!({"id": "r-1"}));
        clock.advance_ms(DAY_MS);
        assert!(api.load().is_some());
    }

    #[test]
    fn test_clear_keeps_history() {
        let (api, _, _) = api();
        api.save(&json!({"id": "r-1"}));
        assert!(api.clear());
        assert_eq!(api.load(), None);
        assert_eq!(api.get_history().len(), 1);

        assert!(api.clear_all());
        assert!(api.get_history().is_empty());
    }

    #[test]
    fn test_corrupt_current_is_invalid_record() {
        let (api, store, _) = api();
        store.set(DEFAULT_KEY, "{not json").unwrap();
        let err = api.try_load().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidRecord);
        assert_eq!(err.op(), Some("guest_load"));
        assert_eq!(api.load(), None);
    }

    #[test]
    fn test_unavailable_store_degrades() {
        let (api, store, _) = api();
        store.set_unavailable(true);

        assert!(!api.save(&json!({"id": "r-1"})));
        assert_eq!(api.load(), None);
        assert!(api.get_history().is_empty());
        assert!(!api.clear_all());
        assert_eq!(
            api.try_save(&json!({"id": "r-1"})).unwrap_err().kind(),
            ExErrorKind::Storage
        );
    }

    #[test]
    fn test_report_age_in_minutes() {
        let (api, _, clock) = api();
        assert_eq!(api.get_report_age(), None);
        api.save(&json!({"id": "r-1"}));
        clock.advance_ms(90 * 1000);
        assert_eq!(api.get_report_age(), Some(1));
    }

    #[test]
    fn test_set_current_report_leaves_history() {
        let (api, _, _) = api();
        assert!(api.set_current_report(&json!({"title": "viewed"}), "h-1"));
        assert_eq!(api.load(), Some(json!({"title": "viewed"})));
        assert!(api.get_history().is_empty());
    }

    #[test]
    fn test_remove_from_history() {
        let (api, _, _) = api();
        api.save(&json!({"id": "a"}));
        api.save(&json!({"id": "b"}));

        assert!(api.remove_from_history("a"));
        assert!(!api.remove_from_history("a"));
        let ids: Vec<String> = api.get_history().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["b".to_string()]);
    }

    #[test]
    fn test_require_report_not_found() {
        let (api, _, _) = api();
        let err = api.try_require_report("ghost").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert_eq!(err.entity_id(), Some("ghost"));
    }

    #[test]
    fn test_time_ago_labels() {
        assert_eq!(get_time_ago(T0, T0), "Just now");
        assert_eq!(get_time_ago(T0, T0 + 59_999), "Just now");
        assert_eq!(get_time_ago(T0, T0 + 60_000), "1m ago");
        assert_eq!(get_time_ago(T0, T0 + 59 * 60_000), "59m ago");
        assert_eq!(get_time_ago(T0, T0 + HOUR_MS), "1h ago");
        assert_eq!(get_time_ago(T0, T0 + 23 * HOUR_MS + 59 * 60_000), "23h ago");
        assert_eq!(get_time_ago(T0, T0 + DAY_MS), "1d ago");
        assert_eq!(get_time_ago(T0, T0 + 9 * DAY_MS), "9d ago");
        assert_eq!(get_time_ago(T0 + 5_000, T0), "Just now");
    }
}
