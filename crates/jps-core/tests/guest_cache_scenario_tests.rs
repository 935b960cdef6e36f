#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{harness, harness_with, report, T0};
use jps_core::config::{DAY_MS, DEFAULT_CURRENT_KEY, DEFAULT_HISTORY_KEY, HOUR_MS};
use jps_core::guest::SCHEMA_VERSION;
use jps_core::{ExErrorKind, GuestCacheConfig, GuestReportsApi, KeyValueStore};
use std::sync::Arc;
use serde_json::{json, Value};

fn stored_history(h: &common::Harness) -> Vec<Value> {
    let raw = h.store.get(DEFAULT_HISTORY_KEY).unwrap().unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_history_keeps_five_most_recent() {
    // GIVEN seven distinct reports saved one minute apart
    let h = harness();
    for n in 1..=7 {
        assert!(h.api.save(&report(&format!("r{}", n), "Role")));
        h.clock.advance_ms(60_000);
    }

    // THEN only the five most recent remain, newest first
    let ids: Vec<String> = h.api.get_history().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["r7", "r6", "r5", "r4", "r3"]);
    assert_eq!(stored_history(&h).len(), 5);
}

#[test]
fn test_resave_dedups_and_moves_to_front() {
    let h = harness();
    h.api.save(&report("X", "First title"));
    h.api.save(&report("Y", "Other"));

    // WHEN X is saved again with new content
    h.api.save(&report("X", "Second title"));

    // THEN exactly one X entry exists, at the front, with the new content
    let history = h.api.get_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, "X");
    assert_eq!(history[0].job_title.as_deref(), Some("Second title"));
    assert_eq!(history.iter().filter(|s| s.id == "X").count(), 1);
}

#[test]
fn test_current_report_expires_after_a_day() {
    let h = harness();
    h.api.save(&report("r1", "Role"));

    h.clock.advance_ms(25 * HOUR_MS);

    assert_eq!(h.api.load(), None);
    assert!(!h.api.has_report());
    assert_eq!(h.store.get(DEFAULT_CURRENT_KEY).unwrap(), None);
    // History has its own, longer TTL
    assert_eq!(h.api.get_history().len(), 1);
}

#[test]
fn test_expired_history_entry_is_purged_on_read() {
    // GIVEN a stored history with one fresh and one 8-day-old entry
    let h = harness();
    let history = json!([
        {"id": "fresh", "timestamp": T0 - HOUR_MS, "data": {"id": "fresh"}, "schemaVersion": 2},
        {"id": "stale", "timestamp": T0 - 8 * DAY_MS, "data": {"id": "stale"}, "schemaVersion": 2},
    ]);
    h.store
        .set(DEFAULT_HISTORY_KEY, &history.to_string())
        .unwrap();

    // WHEN reading the history
    let ids: Vec<String> = h.api.get_history().into_iter().map(|s| s.id).collect();

    // THEN the stale entry is gone from the result and from storage
    assert_eq!(ids, vec!["fresh"]);
    let stored = stored_history(&h);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["id"], "fresh");
}

#[test]
fn test_legacy_history_is_upgraded() {
    // GIVEN history written by an older client: summaries without `data`
    let h = harness();
    let legacy = json!([
        {"id": "old-1", "timestamp": T0 - HOUR_MS, "job_title": "Baker", "overallScore": 61},
        {"id": 1699999999999_i64, "timestamp": T0 - 2 * HOUR_MS, "job_title": "Chef"},
    ]);
    h.store
        .set(DEFAULT_HISTORY_KEY, &legacy.to_string())
        .unwrap();

    // WHEN listing it
    let history = h.api.get_history();

    // THEN every entry is listed with the generic results path
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].id, "1699999999999");
    assert!(history
        .iter()
        .all(|s| s.short_url.as_deref() == Some("/results")));

    // AND storage now holds the full layout
    let stored = stored_history(&h);
    assert_eq!(stored[0]["data"], Value::Null);
    assert_eq!(stored[0]["schemaVersion"], SCHEMA_VERSION);

    // AND opening a legacy entry yields a reconstructed report, not None
    let opened = h.api.load_report_from_history("old-1").unwrap();
    assert_eq!(opened["job_title"], "Baker");
    assert_eq!(opened["overallScore"], 61);
    assert_eq!(opened["_legacy"], true);
    assert_eq!(opened["_reconstructed"], true);

    // AND it was promoted to the current slot
    assert_eq!(h.api.load(), Some(opened));
}

#[test]
fn test_unrecognised_history_reads_as_empty() {
    let h = harness();
    h.store.set(DEFAULT_HISTORY_KEY, "{\"oops\": true}").unwrap();

    assert!(h.api.get_history().is_empty());
    assert_eq!(h.api.try_get_history().unwrap(), Vec::new());
    assert_eq!(h.api.load_report_from_history("anything"), None);

    // A later save replaces the unreadable value
    h.api.save(&report("r1", "Role"));
    assert_eq!(h.api.get_history().len(), 1);
}

#[test]
fn test_oversized_legacy_history_is_bounded_and_deduped() {
    // GIVEN seven legacy summaries plus a stale duplicate of the first id
    let h = harness();
    let mut legacy: Vec<Value> = (0..7)
        .map(|n| json!({"id": format!("L{}", n), "timestamp": T0 - n * HOUR_MS}))
        .collect();
    legacy.push(json!({"id": "L0", "timestamp": T0 - 9 * HOUR_MS, "job_title": "Stale"}));
    h.store
        .set(DEFAULT_HISTORY_KEY, &Value::Array(legacy).to_string())
        .unwrap();

    // WHEN listing it
    let ids: Vec<String> = h.api.get_history().into_iter().map(|s| s.id).collect();

    // THEN the first occurrence of each id survives, cut to capacity
    assert_eq!(ids, vec!["L0", "L1", "L2", "L3", "L4"]);
    assert_eq!(stored_history(&h).len(), 5);
    assert_eq!(h.api.get_history()[0].job_title, None);
}

#[test]
fn test_history_is_cut_when_capacity_is_lowered() {
    let h = harness();
    for n in 1..=5 {
        h.api.save(&report(&format!("r{}", n), "Role"));
    }

    let smaller = GuestReportsApi::new(
        h.store.clone(),
        Arc::new(h.clock.clone()),
        GuestCacheConfig {
            history_capacity: 3,
            ..GuestCacheConfig::default()
        },
    );
    let ids: Vec<String> = smaller.get_history().into_iter().map(|s| s.id).collect();

    assert_eq!(ids, vec!["r5", "r4", "r3"]);
    assert_eq!(stored_history(&h).len(), 3);
}

#[test]
fn test_legacy_history_keeps_readable_entries() {
    // GIVEN legacy summaries where some elements have odd shapes
    let h = harness();
    let legacy = json!([
        {"id": "a", "timestamp": (T0 - HOUR_MS).to_string(), "job_title": "Baker"},
        {"id": "b", "timestamp": T0 - HOUR_MS, "url": "https://u", "job_url": "https://j"},
        42,
        {"id": "c", "timestamp": T0 - HOUR_MS, "job_title": "Chef"},
    ]);
    h.store
        .set(DEFAULT_HISTORY_KEY, &legacy.to_string())
        .unwrap();

    // WHEN listing it, the readable entries survive
    let ids: Vec<String> = h.api.get_history().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    // AND a later save keeps them
    h.api.save(&report("r1", "Role"));
    assert_eq!(h.api.get_history().len(), 4);
}

#[test]
fn test_extreme_timestamps_read_as_expired() {
    // GIVEN records whose timestamps would overflow an age computation
    let h = harness();
    h.store
        .set(
            DEFAULT_CURRENT_KEY,
            &json!({"id": "cur", "timestamp": i64::MIN, "data": {}}).to_string(),
        )
        .unwrap();
    h.store
        .set(
            DEFAULT_HISTORY_KEY,
            &json!([
                {"id": "old", "timestamp": i64::MIN, "data": {}},
                {"id": "ok", "timestamp": T0, "data": {}},
            ])
            .to_string(),
        )
        .unwrap();

    // THEN the age is reported without overflowing
    assert!(h.api.get_report_age().is_some_and(|age| age > 0));

    // AND both stale records are treated as expired
    assert_eq!(h.api.load(), None);
    let ids: Vec<String> = h.api.get_history().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["ok"]);
    assert_eq!(h.api.time_ago(i64::MIN), format!("{}d ago", i64::MAX / DAY_MS));
}

#[test]
fn test_open_from_history_prefers_current_slot() {
    let h = harness();
    h.api.save(&report("a", "Alpha"));
    h.api.save(&report("b", "Beta"));

    assert_eq!(
        h.api.load_report_from_history("b").unwrap()["job_title"],
        "Beta"
    );
    assert_eq!(
        h.api.load_report_from_history("a").unwrap()["job_title"],
        "Alpha"
    );
    assert_eq!(h.api.load_report_from_history("zzz"), None);
    // Opening a full entry does not change the current slot
    assert_eq!(h.api.load().unwrap()["id"], "b");
}

#[test]
fn test_quota_exceeded_degrades_to_false() {
    let store = std::sync::Arc::new(jps_core::MemoryStore::with_quota(64));
    let api = jps_core::GuestReportsApi::with_store(store);

    let big = json!({"id": "big", "job_body": "x".repeat(200)});
    assert!(!api.save(&big));
    assert_eq!(
        api.try_save(&big).unwrap_err().kind(),
        ExErrorKind::QuotaExceeded
    );
    assert_eq!(api.load(), None);
}

#[test]
fn test_custom_capacity_and_keys() {
    let h = harness_with(GuestCacheConfig {
        current_key: "cur".to_string(),
        history_key: "hist".to_string(),
        history_capacity: 2,
        ..GuestCacheConfig::default()
    });
    for id in ["a", "b", "c"] {
        h.api.save(&report(id, "Role"));
    }
    assert_eq!(h.api.get_history().len(), 2);
    assert!(h.store.get("cur").unwrap().is_some());
    assert!(h.store.get(DEFAULT_CURRENT_KEY).unwrap().is_none());
}

#[test]
fn test_time_ago_uses_clock() {
    let h = harness();
    h.api.save(&report("r1", "Role"));
    let saved_at = h.api.get_history()[0].timestamp;

    h.clock.advance_ms(3 * HOUR_MS);
    assert_eq!(h.api.time_ago(saved_at), "3h ago");
    assert_eq!(h.api.get_report_age(), Some(180));
}
