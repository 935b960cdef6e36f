use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jps_core::guest::{GuestReportsApi, PromptSink};
use jps_core::{GuestCacheConfig, ManualClock, MemoryStore};
use serde_json::{json, Value};

/// 2023-11-14T22:13:20Z
#[allow(dead_code)]
pub const T0: i64 = 1_700_000_000_000;

/// Guest cache over an in-memory store and a manual clock at [`T0`]
#[allow(dead_code)]
pub struct Harness {
    pub api: Arc<GuestReportsApi>,
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
}

#[allow(dead_code)]
pub fn harness() -> Harness {
    harness_with(GuestCacheConfig::default())
}

#[allow(dead_code)]
pub fn harness_with(config: GuestCacheConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(T0);
    let api = Arc::new(GuestReportsApi::new(
        store.clone(),
        Arc::new(clock.clone()),
        config,
    ));
    Harness { api, store, clock }
}

/// Minimal audit report document
#[allow(dead_code)]
pub fn report(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "job_title": title,
        "company_name": "Acme",
        "job_url": format!("https://jobs.example/{}", id),
        "overallScore": 70,
        "job_body": format!("{} wanted", title),
    })
}

/// Prompt sink counting how often the dialog was shown
#[derive(Default)]
#[allow(dead_code)]
pub struct CountingSink {
    shown: AtomicUsize,
}

#[allow(dead_code)]
impl CountingSink {
    pub fn count(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }
}

impl PromptSink for CountingSink {
    fn show_save_dialog(&self) {
        self.shown.fetch_add(1, Ordering::SeqCst);
    }
}
