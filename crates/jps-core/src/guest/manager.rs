//! Guest session orchestration
//!
//! [`GuestManager`] is an explicit instance with a lifecycle: create it per
//! session, drop it (or call [`GuestManager::cleanup`]) on teardown. At most
//! one save prompt is pending per manager, and dropping the manager cancels it.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::errors::{ExError, ExErrorKind, Result};
use crate::guest::cache::GuestReportsApi;

/// UI collaborator that shows the "save your report" dialog
pub trait PromptSink: Send + Sync {
    fn show_save_dialog(&self);
}

/// Sink that does nothing (headless sessions, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPromptSink;

impl PromptSink for NoopPromptSink {
    fn show_save_dialog(&self) {}
}

/// Read-only view of the navigation the session arrived with
pub trait NavigationContext {
    /// First value of query parameter `name`
    fn query_param(&self, name: &str) -> Option<String>;
}

/// Parsed URL query string
///
/// `QueryParams::default()` has no parameters and stands in for "no browser
/// context".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse `a=1&b=two`, with or without a leading `?`
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(name), decode_component(value))
            })
            .collect();
        Self { pairs }
    }
}

impl NavigationContext for QueryParams {
    fn query_param(&self, name: &str) -> Option<String> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }
}

/// `application/x-www-form-urlencoded` component decoding
///
/// Malformed escapes are kept literally.
fn decode_component(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit() =>
            {
                out.push((hex_value(bytes[i + 1]) << 4) | hex_value(bytes[i + 2]));
                i += 2;
            }
            byte => out.push(byte),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

const FROM_PARAM: &str = "from";

/// Session-level guest behaviour over a [`GuestReportsApi`]
pub struct GuestManager {
    api: Arc<GuestReportsApi>,
    sink: Arc<dyn PromptSink>,
    prompt: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for GuestManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestManager")
            .field("api", &self.api)
            .field("has_pending_prompt", &self.has_pending_prompt())
            .finish_non_exhaustive()
    }
}

impl GuestManager {
    pub fn new(api: Arc<GuestReportsApi>, sink: Arc<dyn PromptSink>) -> Self {
        Self {
            api,
            sink,
            prompt: Mutex::new(None),
        }
    }

    pub fn api(&self) -> &Arc<GuestReportsApi> {
        &self.api
    }

    fn prompt_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        // Holds only a handle, so a poisoned lock is still consistent
        self.prompt.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Show the save dialog after `delay`, replacing any pending prompt
    ///
    /// # Errors
    ///
    /// Returns `SchedulerUnavailable` when called outside a tokio runtime.
    pub fn schedule_prompt(&self, delay: Duration) -> Result<()> {
        let runtime = Handle::try_current().map_err(|e| {
            ExError::new(ExErrorKind::SchedulerUnavailable)
                .with_op("schedule_prompt")
                .with_message(e.to_string())
        })?;

        let mut slot = self.prompt_slot();
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let sink = Arc::clone(&self.sink);
        *slot = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(op = "schedule_prompt", "showing save dialog");
            sink.show_save_dialog();
        }));

        tracing::debug!(
            op = "schedule_prompt",
            delay_ms = delay.as_millis() as u64,
            "save prompt scheduled"
        );
        Ok(())
    }

    /// [`schedule_prompt`](Self::schedule_prompt) with the configured delay
    ///
    /// # Errors
    ///
    /// Returns `SchedulerUnavailable` when called outside a tokio runtime.
    pub fn schedule_default_prompt(&self) -> Result<()> {
        self.schedule_prompt(Duration::from_millis(self.api.config().prompt_delay_ms))
    }

    /// Cancel the pending prompt, if any
    pub fn clear_prompt(&self) {
        if let Some(pending) = self.prompt_slot().take() {
            pending.abort();
            tracing::debug!(op = "clear_prompt", "save prompt cancelled");
        }
    }

    /// True while a scheduled prompt has neither fired nor been cancelled
    pub fn has_pending_prompt(&self) -> bool {
        self.prompt_slot()
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }

    /// Tear down session state (cancels the pending prompt)
    pub fn cleanup(&self) {
        self.clear_prompt();
    }

    /// The guest signed in: their reports now live server-side
    pub fn handle_guest_login(&self) -> bool {
        let cleared = self.api.clear_all();
        if cleared {
            tracing::info!(op = "handle_guest_login", "cleared guest cache after login");
        }
        cleared
    }

    /// Arrived via the guest sign-in flow (`?from=guest-login`)
    pub fn is_from_guest_login(&self, nav: &dyn NavigationContext) -> bool {
        nav.query_param(FROM_PARAM).as_deref() == Some("guest-login")
    }

    /// Arrived asking for the demo report (`?from=default`)
    pub fn should_show_default_data(&self, nav: &dyn NavigationContext) -> bool {
        nav.query_param(FROM_PARAM).as_deref() == Some("default")
    }

    pub fn load_guest_report(&self) -> Option<Value> {
        self.api.load()
    }

    pub fn save_report_with_feedback(&self, report: &Value) -> bool {
        self.api.save(report)
    }

    /// A current report exists or the history is non-empty
    pub fn has_any_reports(&self) -> bool {
        self.api.has_report() || !self.api.get_history().is_empty()
    }

    /// Link for sharing a guest report
    ///
    /// Guest reports are not addressable, so this is always the generic
    /// results path whatever `id` is.
    pub fn get_shareable_url(&self, _id: &str) -> String {
        self.api.config().guest_results_path.clone()
    }
}

impl Drop for GuestManager {
    fn drop(&mut self) {
        self.clear_prompt();
    }
}
