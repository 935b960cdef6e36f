//! Guest report cache and session manager.
//!
//! - [`cache`]: current report + rolling history over a [`KeyValueStore`](crate::kv::KeyValueStore)
//! - [`model`]: persisted record layouts, including the legacy summary layout
//! - [`manager`]: per-session save prompt and sign-in hand-off
//! - [`migration`]: guest report → account report on sign-in

pub mod cache;
pub mod manager;
pub mod migration;
pub mod model;

pub use cache::{get_time_ago, GuestReportsApi};
pub use manager::{GuestManager, NavigationContext, NoopPromptSink, PromptSink, QueryParams};
pub use migration::{
    format_report_for_account, migrate_guest_report, migrate_guest_report_in, AccountReport, MigrationOutcome,
    RemoteReportStore,
};
pub use model::{GuestReport, GuestReportSummary, LegacySummary, StoredHistory, SCHEMA_VERSION};
