//! JobPostScore Core - diff engine and guest report cache
//!
//! This crate provides the two algorithmic pieces of the JobPostScore client:
//! - A word-level LCS diff engine between an original job posting and its
//!   AI-optimized rewrite, with accept/reject folding back into text
//! - A best-effort guest report cache (current report + bounded rolling
//!   history) over a pluggable key-value store, with TTL expiry and
//!   legacy-format migration
//! - The guest session manager (save prompt timer, login hand-off) and the
//!   guest-to-account migration flow
//!
//! The surrounding UI, the remote scoring API and the auth provider are
//! collaborators reached only through the traits in [`kv`], [`clock`],
//! [`guest::manager`] and [`guest::migration`].

pub mod clock;
pub mod config;
pub mod diff;
pub mod errors;
pub mod guest;
pub mod kv;
pub mod logging_facility;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GuestCacheConfig;
pub use diff::{
    apply_change, apply_decisions, generate_diff, get_diff_stats, ChangeId, Decisions,
    DiffAction, DiffItem, DiffKind, DiffStats,
};
pub use errors::{ExError, ExErrorKind, JpsError, Result};
pub use guest::{
    migrate_guest_report, migrate_guest_report_in, GuestManager, GuestReport, GuestReportSummary, GuestReportsApi,
    MigrationOutcome, NoopPromptSink, PromptSink, QueryParams, RemoteReportStore,
};
pub use kv::{KeyValueStore, MemoryStore};
