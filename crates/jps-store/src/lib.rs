//! JobPostScore Store - durable key-value backends for the guest cache
//!
//! Provides:
//! - [`SqliteKvStore`]: one `kv_entries` table, schema managed by an embedded,
//!   checksummed migration runner
//! - [`FsKvStore`]: one JSON file per key, written atomically
//!
//! Both implement [`jps_core::KeyValueStore`], so either can back a
//! [`jps_core::GuestReportsApi`] that survives process restarts.

pub mod db;
pub mod errors;
pub mod fs;
pub mod migrations;
pub mod sqlite_kv;

// Re-export key types
pub use errors::Result;
pub use fs::FsKvStore;
pub use sqlite_kv::SqliteKvStore;
