//! Schema migrations for the SQLite key-value store
//!
//! Embedded SQL, applied once each and pinned by checksum.

mod checksums;
mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
