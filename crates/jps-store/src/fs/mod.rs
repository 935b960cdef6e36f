//! Filesystem-backed key-value store
//!
//! One `<key>.json` file per key under a root directory. Writes go through
//! [`atomic::atomic_write`] so a crash never leaves a half-written value.

pub mod atomic;
mod fs_kv;

pub use fs_kv::{file_name_for_key, FsKvStore};
