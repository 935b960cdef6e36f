//! Key-value store seam
//!
//! The guest cache persists JSON text under a handful of fixed keys. Any
//! backend that can get/set/remove strings by key can host it: the in-process
//! [`MemoryStore`] here, or the durable SQLite and filesystem stores in
//! `jps-store`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::errors::{ExError, ExErrorKind, JpsError, Result};

/// String key-value storage
///
/// Implementations report failures as `ExError`s (`Storage`,
/// `QuotaExceeded`, `Io`) and leave degrading them to the caller.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`; `Ok(None)` if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store
///
/// Optionally enforces a byte quota over all stored keys and values, and can
/// be switched to "unavailable" to reproduce storage failures (private
/// browsing, disabled storage) in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys+values exceed `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Make every subsequent operation fail with `Storage`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self, key: &str) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(JpsError::StoreUnavailable {
                key: key.to_string(),
                reason: "storage is disabled in this context".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn poisoned(key: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_key(key)
        .with_message("memory store lock poisoned")
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available(key)?;
        let entries = self.entries.read().map_err(|_| poisoned(key))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_available(key)?;
        let mut entries = self.entries.write().map_err(|_| poisoned(key))?;

        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if others + key.len() + value.len() > quota {
                return Err(JpsError::QuotaExceeded {
                    key: key.to_string(),
                }
                .into());
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_available(key)?;
        let mut entries = self.entries.write().map_err(|_| poisoned(key))?;
        entries.remove(key);
        Ok(())
    }
}
