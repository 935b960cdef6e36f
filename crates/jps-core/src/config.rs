//! Guest cache configuration
//!
//! Every field has a default matching the production web client, so an empty
//! TOML document (or no file at all) yields a working configuration.
//!
//! ```toml
//! history_capacity = 10
//! current_ttl_ms = 3600000
//! guest_results_path = "/results"
//! ```

use crate::errors::{JpsError, Result};
use serde::Deserialize;
use std::path::Path;

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

pub const DEFAULT_CURRENT_KEY: &str = "guest_audit_report";
pub const DEFAULT_HISTORY_KEY: &str = "guest_report_history";
pub const DEFAULT_CURRENT_TTL_MS: i64 = DAY_MS;
pub const DEFAULT_HISTORY_TTL_MS: i64 = 7 * DAY_MS;
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;
pub const DEFAULT_GUEST_RESULTS_PATH: &str = "/results";
pub const DEFAULT_PROMPT_DELAY_MS: u64 = 6000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuestCacheConfig {
    /// Storage key of the current-report slot
    pub current_key: String,
    /// Storage key of the rolling history
    pub history_key: String,
    pub current_ttl_ms: i64,
    /// Applied per history entry
    pub history_ttl_ms: i64,
    pub history_capacity: usize,
    /// Generic results path; guest reports are never addressable by id
    pub guest_results_path: String,
    pub prompt_delay_ms: u64,
}

impl Default for GuestCacheConfig {
    fn default() -> Self {
        Self {
            current_key: DEFAULT_CURRENT_KEY.to_string(),
            history_key: DEFAULT_HISTORY_KEY.to_string(),
            current_ttl_ms: DEFAULT_CURRENT_TTL_MS,
            history_ttl_ms: DEFAULT_HISTORY_TTL_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            guest_results_path: DEFAULT_GUEST_RESULTS_PATH.to_string(),
            prompt_delay_ms: DEFAULT_PROMPT_DELAY_MS,
        }
    }
}

impl GuestCacheConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns `Config` if the document does not parse or fails [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: GuestCacheConfig = toml::from_str(text).map_err(|e| JpsError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `Config` if it is invalid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::errors::ExError::new(crate::errors::ExErrorKind::Io)
                .with_op("load_config")
                .with_key(path.display().to_string())
                .with_message(e.to_string())
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject configurations the cache cannot honour
    ///
    /// # Errors
    ///
    /// Returns `Config` for empty or identical keys, non-positive TTLs or a
    /// zero history capacity.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.current_key.is_empty() || self.history_key.is_empty() {
            Some("storage keys must not be empty")
        } else if self.current_key == self.history_key {
            Some("current_key and history_key must differ")
        } else if self.current_ttl_ms <= 0 || self.history_ttl_ms <= 0 {
            Some("TTLs must be positive")
        } else if self.history_capacity == 0 {
            Some("history_capacity must be at least 1")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(JpsError::InvalidConfig {
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }
}
