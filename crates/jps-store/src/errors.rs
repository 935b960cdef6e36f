//! Error handling for jps-store
//!
//! Backend failures become `jps_core` [`ExError`]s with the storage key
//! attached, so the guest cache can log and degrade them like any other
//! store error.

use jps_core::errors::{ExError, ExErrorKind};
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Schema migration failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    #[error("Migration {migration_id} failed: {reason}")]
    Failed { migration_id: String, reason: String },

    #[error("Checksum mismatch for migration {migration_id}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        migration_id: String,
        expected: String,
        actual: String,
    },
}

impl From<MigrationError> for ExError {
    fn from(err: MigrationError) -> Self {
        let op = match &err {
            MigrationError::Failed { .. } => "migration",
            MigrationError::ChecksumMismatch { .. } => "migration_checksum",
        };
        ExError::new(ExErrorKind::Storage)
            .with_op(op)
            .with_message(err.to_string())
    }
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Storage)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Database error for an operation on one key
pub fn sqlite_key_error(op: &str, key: &str, err: rusqlite::Error) -> ExError {
    from_rusqlite(err).with_op(op.to_string()).with_key(key)
}

/// Create an IO error
pub fn io_error(operation: &str, key: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_key(key)
        .with_message(err.to_string())
}

/// A lock guarding a backend was poisoned by a panicking writer
pub fn poisoned(op: &str, key: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op.to_string())
        .with_key(key)
        .with_message("store lock poisoned")
}
