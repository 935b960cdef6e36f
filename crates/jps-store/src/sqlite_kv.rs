//! SQLite-backed key-value store

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use jps_core::errors::Result;
use jps_core::KeyValueStore;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db;
use crate::errors::{poisoned, sqlite_key_error};
use crate::migrations::apply_migrations;

/// Key-value entries in a single SQLite table
///
/// The connection is serialised behind a mutex; guest cache traffic is a
/// handful of small reads and writes per user action.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteKvStore").finish_non_exhaustive()
    }
}

impl SqliteKvStore {
    /// Open (or create) the database file at `path` and migrate it
    ///
    /// # Errors
    ///
    /// Returns `Io` if the parent directory cannot be created and `Storage`
    /// if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = db::open(path.as_ref())?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened sqlite kv store");
        Ok(Self::from_connection(conn))
    }

    /// Fresh in-memory database
    ///
    /// # Errors
    ///
    /// Returns `Storage` if SQLite cannot be initialised.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        apply_migrations(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self, op: &str, key: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| poisoned(op, key))
    }

    /// Every stored key, sorted
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the table cannot be read.
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock("sqlite_keys", "*")?;
        let mut stmt = conn
            .prepare("SELECT key FROM kv_entries ORDER BY key")
            .map_err(|e| sqlite_key_error("sqlite_keys", "*", e))?;
        let keys = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| sqlite_key_error("sqlite_keys", "*", e))?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(|e| sqlite_key_error("sqlite_keys", "*", e))?;
        Ok(keys)
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock("sqlite_get", key)?;
        conn.query_row(
            "SELECT value FROM kv_entries WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| sqlite_key_error("sqlite_get", key, e))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock("sqlite_set", key)?;
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )
        .map_err(|e| sqlite_key_error("sqlite_set", key, e))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock("sqlite_remove", key)?;
        conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
            .map_err(|e| sqlite_key_error("sqlite_remove", key, e))?;
        Ok(())
    }
}
