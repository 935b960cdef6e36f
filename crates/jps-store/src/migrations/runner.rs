//! Migration runner
//!
//! Every embedded migration runs in its own transaction and is recorded in
//! `schema_version` with its checksum. A recorded migration whose SQL has
//! since changed fails with a checksum mismatch instead of running again.

use std::collections::HashMap;

use rusqlite::{named_params, Connection};

use crate::errors::{from_rusqlite, MigrationError, Result};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::{Migration, MIGRATIONS};

const SCHEMA_VERSION_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    migration_id TEXT NOT NULL UNIQUE,
    applied_at INTEGER NOT NULL,
    checksum TEXT
)";

/// Bring the database up to the latest embedded schema
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_VERSION_DDL)
        .map_err(from_rusqlite)?;
    let recorded = recorded_checksums(conn)?;

    for migration in MIGRATIONS {
        match recorded.get(migration.id) {
            None => run(conn, migration)?,
            Some(Some(expected)) => verify(migration, expected)?,
            Some(None) => {}
        }
    }
    Ok(())
}

/// Ids of applied migrations, oldest first
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT migration_id FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(from_rusqlite)?;
    rows.collect::<rusqlite::Result<Vec<String>>>()
        .map_err(from_rusqlite)
}

fn recorded_checksums(conn: &Connection) -> Result<HashMap<String, Option<String>>> {
    let mut stmt = conn
        .prepare("SELECT migration_id, checksum FROM schema_version")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })
        .map_err(from_rusqlite)?;
    rows.collect::<rusqlite::Result<HashMap<_, _>>>()
        .map_err(from_rusqlite)
}

fn verify(migration: &Migration, expected: &str) -> Result<()> {
    let actual = compute_checksum(migration.sql);
    if actual == expected {
        return Ok(());
    }
    Err(MigrationError::ChecksumMismatch {
        migration_id: migration.id.to_string(),
        expected: expected.to_string(),
        actual,
    }
    .into())
}

fn run(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let tx = conn.transaction().map_err(from_rusqlite)?;

    tx.execute_batch(migration.sql)
        .map_err(|e| MigrationError::Failed {
            migration_id: migration.id.to_string(),
            reason: e.to_string(),
        })?;
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum)
         VALUES (:id, :applied_at, :checksum)",
        named_params! {
            ":id": migration.id,
            ":applied_at": chrono::Utc::now().timestamp(),
            ":checksum": compute_checksum(migration.sql),
        },
    )
    .map_err(from_rusqlite)?;
    tx.commit().map_err(from_rusqlite)?;

    tracing::info!(migration_id = migration.id, "applied migration");
    Ok(())
}
