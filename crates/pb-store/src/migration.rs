//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, crate::now_millis()],
            )?;
            tracing::info!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Records: every stored paste or short URL
        CREATE TABLE records (
            record_key INTEGER PRIMARY KEY AUTOINCREMENT,  -- never reused
            namespace INTEGER NOT NULL,       -- Namespace as u8
            compact_id INTEGER,               -- NULL for private records
            digest BLOB NOT NULL,             -- 32 bytes, BLAKE3 of content
            content BLOB NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- The dedup index: one public and one private record per digest
        CREATE UNIQUE INDEX idx_records_compact_id
            ON records(namespace, compact_id) WHERE compact_id IS NOT NULL;
        CREATE UNIQUE INDEX idx_records_public_digest
            ON records(namespace, digest) WHERE compact_id IS NOT NULL;
        CREATE UNIQUE INDEX idx_records_private_digest
            ON records(namespace, digest) WHERE compact_id IS NULL;

        -- Compact ID sequences, independent of records so deletes never
        -- rewind them
        CREATE TABLE sequences (
            namespace INTEGER PRIMARY KEY,
            last_value INTEGER NOT NULL
        );

        -- Ownership tokens, by fingerprint. Revoked rows keep the
        -- fingerprint and drop the record_key.
        CREATE TABLE tokens (
            fingerprint BLOB PRIMARY KEY,     -- 32 bytes, BLAKE3 of token
            record_key INTEGER UNIQUE,        -- NULL once revoked
            issued_at INTEGER NOT NULL,
            revoked_at INTEGER
        );

        -- Running totals per namespace
        CREATE TABLE stats (
            namespace INTEGER PRIMARY KEY,
            record_count INTEGER NOT NULL DEFAULT 0,
            total_bytes INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )?;

    Ok(())
}
