//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for pb. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking. Every
//! transaction is `BEGIN IMMEDIATE`, so the write lock is held from the
//! first read; several processes sharing one database file therefore agree
//! on a single sequence and a single dedup outcome.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use pb_core::{CompactId, Digest, Namespace, Record, RecordKey, Stats, TokenFingerprint};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::now_millis;
use crate::traits::{BindResult, Store, StoreTx};

/// Default time SQLite waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open a SQLite database with an explicit busy timeout.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        migration::migrate(&mut conn)?;
        tracing::info!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))
}

#[async_trait]
impl Store for SqliteStore {
    async fn transact<T, E, F>(&self, op: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || -> std::result::Result<T, E> {
            let mut conn = lock(&conn)?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(StoreError::from)?;

            let mut stx = SqliteTx { tx };
            // Dropping an uncommitted transaction rolls it back.
            let value = op(&mut stx)?;
            stx.tx.commit().map_err(StoreError::from)?;
            Ok(value)
        })
        .await
        .map_err(|e| E::from(StoreError::Unavailable(format!("spawn_blocking failed: {}", e))))?
    }
}

/// An open `IMMEDIATE` transaction.
struct SqliteTx<'conn> {
    tx: rusqlite::Transaction<'conn>,
}

// Helper to convert a row to Record
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    let namespace: u8 = row.get("namespace")?;
    let compact_id: Option<i64> = row.get("compact_id")?;
    let digest_bytes: Vec<u8> = row.get("digest")?;
    let content: Vec<u8> = row.get("content")?;

    let namespace = Namespace::from_u8(namespace).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(0, "namespace".into(), rusqlite::types::Type::Integer)
    })?;
    let digest = Digest::try_from(digest_bytes.as_slice()).map_err(|_| {
        rusqlite::Error::InvalidColumnType(2, "digest".into(), rusqlite::types::Type::Blob)
    })?;

    Ok(Record {
        namespace,
        compact_id: compact_id.map(|id| CompactId(id as u64)),
        digest,
        content: Bytes::from(content),
    })
}

const RECORD_COLUMNS: &str = "record_key, namespace, compact_id, digest, content";

impl StoreTx for SqliteTx<'_> {
    fn next_sequence(&mut self, namespace: Namespace) -> Result<u64> {
        let value: i64 = self.tx.query_row(
            "INSERT INTO sequences (namespace, last_value) VALUES (?1, 1)
             ON CONFLICT(namespace) DO UPDATE SET last_value = last_value + 1
             RETURNING last_value",
            params![namespace.to_u8()],
            |row| row.get(0),
        )?;
        Ok(value as u64)
    }

    fn public_by_digest(
        &mut self,
        namespace: Namespace,
        digest: &Digest,
    ) -> Result<Option<CompactId>> {
        let id: Option<i64> = self
            .tx
            .query_row(
                "SELECT compact_id FROM records
                 WHERE namespace = ?1 AND digest = ?2 AND compact_id IS NOT NULL",
                params![namespace.to_u8(), digest.as_bytes().as_slice()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|id| CompactId(id as u64)))
    }

    fn private_by_digest(
        &mut self,
        namespace: Namespace,
        digest: &Digest,
    ) -> Result<Option<RecordKey>> {
        let key: Option<i64> = self
            .tx
            .query_row(
                "SELECT record_key FROM records
                 WHERE namespace = ?1 AND digest = ?2 AND compact_id IS NULL",
                params![namespace.to_u8(), digest.as_bytes().as_slice()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(key.map(|k| RecordKey(k as u64)))
    }

    fn record(&mut self, key: RecordKey) -> Result<Option<Record>> {
        self.tx
            .query_row(
                &format!("SELECT {} FROM records WHERE record_key = ?1", RECORD_COLUMNS),
                params![key.0 as i64],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
    }

    fn record_by_id(
        &mut self,
        namespace: Namespace,
        id: CompactId,
    ) -> Result<Option<(RecordKey, Record)>> {
        self.tx
            .query_row(
                &format!(
                    "SELECT {} FROM records WHERE namespace = ?1 AND compact_id = ?2",
                    RECORD_COLUMNS
                ),
                params![namespace.to_u8(), id.0 as i64],
                |row| {
                    let key: i64 = row.get("record_key")?;
                    Ok((RecordKey(key as u64), row_to_record(row)?))
                },
            )
            .optional()
            .map_err(StoreError::from)
    }

    fn insert_record(&mut self, record: &Record) -> Result<RecordKey> {
        let now = now_millis();
        self.tx
            .execute(
                "INSERT INTO records (
                    namespace, compact_id, digest, content, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.namespace.to_u8(),
                    record.compact_id.map(|id| id.0 as i64),
                    record.digest.as_bytes().as_slice(),
                    record.content.as_ref(),
                    now,
                    now,
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, msg)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::Constraint(msg.unwrap_or_else(|| "record exists".into()))
                }
                other => StoreError::Database(other),
            })?;
        Ok(RecordKey(self.tx.last_insert_rowid() as u64))
    }

    fn replace_record(&mut self, key: RecordKey, digest: &Digest, content: &Bytes) -> Result<()> {
        let changed = self.tx.execute(
            "UPDATE records SET digest = ?1, content = ?2, updated_at = ?3
             WHERE record_key = ?4",
            params![
                digest.as_bytes().as_slice(),
                content.as_ref(),
                now_millis(),
                key.0 as i64,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("record key {}", key.0)));
        }
        Ok(())
    }

    fn delete_record(&mut self, key: RecordKey) -> Result<Option<Record>> {
        let record = self.record(key)?;
        if record.is_some() {
            self.tx.execute(
                "DELETE FROM records WHERE record_key = ?1",
                params![key.0 as i64],
            )?;
        }
        Ok(record)
    }

    fn bind_token(
        &mut self,
        fingerprint: &TokenFingerprint,
        key: RecordKey,
    ) -> Result<BindResult> {
        let token_known: bool = self.tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM tokens WHERE fingerprint = ?1)",
            params![fingerprint.as_bytes().as_slice()],
            |row| row.get(0),
        )?;
        if token_known {
            return Ok(BindResult::TokenTaken);
        }

        let record_bound: bool = self.tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM tokens WHERE record_key = ?1)",
            params![key.0 as i64],
            |row| row.get(0),
        )?;
        if record_bound {
            return Ok(BindResult::RecordTaken);
        }

        self.tx.execute(
            "INSERT INTO tokens (fingerprint, record_key, issued_at) VALUES (?1, ?2, ?3)",
            params![
                fingerprint.as_bytes().as_slice(),
                key.0 as i64,
                now_millis()
            ],
        )?;
        Ok(BindResult::Bound)
    }

    fn token_target(&mut self, fingerprint: &TokenFingerprint) -> Result<Option<RecordKey>> {
        let key: Option<Option<i64>> = self
            .tx
            .query_row(
                "SELECT record_key FROM tokens WHERE fingerprint = ?1 AND revoked_at IS NULL",
                params![fingerprint.as_bytes().as_slice()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(key.flatten().map(|k| RecordKey(k as u64)))
    }

    fn revoke_token(&mut self, fingerprint: &TokenFingerprint) -> Result<bool> {
        let changed = self.tx.execute(
            "UPDATE tokens SET record_key = NULL, revoked_at = ?1
             WHERE fingerprint = ?2 AND revoked_at IS NULL",
            params![now_millis(), fingerprint.as_bytes().as_slice()],
        )?;
        Ok(changed > 0)
    }

    fn adjust_stats(
        &mut self,
        namespace: Namespace,
        count_delta: i64,
        bytes_delta: i64,
    ) -> Result<()> {
        self.tx.execute(
            "INSERT INTO stats (namespace, record_count, total_bytes) VALUES (?1, ?2, ?3)
             ON CONFLICT(namespace) DO UPDATE SET
                record_count = record_count + excluded.record_count,
                total_bytes = total_bytes + excluded.total_bytes",
            params![namespace.to_u8(), count_delta, bytes_delta],
        )?;

        let (count, bytes): (i64, i64) = self.tx.query_row(
            "SELECT record_count, total_bytes FROM stats WHERE namespace = ?1",
            params![namespace.to_u8()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if count < 0 || bytes < 0 {
            return Err(StoreError::InvalidData(format!(
                "{} stats would go negative: count {}, bytes {}",
                namespace, count, bytes
            )));
        }
        Ok(())
    }

    fn stats(&mut self, namespace: Namespace) -> Result<Stats> {
        let row: Option<(i64, i64)> = self
            .tx
            .query_row(
                "SELECT record_count, total_bytes FROM stats WHERE namespace = ?1",
                params![namespace.to_u8()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row
            .map(|(count, bytes)| Stats {
                record_count: count as u64,
                total_bytes: bytes as u64,
            })
            .unwrap_or_default())
    }
}
