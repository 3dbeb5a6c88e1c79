//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence. A transaction runs
//! against a staged copy of the state and is swapped in on success.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use pb_core::{CompactId, Digest, Namespace, Record, RecordKey, Stats, TokenFingerprint};

use crate::error::{Result, StoreError};
use crate::traits::{BindResult, Store, StoreTx};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Clone, Default)]
struct MemoryStoreInner {
    /// Records indexed by key.
    records: BTreeMap<RecordKey, Record>,

    /// Last record key handed out; keys are never reused.
    last_key: u64,

    /// Compact ID index: (namespace, id) -> record key.
    ids: HashMap<(Namespace, CompactId), RecordKey>,

    /// Public digest index: (namespace, digest) -> record key.
    public_digests: HashMap<(Namespace, Digest), RecordKey>,

    /// Private digest index: (namespace, digest) -> record key.
    private_digests: HashMap<(Namespace, Digest), RecordKey>,

    /// Sequence high-water marks.
    sequences: HashMap<Namespace, u64>,

    /// Token fingerprints. `None` marks a revoked token.
    tokens: HashMap<TokenFingerprint, Option<RecordKey>>,

    /// Running totals.
    stats: HashMap<Namespace, Stats>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn run<T, E, F>(&self, op: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))?;

        let mut staged = inner.clone();
        let value = op(&mut MemoryTx { state: &mut staged })?;
        *inner = staged;
        Ok(value)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn transact<T, E, F>(&self, op: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        self.run(op)
    }
}

struct MemoryTx<'a> {
    state: &'a mut MemoryStoreInner,
}

impl MemoryTx<'_> {
    fn digest_index(&mut self, record: &Record) -> &mut HashMap<(Namespace, Digest), RecordKey> {
        if record.is_private() {
            &mut self.state.private_digests
        } else {
            &mut self.state.public_digests
        }
    }

    fn unindex(&mut self, record: &Record) {
        if let Some(id) = record.compact_id {
            self.state.ids.remove(&(record.namespace, id));
        }
        self.digest_index(record)
            .remove(&(record.namespace, record.digest));
    }
}

impl StoreTx for MemoryTx<'_> {
    fn next_sequence(&mut self, namespace: Namespace) -> Result<u64> {
        let last = self.state.sequences.entry(namespace).or_insert(0);
        *last += 1;
        Ok(*last)
    }

    fn public_by_digest(
        &mut self,
        namespace: Namespace,
        digest: &Digest,
    ) -> Result<Option<CompactId>> {
        Ok(self
            .state
            .public_digests
            .get(&(namespace, *digest))
            .and_then(|key| self.state.records.get(key))
            .and_then(|record| record.compact_id))
    }

    fn private_by_digest(
        &mut self,
        namespace: Namespace,
        digest: &Digest,
    ) -> Result<Option<RecordKey>> {
        Ok(self
            .state
            .private_digests
            .get(&(namespace, *digest))
            .copied())
    }

    fn record(&mut self, key: RecordKey) -> Result<Option<Record>> {
        Ok(self.state.records.get(&key).cloned())
    }

    fn record_by_id(
        &mut self,
        namespace: Namespace,
        id: CompactId,
    ) -> Result<Option<(RecordKey, Record)>> {
        Ok(self
            .state
            .ids
            .get(&(namespace, id))
            .and_then(|key| self.state.records.get(key).map(|r| (*key, r.clone()))))
    }

    fn insert_record(&mut self, record: &Record) -> Result<RecordKey> {
        let digest_key = (record.namespace, record.digest);
        if self.digest_index(record).contains_key(&digest_key) {
            return Err(StoreError::Constraint(format!(
                "digest {} already stored",
                record.digest
            )));
        }
        if let Some(id) = record.compact_id {
            if self.state.ids.contains_key(&(record.namespace, id)) {
                return Err(StoreError::Constraint(format!(
                    "compact id {} already stored",
                    id.0
                )));
            }
        }

        self.state.last_key += 1;
        let key = RecordKey(self.state.last_key);

        if let Some(id) = record.compact_id {
            self.state.ids.insert((record.namespace, id), key);
        }
        self.digest_index(record).insert(digest_key, key);
        self.state.records.insert(key, record.clone());
        Ok(key)
    }

    fn replace_record(&mut self, key: RecordKey, digest: &Digest, content: &Bytes) -> Result<()> {
        let old = self
            .state
            .records
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("record key {}", key.0)))?;

        let updated = Record {
            digest: *digest,
            content: content.clone(),
            ..old.clone()
        };
        if updated.digest != old.digest
            && self
                .digest_index(&updated)
                .contains_key(&(updated.namespace, updated.digest))
        {
            return Err(StoreError::Constraint(format!(
                "digest {} already stored",
                digest
            )));
        }

        self.digest_index(&old).remove(&(old.namespace, old.digest));
        self.digest_index(&updated)
            .insert((updated.namespace, updated.digest), key);
        self.state.records.insert(key, updated);
        Ok(())
    }

    fn delete_record(&mut self, key: RecordKey) -> Result<Option<Record>> {
        let record = self.state.records.remove(&key);
        if let Some(record) = &record {
            self.unindex(record);
        }
        Ok(record)
    }

    fn bind_token(
        &mut self,
        fingerprint: &TokenFingerprint,
        key: RecordKey,
    ) -> Result<BindResult> {
        if self.state.tokens.contains_key(fingerprint) {
            return Ok(BindResult::TokenTaken);
        }
        if self.state.tokens.values().any(|bound| *bound == Some(key)) {
            return Ok(BindResult::RecordTaken);
        }
        self.state.tokens.insert(*fingerprint, Some(key));
        Ok(BindResult::Bound)
    }

    fn token_target(&mut self, fingerprint: &TokenFingerprint) -> Result<Option<RecordKey>> {
        Ok(self.state.tokens.get(fingerprint).copied().flatten())
    }

    fn revoke_token(&mut self, fingerprint: &TokenFingerprint) -> Result<bool> {
        match self.state.tokens.get_mut(fingerprint) {
            Some(bound) if bound.is_some() => {
                *bound = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn adjust_stats(
        &mut self,
        namespace: Namespace,
        count_delta: i64,
        bytes_delta: i64,
    ) -> Result<()> {
        let stats = self.state.stats.entry(namespace).or_default();
        let record_count = stats.record_count.checked_add_signed(count_delta);
        let total_bytes = stats.total_bytes.checked_add_signed(bytes_delta);
        match (record_count, total_bytes) {
            (Some(record_count), Some(total_bytes)) => {
                *stats = Stats {
                    record_count,
                    total_bytes,
                };
                Ok(())
            }
            _ => Err(StoreError::InvalidData(format!(
                "{} stats would go negative",
                namespace
            ))),
        }
    }

    fn stats(&mut self, namespace: Namespace) -> Result<Stats> {
        Ok(self
            .state
            .stats
            .get(&namespace)
            .copied()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_core::OwnershipToken;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let record = Record::public(Namespace::Paste, CompactId(1), Bytes::from_static(b"hi"));
        let digest = record.digest;

        let key = store
            .transact(move |tx| tx.insert_record(&record))
            .await
            .unwrap();

        let (id, fetched) = store
            .transact(move |tx| -> Result<_> {
                Ok((
                    tx.public_by_digest(Namespace::Paste, &digest)?,
                    tx.record(key)?,
                ))
            })
            .await
            .unwrap();
        assert_eq!(id, Some(CompactId(1)));
        assert_eq!(fetched.map(|r| r.content), Some(Bytes::from_static(b"hi")));
    }

    #[tokio::test]
    async fn test_memory_store_rolls_back() {
        let store = MemoryStore::new();

        let result = store
            .transact(|tx| -> Result<()> {
                tx.next_sequence(Namespace::Paste)?;
                tx.adjust_stats(Namespace::Paste, 1, 10)?;
                Err(StoreError::Unavailable("abort".into()))
            })
            .await;
        assert!(result.is_err());

        let (seq, stats) = store
            .transact(|tx| -> Result<_> {
                Ok((tx.next_sequence(Namespace::Paste)?, tx.stats(Namespace::Paste)?))
            })
            .await
            .unwrap();
        assert_eq!(seq, 1);
        assert_eq!(stats, Stats::default());
    }

    #[tokio::test]
    async fn test_replace_moves_digest_index() {
        let store = MemoryStore::new();
        let new_digest = Digest::of(b"after");

        let found = store
            .transact(move |tx| -> Result<_> {
                let before = Record::private(Namespace::Paste, Bytes::from_static(b"before"));
                let key = tx.insert_record(&before)?;
                tx.replace_record(key, &new_digest, &Bytes::from_static(b"after"))?;
                Ok((
                    tx.private_by_digest(Namespace::Paste, &Digest::of(b"before"))?,
                    tx.private_by_digest(Namespace::Paste, &new_digest)?,
                    key,
                ))
            })
            .await
            .unwrap();

        assert_eq!(found.0, None);
        assert_eq!(found.1, Some(found.2));
    }

    #[tokio::test]
    async fn test_revoked_token_cannot_rebind() {
        let store = MemoryStore::new();
        let fp = OwnershipToken::generate().fingerprint();

        let rebind = store
            .transact(move |tx| -> Result<_> {
                let key =
                    tx.insert_record(&Record::private(Namespace::Paste, Bytes::from_static(b"x")))?;
                tx.bind_token(&fp, key)?;
                assert!(tx.revoke_token(&fp)?);
                assert!(!tx.revoke_token(&fp)?);
                assert_eq!(tx.token_target(&fp)?, None);
                tx.bind_token(&fp, key)
            })
            .await
            .unwrap();
        assert_eq!(rebind, BindResult::TokenTaken);
    }
}
