//! A store wrapper that fails one chosen primitive.
//!
//! Arm a [`StoreOp`]; the next call to that primitive inside any
//! transaction returns `StoreError::Unavailable`, and the transaction is
//! rolled back by the wrapped engine like any other error.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use pb_core::{CompactId, Digest, Namespace, Record, RecordKey, Stats, TokenFingerprint};
use pb_store::{BindResult, Result, Store, StoreError, StoreTx};

/// The storage primitives a fault can be armed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    NextSequence,
    PublicByDigest,
    PrivateByDigest,
    Record,
    RecordById,
    InsertRecord,
    ReplaceRecord,
    DeleteRecord,
    BindToken,
    TokenTarget,
    RevokeToken,
    AdjustStats,
    Stats,
}

pub struct FaultyStore<S: Store> {
    inner: S,
    armed: Arc<Mutex<Option<StoreOp>>>,
}

impl<S: Store> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            armed: Arc::new(Mutex::new(None)),
        }
    }

    /// Fail the next call to `op`. Replaces any fault still armed.
    pub fn arm(&self, op: StoreOp) {
        if let Ok(mut armed) = self.armed.lock() {
            *armed = Some(op);
        }
    }

    pub fn disarm(&self) {
        if let Ok(mut armed) = self.armed.lock() {
            *armed = None;
        }
    }

    /// Whether an armed fault has not fired yet.
    pub fn is_armed(&self) -> bool {
        self.armed.lock().map(|a| a.is_some()).unwrap_or(false)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: Store> Store for FaultyStore<S> {
    async fn transact<T, E, F>(&self, op: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let armed = Arc::clone(&self.armed);
        self.inner
            .transact(move |tx| {
                let mut faulty = FaultyTx { inner: tx, armed };
                op(&mut faulty)
            })
            .await
    }
}

struct FaultyTx<'a> {
    inner: &'a mut dyn StoreTx,
    armed: Arc<Mutex<Option<StoreOp>>>,
}

impl FaultyTx<'_> {
    fn check(&self, op: StoreOp) -> Result<()> {
        let mut armed = self
            .armed
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))?;
        if *armed == Some(op) {
            *armed = None;
            return Err(StoreError::Unavailable(format!("injected fault on {:?}", op)));
        }
        Ok(())
    }
}

impl StoreTx for FaultyTx<'_> {
    fn next_sequence(&mut self, namespace: Namespace) -> Result<u64> {
        self.check(StoreOp::NextSequence)?;
        self.inner.next_sequence(namespace)
    }

    fn public_by_digest(
        &mut self,
        namespace: Namespace,
        digest: &Digest,
    ) -> Result<Option<CompactId>> {
        self.check(StoreOp::PublicByDigest)?;
        self.inner.public_by_digest(namespace, digest)
    }

    fn private_by_digest(
        &mut self,
        namespace: Namespace,
        digest: &Digest,
    ) -> Result<Option<RecordKey>> {
        self.check(StoreOp::PrivateByDigest)?;
        self.inner.private_by_digest(namespace, digest)
    }

    fn record(&mut self, key: RecordKey) -> Result<Option<Record>> {
        self.check(StoreOp::Record)?;
        self.inner.record(key)
    }

    fn record_by_id(
        &mut self,
        namespace: Namespace,
        id: CompactId,
    ) -> Result<Option<(RecordKey, Record)>> {
        self.check(StoreOp::RecordById)?;
        self.inner.record_by_id(namespace, id)
    }

    fn insert_record(&mut self, record: &Record) -> Result<RecordKey> {
        self.check(StoreOp::InsertRecord)?;
        self.inner.insert_record(record)
    }

    fn replace_record(&mut self, key: RecordKey, digest: &Digest, content: &Bytes) -> Result<()> {
        self.check(StoreOp::ReplaceRecord)?;
        self.inner.replace_record(key, digest, content)
    }

    fn delete_record(&mut self, key: RecordKey) -> Result<Option<Record>> {
        self.check(StoreOp::DeleteRecord)?;
        self.inner.delete_record(key)
    }

    fn bind_token(
        &mut self,
        fingerprint: &TokenFingerprint,
        key: RecordKey,
    ) -> Result<BindResult> {
        self.check(StoreOp::BindToken)?;
        self.inner.bind_token(fingerprint, key)
    }

    fn token_target(&mut self, fingerprint: &TokenFingerprint) -> Result<Option<RecordKey>> {
        self.check(StoreOp::TokenTarget)?;
        self.inner.token_target(fingerprint)
    }

    fn revoke_token(&mut self, fingerprint: &TokenFingerprint) -> Result<bool> {
        self.check(StoreOp::RevokeToken)?;
        self.inner.revoke_token(fingerprint)
    }

    fn adjust_stats(
        &mut self,
        namespace: Namespace,
        count_delta: i64,
        bytes_delta: i64,
    ) -> Result<()> {
        self.check(StoreOp::AdjustStats)?;
        self.inner.adjust_stats(namespace, count_delta, bytes_delta)
    }

    fn stats(&mut self, namespace: Namespace) -> Result<Stats> {
        self.check(StoreOp::Stats)?;
        self.inner.stats(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_store::MemoryStore;

    #[tokio::test]
    async fn test_fault_fires_once_and_rolls_back() {
        let store = FaultyStore::new(MemoryStore::new());
        store.arm(StoreOp::AdjustStats);

        let result = store
            .transact(|tx| -> Result<()> {
                tx.next_sequence(Namespace::Paste)?;
                tx.adjust_stats(Namespace::Paste, 1, 1)
            })
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(!store.is_armed());

        let seq = store
            .transact(|tx| tx.next_sequence(Namespace::Paste))
            .await
            .unwrap();
        assert_eq!(seq, 1);
    }
}
