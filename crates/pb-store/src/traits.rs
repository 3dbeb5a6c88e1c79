//! Store trait: the abstract interface to the storage engine.
//!
//! The core never mutates storage outside a transaction. [`Store::transact`]
//! hands a [`StoreTx`] to a closure and commits only if the closure returns
//! `Ok`; any `Err` (a storage failure or a domain rejection such as a
//! conflict) rolls every primitive back.

use async_trait::async_trait;
use bytes::Bytes;
use pb_core::{CompactId, Digest, Namespace, Record, RecordKey, Stats, TokenFingerprint};

use crate::error::{Result, StoreError};

/// Result of binding a token fingerprint to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindResult {
    /// The binding was recorded.
    Bound,
    /// The fingerprint is already known (live or revoked).
    TokenTaken,
    /// The record already has a token.
    RecordTaken,
}

/// The primitive operations available inside a transaction.
///
/// Implementations must make every call visible to later calls in the same
/// transaction and invisible to everyone else until commit.
pub trait StoreTx {
    // ─────────────────────────────────────────────────────────────────────────
    // Sequences
    // ─────────────────────────────────────────────────────────────────────────

    /// Increment and return the namespace's sequence. The first call
    /// returns 1. Values are never handed out twice, even after the record
    /// that carried one is deleted.
    fn next_sequence(&mut self, namespace: Namespace) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Records and the digest index
    // ─────────────────────────────────────────────────────────────────────────

    /// Compact ID of the public record with this digest, if any.
    fn public_by_digest(
        &mut self,
        namespace: Namespace,
        digest: &Digest,
    ) -> Result<Option<CompactId>>;

    /// Key of the private record with this digest, if any.
    fn private_by_digest(
        &mut self,
        namespace: Namespace,
        digest: &Digest,
    ) -> Result<Option<RecordKey>>;

    /// Get a record by key.
    fn record(&mut self, key: RecordKey) -> Result<Option<Record>>;

    /// Get a public record by compact ID.
    fn record_by_id(
        &mut self,
        namespace: Namespace,
        id: CompactId,
    ) -> Result<Option<(RecordKey, Record)>>;

    /// Insert a new record. Fails with a constraint error if its compact ID,
    /// or its digest within the same visibility, is already taken.
    fn insert_record(&mut self, record: &Record) -> Result<RecordKey>;

    /// Replace a record's content and digest, keeping its key and compact ID.
    fn replace_record(&mut self, key: RecordKey, digest: &Digest, content: &Bytes) -> Result<()>;

    /// Remove a record, returning what was removed.
    fn delete_record(&mut self, key: RecordKey) -> Result<Option<Record>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Ownership tokens
    // ─────────────────────────────────────────────────────────────────────────

    /// Bind a token fingerprint to a record.
    fn bind_token(
        &mut self,
        fingerprint: &TokenFingerprint,
        key: RecordKey,
    ) -> Result<BindResult>;

    /// The record a live token is bound to. Revoked and unknown tokens
    /// both resolve to `None`.
    fn token_target(&mut self, fingerprint: &TokenFingerprint) -> Result<Option<RecordKey>>;

    /// Permanently revoke a token. The fingerprint is kept as a tombstone so
    /// it can never be bound again. Returns whether a live token was revoked.
    fn revoke_token(&mut self, fingerprint: &TokenFingerprint) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Stats
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply deltas to both running totals of a namespace.
    fn adjust_stats(
        &mut self,
        namespace: Namespace,
        count_delta: i64,
        bytes_delta: i64,
    ) -> Result<()>;

    /// Current totals of a namespace.
    fn stats(&mut self, namespace: Namespace) -> Result<Stats>;
}

/// The Store trait: async access to the storage engine.
///
/// All cross-request coordination (dedup races, sequence allocation, token
/// binding) is delegated to the atomicity of `transact`.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Run `op` in a single transaction.
    ///
    /// Commits when `op` returns `Ok`, rolls back otherwise. Once submitted
    /// the transaction runs to commit or rollback even if the returned
    /// future is dropped.
    async fn transact<T, E, F>(&self, op: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static;
}

/// Extension trait for common read-only patterns.
pub trait StoreExt: Store {
    /// Snapshot the totals of one namespace.
    fn snapshot_stats(
        &self,
        namespace: Namespace,
    ) -> impl std::future::Future<Output = Result<Stats>> + Send;
}

impl<S: Store> StoreExt for S {
    async fn snapshot_stats(&self, namespace: Namespace) -> Result<Stats> {
        self.transact(move |tx| tx.stats(namespace)).await
    }
}
