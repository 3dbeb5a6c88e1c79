//! One namespace's allocator, dedup index and stats, used together.

use bytes::Bytes;
use pb_core::{Address, CompactId, Digest, Namespace, Record, RecordKey};
use pb_store::StoreTx;

use crate::allocator::IdAllocator;
use crate::dedup::DedupIndex;
use crate::error::Result;
use crate::stats::StatsAggregator;

/// Outcome of a public create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicInsert {
    /// Same content was already public under this ID.
    Existing(CompactId),
    /// A new record was stored.
    Inserted { key: RecordKey, id: CompactId },
}

impl PublicInsert {
    pub fn id(&self) -> CompactId {
        match self {
            PublicInsert::Existing(id) | PublicInsert::Inserted { id, .. } => *id,
        }
    }

    pub fn address(&self) -> Address {
        Address::Id(self.id())
    }
}

/// The per-namespace components a write touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSpace {
    pub allocator: IdAllocator,
    pub dedup: DedupIndex,
    pub stats: StatsAggregator,
}

impl AddressSpace {
    /// Create the components for `namespace` at `width`.
    pub fn new(namespace: Namespace, width: usize) -> Self {
        Self {
            allocator: IdAllocator::new(namespace, width),
            dedup: DedupIndex::new(namespace),
            stats: StatsAggregator::new(namespace),
        }
    }

    /// Get the namespace.
    pub fn namespace(&self) -> Namespace {
        self.allocator.namespace()
    }

    /// Get the compact ID display width.
    pub fn width(&self) -> usize {
        self.allocator.width()
    }

    /// Return the public ID for `content`, storing it first if needed.
    ///
    /// Private records with the same digest are ignored.
    pub fn insert_public(&self, tx: &mut dyn StoreTx, content: Bytes) -> Result<PublicInsert> {
        let digest = Digest::of(&content);
        if let Some(id) = self.dedup.public_id(tx, &digest)? {
            tracing::debug!(namespace = %self.namespace(), %id, "dedup hit");
            return Ok(PublicInsert::Existing(id));
        }

        let id = self.allocator.next(tx)?;
        let record = Record::public(self.namespace(), id, content);
        let key = tx.insert_record(&record)?;
        self.stats.record_insert(tx, &record)?;
        tracing::debug!(
            namespace = %self.namespace(),
            %id,
            bytes = record.len(),
            "inserted public record"
        );
        Ok(PublicInsert::Inserted { key, id })
    }
}
