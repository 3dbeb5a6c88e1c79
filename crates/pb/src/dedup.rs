//! Digest lookups within a namespace.
//!
//! Public and private records are separate dedup domains: a private record
//! never satisfies a public `create`, and the other way round.

use pb_core::{Address, CompactId, Digest, Namespace, Record, RecordKey};
use pb_store::StoreTx;

use crate::error::Result;

/// What a digest lookup found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupHit {
    /// A public record; its compact ID is the address to hand back.
    Public(CompactId),
    /// A private record exists. Its address is not given to anonymous
    /// public dedup.
    Private,
}

/// Digest lookups scoped to one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupIndex {
    namespace: Namespace,
}

impl DedupIndex {
    /// Create an index over `namespace`.
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// Public hit first, then private.
    pub fn lookup(&self, tx: &mut dyn StoreTx, digest: &Digest) -> Result<Option<DedupHit>> {
        if let Some(id) = tx.public_by_digest(self.namespace, digest)? {
            return Ok(Some(DedupHit::Public(id)));
        }
        if tx.private_by_digest(self.namespace, digest)?.is_some() {
            return Ok(Some(DedupHit::Private));
        }
        Ok(None)
    }

    /// Compact ID of the public record holding this digest.
    pub fn public_id(&self, tx: &mut dyn StoreTx, digest: &Digest) -> Result<Option<CompactId>> {
        Ok(tx.public_by_digest(self.namespace, digest)?)
    }

    /// Storage key of the private record holding this digest.
    pub fn private_key(&self, tx: &mut dyn StoreTx, digest: &Digest) -> Result<Option<RecordKey>> {
        Ok(tx.private_by_digest(self.namespace, digest)?)
    }

    /// Address of any record holding this digest. A public hit wins.
    pub fn find_address(&self, tx: &mut dyn StoreTx, digest: &Digest) -> Result<Option<Address>> {
        Ok(self.lookup(tx, digest)?.map(|hit| match hit {
            DedupHit::Public(id) => Address::Id(id),
            DedupHit::Private => Address::Digest(*digest),
        }))
    }

    /// Fetch the record a digest address points at.
    ///
    /// A private record with the digest is preferred; otherwise a public
    /// record's content is still reachable by its digest.
    pub fn resolve(&self, tx: &mut dyn StoreTx, digest: &Digest) -> Result<Option<Record>> {
        if let Some(key) = tx.private_by_digest(self.namespace, digest)? {
            return Ok(tx.record(key)?);
        }
        match tx.public_by_digest(self.namespace, digest)? {
            Some(id) => Ok(tx.record_by_id(self.namespace, id)?.map(|(_, record)| record)),
            None => Ok(None),
        }
    }
}
