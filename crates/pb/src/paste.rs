//! The paste store: every operation is one storage transaction.
//!
//! Writes either complete with every index, token and stats change applied
//! or leave storage untouched.

use std::sync::Arc;

use bytes::Bytes;
use pb_core::{Address, Digest, Namespace, OwnershipToken, Record, Stats};
use pb_store::Store;

use crate::error::{PasteError, Result};
use crate::ownership::OwnershipRegistry;
use crate::space::{AddressSpace, PublicInsert};

/// Paste operations over a storage engine.
pub struct PasteStore<S: Store> {
    store: Arc<S>,
    space: AddressSpace,
    owners: OwnershipRegistry,
}

impl<S: Store> Clone for PasteStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            space: self.space,
            owners: self.owners,
        }
    }
}

impl<S: Store> PasteStore<S> {
    /// Create a paste store rendering compact IDs at `id_width`.
    pub fn new(store: Arc<S>, id_width: usize) -> Self {
        Self {
            store,
            space: AddressSpace::new(Namespace::Paste, id_width),
            owners: OwnershipRegistry::new(),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the display width of paste IDs.
    pub fn id_width(&self) -> usize {
        self.space.width()
    }

    /// Textual form of an address at this store's width.
    pub fn render(&self, address: &Address) -> Result<String> {
        Ok(address.render(self.id_width())?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Address of any record holding this content, public first.
    pub async fn find_by_content(&self, content: impl Into<Bytes>) -> Result<Option<Address>> {
        let content = non_empty(content.into())?;
        let digest = Digest::of(&content);
        let space = self.space;

        let found = self
            .store
            .transact(move |tx| space.dedup.find_address(tx, &digest))
            .await;
        observe("find_by_content", found)
    }

    /// Content at an address.
    ///
    /// A digest address reaches private records and also public ones.
    pub async fn read(&self, address: Address) -> Result<Option<Bytes>> {
        let space = self.space;
        let found = self
            .store
            .transact(move |tx| -> Result<_> {
                let record = match address {
                    Address::Id(id) => tx
                        .record_by_id(space.namespace(), id)?
                        .map(|(_, record)| record),
                    Address::Digest(digest) => space.dedup.resolve(tx, &digest)?,
                };
                Ok(record.map(|r| r.content))
            })
            .await;
        observe("read", found)
    }

    /// Record count and byte totals of the paste namespace.
    pub async fn stats(&self) -> Result<Stats> {
        let space = self.space;
        let stats = self
            .store
            .transact(move |tx| space.stats.snapshot(tx))
            .await;
        observe("stats", stats)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Store public content, or return the address it already has.
    pub async fn create(&self, content: impl Into<Bytes>) -> Result<Address> {
        let content = non_empty(content.into())?;
        let space = self.space;

        let created = self
            .store
            .transact(move |tx| space.insert_public(tx, content))
            .await
            .map(|insert| insert.address());
        observe("create", created)
    }

    /// Like [`create`](Self::create), but a newly stored record also gets an
    /// ownership token. A dedup hit returns the existing address and no
    /// token: the first creator owns it.
    pub async fn create_owned(
        &self,
        content: impl Into<Bytes>,
    ) -> Result<(Address, Option<OwnershipToken>)> {
        let content = non_empty(content.into())?;
        let space = self.space;
        let owners = self.owners;

        let created = self
            .store
            .transact(move |tx| -> Result<_> {
                match space.insert_public(tx, content)? {
                    PublicInsert::Existing(id) => Ok((Address::Id(id), None)),
                    PublicInsert::Inserted { key, id } => {
                        let token = owners.issue(tx, key, Address::Id(id))?;
                        Ok((Address::Id(id), Some(token)))
                    }
                }
            })
            .await;
        observe("create_owned", created)
    }

    /// Store content privately, addressed by digest, owned by a new token.
    ///
    /// Public content with the same digest does not count as a duplicate.
    pub async fn create_private(
        &self,
        content: impl Into<Bytes>,
    ) -> Result<(Digest, OwnershipToken)> {
        let content = non_empty(content.into())?;
        let space = self.space;
        let owners = self.owners;

        let created = self
            .store
            .transact(move |tx| -> Result<_> {
                let record = Record::private(space.namespace(), content);
                let address = record.address();
                if space.dedup.private_key(tx, &record.digest)?.is_some() {
                    tracing::debug!(digest = ?record.digest, "private record exists");
                    return Err(PasteError::Conflict(address));
                }

                let key = tx.insert_record(&record)?;
                space.stats.record_insert(tx, &record)?;
                let token = owners.issue(tx, key, address)?;
                tracing::debug!(
                    digest = ?record.digest,
                    bytes = record.len(),
                    "inserted private record"
                );
                Ok((record.digest, token))
            })
            .await;
        observe("create_private", created)
    }

    /// Replace the content of the record `token` owns.
    ///
    /// The record keeps its token. A public record keeps its compact ID; a
    /// private record moves to the new digest.
    pub async fn claim_update(
        &self,
        token: &OwnershipToken,
        content: impl Into<Bytes>,
    ) -> Result<Address> {
        let content = non_empty(content.into())?;
        let digest = Digest::of(&content);
        let token = *token;
        let space = self.space;
        let owners = self.owners;

        let updated = self
            .store
            .transact(move |tx| -> Result<_> {
                let key = owners.resolve(tx, &token)?.ok_or(PasteError::NotFound)?;
                let old = tx.record(key)?.ok_or(PasteError::NotFound)?;

                if let Some(existing) = space.dedup.find_address(tx, &digest)? {
                    tracing::debug!(%existing, "update conflicts with stored content");
                    return Err(PasteError::Conflict(existing));
                }

                tx.replace_record(key, &digest, &content)?;
                space
                    .stats
                    .record_replace(tx, old.len(), content.len() as u64)?;

                let address = match old.compact_id {
                    Some(id) => Address::Id(id),
                    None => Address::Digest(digest),
                };
                tracing::debug!(%address, "updated record");
                Ok(address)
            })
            .await;
        observe("claim_update", updated)
    }

    /// Delete the record `token` owns and retire the token.
    pub async fn claim_delete(&self, token: &OwnershipToken) -> Result<Address> {
        let token = *token;
        let space = self.space;
        let owners = self.owners;

        let deleted = self
            .store
            .transact(move |tx| -> Result<_> {
                let key = owners.resolve(tx, &token)?.ok_or(PasteError::NotFound)?;
                let record = tx.delete_record(key)?.ok_or(PasteError::NotFound)?;
                owners.revoke(tx, &token)?;
                space.stats.record_delete(tx, &record)?;
                tracing::debug!(address = %record.address(), "deleted record");
                Ok(record.address())
            })
            .await;
        observe("claim_delete", deleted)
    }
}

/// Refuse empty submissions before any storage access.
pub(crate) fn non_empty(content: Bytes) -> Result<Bytes> {
    if content.is_empty() {
        return Err(PasteError::BadInput("empty content".into()));
    }
    Ok(content)
}

/// Log engine failures on their way out.
pub(crate) fn observe<T>(op: &'static str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.is_storage_failure() {
            tracing::warn!(op, error = %e, "storage failure");
        }
    }
    result
}
