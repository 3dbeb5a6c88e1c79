//! Compact ID allocation from the engine's per-namespace sequence.

use pb_core::{CompactId, Namespace};
use pb_store::StoreTx;

use crate::error::{PasteError, Result};

/// Hands out compact IDs for one namespace at a fixed display width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    namespace: Namespace,
    width: usize,
}

impl IdAllocator {
    /// Create an allocator for `namespace` rendering at `width` characters.
    pub fn new(namespace: Namespace, width: usize) -> Self {
        Self { namespace, width }
    }

    /// Get the namespace this allocator draws from.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Get the display width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Draw the next ID.
    ///
    /// The sequence is incremented inside the caller's transaction, so a
    /// rolled back request does not consume a value. A value that cannot be
    /// rendered at `width` is refused.
    pub fn next(&self, tx: &mut dyn StoreTx) -> Result<CompactId> {
        let id = CompactId::new(tx.next_sequence(self.namespace)?);
        if !id.fits(self.width) {
            return Err(PasteError::AddressSpaceExhausted {
                namespace: self.namespace,
                width: self.width,
            });
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_store::{MemoryStore, Store};

    #[tokio::test]
    async fn test_ids_start_at_one_and_increase() {
        let store = MemoryStore::new();
        let alloc = IdAllocator::new(Namespace::Paste, 4);

        let ids = store
            .transact(move |tx| -> Result<_> { Ok((alloc.next(tx)?, alloc.next(tx)?)) })
            .await
            .unwrap();
        assert_eq!(ids, (CompactId(1), CompactId(2)));
    }

    #[tokio::test]
    async fn test_namespaces_are_independent() {
        let store = MemoryStore::new();
        let pastes = IdAllocator::new(Namespace::Paste, 4);
        let urls = IdAllocator::new(Namespace::Url, 3);

        let ids = store
            .transact(move |tx| -> Result<_> {
                pastes.next(tx)?;
                Ok((pastes.next(tx)?, urls.next(tx)?))
            })
            .await
            .unwrap();
        assert_eq!(ids, (CompactId(2), CompactId(1)));
    }

    #[tokio::test]
    async fn test_exhaustion_at_width_one() {
        let store = MemoryStore::new();
        let alloc = IdAllocator::new(Namespace::Url, 1);

        // Width 1 holds 0..=65; the sequence starts at 1.
        let last = store
            .transact(move |tx| -> Result<_> {
                let mut last = CompactId(0);
                for _ in 0..65 {
                    last = alloc.next(tx)?;
                }
                Ok(last)
            })
            .await
            .unwrap();
        assert_eq!(last, CompactId(65));

        let err = store
            .transact(move |tx| alloc.next(tx))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PasteError::AddressSpaceExhausted { namespace: Namespace::Url, width: 1 }
        ));
    }
}
