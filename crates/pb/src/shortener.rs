//! Short URLs: a separate namespace of public records.

use std::sync::Arc;

use bytes::Bytes;
use pb_core::{CompactId, Namespace, Stats};
use pb_store::{Store, StoreError, StoreExt};

use crate::error::{PasteError, Result};
use crate::paste::observe;
use crate::space::AddressSpace;

/// Short URL operations over a storage engine.
pub struct UrlShortener<S: Store> {
    store: Arc<S>,
    space: AddressSpace,
}

impl<S: Store> Clone for UrlShortener<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            space: self.space,
        }
    }
}

impl<S: Store> UrlShortener<S> {
    /// Create a shortener rendering compact IDs at `id_width`.
    pub fn new(store: Arc<S>, id_width: usize) -> Self {
        Self {
            store,
            space: AddressSpace::new(Namespace::Url, id_width),
        }
    }

    /// Get the display width of short URL IDs.
    pub fn id_width(&self) -> usize {
        self.space.width()
    }

    /// Shorten the first line of a submission.
    ///
    /// The line is kept as submitted apart from its line ending. The same
    /// target always maps to the same ID.
    pub async fn shorten(&self, submission: impl AsRef<[u8]>) -> Result<CompactId> {
        let target = first_line(submission.as_ref())?;
        let space = self.space;

        let id = self
            .store
            .transact(move |tx| space.insert_public(tx, Bytes::from(target)))
            .await
            .map(|insert| insert.id());
        observe("shorten", id)
    }

    /// The target URL behind an ID.
    pub async fn resolve(&self, id: CompactId) -> Result<Option<String>> {
        let space = self.space;
        let content = self
            .store
            .transact(move |tx| -> Result<_> {
                Ok(tx
                    .record_by_id(space.namespace(), id)?
                    .map(|(_, record)| record.content))
            })
            .await;

        match observe("resolve", content)? {
            Some(content) => String::from_utf8(content.to_vec()).map(Some).map_err(|e| {
                PasteError::from(StoreError::InvalidData(format!(
                    "stored URL is not UTF-8: {}",
                    e
                )))
            }),
            None => Ok(None),
        }
    }

    /// Record count and byte totals of the URL namespace.
    pub async fn stats(&self) -> Result<Stats> {
        let stats = self.store.snapshot_stats(self.space.namespace()).await;
        observe("url stats", stats.map_err(PasteError::from))
    }
}

fn first_line(submission: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(submission)
        .map_err(|e| PasteError::BadInput(format!("not UTF-8: {}", e)))?;
    let line = text.lines().next().unwrap_or("");
    if line.is_empty() {
        return Err(PasteError::BadInput("empty URL".into()));
    }
    Ok(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_store::MemoryStore;

    #[test]
    fn test_first_line() {
        assert_eq!(
            first_line(b"https://example.com/\r\nignored").unwrap(),
            "https://example.com/"
        );
        assert!(matches!(first_line(b""), Err(PasteError::BadInput(_))));
        assert!(matches!(first_line(b"\nsecond"), Err(PasteError::BadInput(_))));
        assert_eq!(first_line(b" spaced \nrest").unwrap(), " spaced ");
        assert!(matches!(first_line(&[0xff, 0xfe]), Err(PasteError::BadInput(_))));
    }

    #[tokio::test]
    async fn test_shorten_dedups_on_target() {
        let urls = UrlShortener::new(Arc::new(MemoryStore::new()), 3);

        let a = urls.shorten("https://example.com/a\nfoo").await.unwrap();
        let b = urls.shorten("https://example.com/a\nbar").await.unwrap();
        let c = urls.shorten("https://example.com/b").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a, CompactId(1));
        assert_eq!(c, CompactId(2));
        assert_eq!(
            urls.resolve(a).await.unwrap().as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(urls.resolve(CompactId(99)).await.unwrap(), None);
        assert_eq!(urls.stats().await.unwrap().record_count, 2);
    }
}
