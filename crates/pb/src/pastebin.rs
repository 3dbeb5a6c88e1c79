//! The Pastebin: pastes and short URLs sharing one storage engine.

use std::sync::Arc;

use pb_store::{SqliteStore, Store};

use crate::config::PbConfig;
use crate::error::Result;
use crate::paste::PasteStore;
use crate::shortener::UrlShortener;

/// Both namespaces over one store.
///
/// The pastes and URLs share the engine but have separate sequences, dedup
/// domains and stats.
pub struct Pastebin<S: Store> {
    store: Arc<S>,
    pastes: PasteStore<S>,
    urls: UrlShortener<S>,
}

impl<S: Store> Pastebin<S> {
    /// Wrap an already opened store.
    pub fn new(store: S, config: &PbConfig) -> Self {
        let store = Arc::new(store);
        Self {
            pastes: PasteStore::new(Arc::clone(&store), config.paste_id_width),
            urls: UrlShortener::new(Arc::clone(&store), config.url_id_width),
            store,
        }
    }

    /// Get the paste namespace.
    pub fn pastes(&self) -> &PasteStore<S> {
        &self.pastes
    }

    /// Get the short URL namespace.
    pub fn urls(&self) -> &UrlShortener<S> {
        &self.urls
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl Pastebin<SqliteStore> {
    /// Open (and migrate) the SQLite database named by `config`.
    pub fn open(config: &PbConfig) -> Result<Self> {
        let store = SqliteStore::open_with_timeout(&config.database_path, config.busy_timeout())?;
        tracing::info!(
            path = %config.database_path.display(),
            paste_id_width = config.paste_id_width,
            url_id_width = config.url_id_width,
            "pastebin opened"
        );
        Ok(Self::new(store, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_core::{Address, CompactId};
    use pb_store::MemoryStore;

    #[tokio::test]
    async fn test_namespaces_do_not_share_sequences() {
        let bin = Pastebin::new(MemoryStore::new(), &PbConfig::default());

        let paste = bin.pastes().create(&b"https://example.com"[..]).await.unwrap();
        let url = bin.urls().shorten("https://example.com").await.unwrap();

        assert_eq!(paste, Address::Id(CompactId(1)));
        assert_eq!(url, CompactId(1));
        assert_eq!(bin.pastes().stats().await.unwrap().record_count, 1);
        assert_eq!(bin.urls().stats().await.unwrap().record_count, 1);
    }

    #[tokio::test]
    async fn test_open_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PbConfig::with_database_path(dir.path().join("pb.db"));

        let bin = Pastebin::open(&config).unwrap();
        let address = bin.pastes().create(&b"on disk"[..]).await.unwrap();
        assert_eq!(bin.pastes().render(&address).unwrap(), "AAAB");
    }
}
