//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use pb::{PasteStore, Pastebin, PbConfig, UrlShortener};
use pb_store::{MemoryStore, Store};
use tracing_subscriber::filter::LevelFilter;

use crate::faulty::FaultyStore;

/// A pastebin over a fresh store.
pub struct TestFixture<S: Store = MemoryStore> {
    pub config: PbConfig,
    pub bin: Pastebin<S>,
}

impl TestFixture<MemoryStore> {
    /// A pastebin over an empty in-memory store with default widths.
    pub fn new() -> Self {
        Self::with_config(PbConfig::default())
    }

    pub fn with_config(config: PbConfig) -> Self {
        Self::over(MemoryStore::new(), config)
    }
}

impl TestFixture<FaultyStore<MemoryStore>> {
    /// A pastebin whose store can be told to fail.
    pub fn faulty() -> Self {
        Self::over(FaultyStore::new(MemoryStore::new()), PbConfig::default())
    }
}

impl<S: Store> TestFixture<S> {
    pub fn over(store: S, config: PbConfig) -> Self {
        init_tracing();
        Self {
            bin: Pastebin::new(store, &config),
            config,
        }
    }

    pub fn pastes(&self) -> &PasteStore<S> {
        self.bin.pastes()
    }

    pub fn urls(&self) -> &UrlShortener<S> {
        self.bin.urls()
    }

    pub fn store(&self) -> &S {
        self.bin.store()
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(LevelFilter::DEBUG)
        .try_init();
}

/// `count` distinct, non-empty paste bodies.
pub fn sample_contents(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("paste number {}\n", i).into_bytes())
        .collect()
}
