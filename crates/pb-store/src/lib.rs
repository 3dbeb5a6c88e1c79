//! # pb Store
//!
//! Storage abstraction for pb. Provides a trait-based interface to the
//! storage engine with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The core never talks to a database directly. It asks the engine to run a
//! closure inside one transaction ([`Store::transact`]) and uses only the
//! primitives of [`StoreTx`]: a per-namespace sequence, the records table
//! with its digest index, the token table and the stats rows.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for running transactions
//! - [`StoreTx`] - The primitive set available inside a transaction
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pb_core::Namespace;
//! use pb_store::{SqliteStore, Store, StoreError};
//!
//! async fn example() -> Result<(), StoreError> {
//!     let store = SqliteStore::open("pb.db")?;
//!
//!     let next = store
//!         .transact(|tx| tx.next_sequence(Namespace::Paste))
//!         .await?;
//!     println!("next paste id: {}", next);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **All or nothing**: an `Err` from the closure rolls back every primitive
//! - **No recycling**: sequences and record keys only grow
//! - **Token tombstones**: revoked token fingerprints stay reserved forever

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
mod properties;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, DEFAULT_BUSY_TIMEOUT};
pub use traits::{BindResult, Store, StoreExt, StoreTx};

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
