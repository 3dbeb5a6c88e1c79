//! # pb
//!
//! A content-addressed pastebin and URL shortener core.
//!
//! ## Overview
//!
//! - **Dedup**: identical content is stored once per namespace and always
//!   gets the same address back
//! - **Compact IDs**: public records get short fixed-width base-66 IDs from
//!   a persistent sequence that is never reused
//! - **Private records**: addressed only by their BLAKE3 digest
//! - **Ownership tokens**: a random token issued at creation is the only
//!   credential for updating or deleting a record
//!
//! ## Key Concepts
//!
//! - **Address**: either a compact ID (public) or a digest (private)
//! - **Namespace**: pastes and short URLs keep separate sequences, dedup
//!   domains and stats
//! - **Transaction**: every operation is one storage transaction; a failure
//!   leaves no trace
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pb::{Pastebin, PbConfig};
//!
//! async fn example() -> pb::Result<()> {
//!     let bin = Pastebin::open(&PbConfig::default())?;
//!
//!     let address = bin.pastes().create(&b"hello\n"[..]).await?;
//!     println!("stored at {}", bin.pastes().render(&address)?);
//!
//!     let (digest, token) = bin.pastes().create_private(&b"secret\n"[..]).await?;
//!     println!("private at {}, token {}", digest, token);
//!
//!     bin.pastes().claim_delete(&token).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `pb::core` - Digests, compact IDs, tokens and record types
//! - `pb::store` - Storage abstraction, SQLite and in-memory engines

pub mod allocator;
pub mod config;
pub mod dedup;
pub mod error;
pub mod ownership;
pub mod paste;
pub mod pastebin;
pub mod shortener;
pub mod space;
pub mod stats;

// Re-export component crates
pub use pb_core as core;
pub use pb_store as store;

// Re-export main types for convenience
pub use config::PbConfig;
pub use dedup::DedupHit;
pub use error::{PasteError, Result};
pub use paste::PasteStore;
pub use pastebin::Pastebin;
pub use shortener::UrlShortener;

// Re-export commonly used core types
pub use pb_core::{Address, CompactId, Digest, Namespace, OwnershipToken, Stats};
