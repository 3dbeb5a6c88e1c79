//! # pb Core
//!
//! Pure primitives for pb: content digests, compact IDs, addresses and
//! ownership tokens.
//!
//! This crate contains no I/O and no storage. Everything here is a value
//! type or a pure function over bytes.
//!
//! ## Key Types
//!
//! - [`Digest`] - BLAKE3 content hash, the dedup key of every record
//! - [`CompactId`] - Sequential ID of public records, rendered in base 66
//! - [`Address`] - Tagged union of the two addressing schemes
//! - [`OwnershipToken`] - One-time-issued capability to update/delete a record
//! - [`Record`] / [`Stats`] - What the storage engine persists

pub mod compact;
pub mod error;
pub mod hash;
pub mod token;
pub mod types;

pub use compact::{capacity, CompactId, ALPHABET};
pub use error::{CoreError, Result};
pub use hash::{Digest, DIGEST_LEN};
pub use token::{OwnershipToken, TokenFingerprint, TOKEN_LEN};
pub use types::{Address, Namespace, Record, RecordKey, Stats};
