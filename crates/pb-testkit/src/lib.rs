//! # pb Testkit
//!
//! Testing utilities for pb.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known digests and compact ID encodings
//! - **Generators**: Proptest strategies for contents, URLs and operation sequences
//! - **Fixtures**: A ready-made `Pastebin` over an in-memory store
//! - **Failure injection**: [`FaultyStore`] fails one chosen storage primitive
//!
//! ## Golden Vectors
//!
//! ```rust
//! use pb_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, got) in verify_all_vectors() {
//!     println!("{}: {} ({})", name, ok, got);
//! }
//! ```
//!
//! ## Failure Injection
//!
//! ```rust
//! use pb_testkit::{StoreOp, TestFixture};
//!
//! let fixture = TestFixture::faulty();
//! fixture.store().arm(StoreOp::BindToken);
//! // The next create_private fails after inserting, and leaves nothing behind.
//! ```

pub mod faulty;
pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use faulty::{FaultyStore, StoreOp};
pub use fixtures::{init_tracing, TestFixture};
pub use generators::{content, paste_ops, url, PasteOp};
pub use vectors::{all_vectors, verify_all_vectors, CompactVector, DigestVector, GoldenVectors};
