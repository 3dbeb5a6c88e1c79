//! Record, address and namespace types.
//!
//! All identifiers are newtypes or tagged enums so that a compact ID can
//! never be mistaken for a digest at compile time.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::compact::CompactId;
use crate::error::Result;
use crate::hash::Digest;

/// An independent address space with its own sequence, dedup domain and
/// stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Pastes: public, owned, and private records.
    Paste,
    /// Short URLs: public records only.
    Url,
}

impl Namespace {
    /// Stable storage discriminant.
    pub fn to_u8(self) -> u8 {
        match self {
            Namespace::Paste => 0,
            Namespace::Url => 1,
        }
    }

    /// Inverse of [`Namespace::to_u8`].
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Namespace::Paste),
            1 => Some(Namespace::Url),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Paste => "paste",
            Namespace::Url => "url",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical address of a record.
///
/// Public records are addressed by compact ID, private records by digest.
/// A public record's content is also reachable by digest, but its
/// canonical address is always the compact ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Address {
    Id(CompactId),
    Digest(Digest),
}

impl Address {
    /// Textual form: compact IDs at `width`, digests as full hex.
    pub fn render(&self, width: usize) -> Result<String> {
        match self {
            Address::Id(id) => id.encode(width),
            Address::Digest(digest) => Ok(digest.to_hex()),
        }
    }

    pub fn compact_id(&self) -> Option<CompactId> {
        match self {
            Address::Id(id) => Some(*id),
            Address::Digest(_) => None,
        }
    }

    pub fn digest(&self) -> Option<Digest> {
        match self {
            Address::Id(_) => None,
            Address::Digest(digest) => Some(*digest),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Id(id) => write!(f, "{}", id),
            Address::Digest(digest) => write!(f, "{}", digest),
        }
    }
}

impl From<CompactId> for Address {
    fn from(id: CompactId) -> Self {
        Address::Id(id)
    }
}

impl From<Digest> for Address {
    fn from(digest: Digest) -> Self {
        Address::Digest(digest)
    }
}

/// Storage-internal handle of a record.
///
/// Stable for the lifetime of the record, including across content
/// replacement. Never exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey(pub u64);

/// A stored unit of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub namespace: Namespace,
    /// Present for public records only.
    pub compact_id: Option<CompactId>,
    pub digest: Digest,
    pub content: Bytes,
}

impl Record {
    /// A public record under a freshly allocated compact ID.
    pub fn public(namespace: Namespace, id: CompactId, content: Bytes) -> Self {
        Self {
            namespace,
            compact_id: Some(id),
            digest: Digest::of(&content),
            content,
        }
    }

    /// A private record, addressed by its digest.
    pub fn private(namespace: Namespace, content: Bytes) -> Self {
        Self {
            namespace,
            compact_id: None,
            digest: Digest::of(&content),
            content,
        }
    }

    pub fn is_private(&self) -> bool {
        self.compact_id.is_none()
    }

    /// The canonical address: compact ID if public, digest if private.
    pub fn address(&self) -> Address {
        match self.compact_id {
            Some(id) => Address::Id(id),
            None => Address::Digest(self.digest),
        }
    }

    /// Content length in bytes, as counted by stats.
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Running totals for one namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub record_count: u64,
    pub total_bytes: u64,
}
