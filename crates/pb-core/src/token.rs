//! Ownership tokens: bearer capabilities for mutating one record.
//!
//! A token is 128 random bits shown to the client exactly once, in UUID
//! text form. The storage engine never sees the token itself, only its
//! [`TokenFingerprint`], so looking a token up is an indexed equality match
//! on a hash rather than a byte comparison against the secret.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Length of a token in bytes.
pub const TOKEN_LEN: usize = 16;

const FINGERPRINT_DOMAIN: &[u8] = b"pb-token-v0:";

/// A one-time-issued ownership token.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnershipToken([u8; TOKEN_LEN]);

impl OwnershipToken {
    /// Generate a fresh token from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; TOKEN_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; TOKEN_LEN] {
        &self.0
    }

    /// Parse the UUID text form (hyphenated, simple, or braced).
    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(|uuid| Self(uuid.into_bytes()))
            .map_err(|e| CoreError::InvalidToken(e.to_string()))
    }

    /// The lookup key under which the storage engine records this token.
    pub fn fingerprint(&self) -> TokenFingerprint {
        let mut hasher = blake3::Hasher::new();
        hasher.update(FINGERPRINT_DOMAIN);
        hasher.update(&self.0);
        TokenFingerprint(*hasher.finalize().as_bytes())
    }
}

impl fmt::Debug for OwnershipToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OwnershipToken(<redacted>)")
    }
}

/// Renders the hyphenated UUID form handed to the client.
impl fmt::Display for OwnershipToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_bytes(self.0).hyphenated())
    }
}

/// BLAKE3 of a token, the only form of a token the storage engine holds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenFingerprint(pub [u8; 32]);

impl TokenFingerprint {
    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for TokenFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenFingerprint({})", &hex::encode(self.0)[..16])
    }
}

impl TryFrom<&[u8]> for TokenFingerprint {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> std::result::Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}
