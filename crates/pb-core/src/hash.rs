//! Content hashing.
//!
//! Every stored record is keyed by the BLAKE3 digest of its raw bytes. The
//! full 32-byte output is kept; digests are never truncated, so the digest
//! address space is exactly the hash output space.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Length of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A 32-byte BLAKE3 digest of record content.
///
/// Used as the dedup key for every record and as the address of private
/// records.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    /// Compute the digest of the given content.
    pub fn of(content: &[u8]) -> Self {
        Self(*blake3::hash(content).as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Canonical textual form: 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the canonical textual form.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidDigest(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; DIGEST_LEN] = slice.try_into().map_err(|_| {
            CoreError::InvalidDigest(format!(
                "expected {} bytes, got {}",
                DIGEST_LEN,
                slice.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_digest_known_value() {
        // BLAKE3 of the empty input.
        assert_eq!(
            Digest::of(b"").to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_digest_differs_for_different_content() {
        assert_ne!(Digest::of(b"hello"), Digest::of(b"hello\n"));
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(matches!(
            Digest::from_hex("abcd"),
            Err(CoreError::InvalidDigest(_))
        ));
        assert!(matches!(
            Digest::from_hex("zz"),
            Err(CoreError::InvalidDigest(_))
        ));
    }

    #[test]
    fn test_display_is_full_hex() {
        let d = Digest::of(b"hello");
        assert_eq!(d.to_string().len(), 64);
        assert_eq!(Digest::from_hex(&d.to_string()).unwrap(), d);
    }

    proptest! {
        #[test]
        fn digest_is_deterministic(content in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(Digest::of(&content), Digest::of(&content.clone()));
        }
    }
}
