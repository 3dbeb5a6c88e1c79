//! Compact IDs: the short, sequential address of public records.
//!
//! A compact ID is a dense integer rendered as a fixed-width positional
//! number over the 66 URL-unreserved characters. The width belongs to the
//! caller (pastes and short URLs use different widths); this module only
//! guarantees the encoding is a bijection for values below `66^width`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// The base-66 alphabet, in digit order. `A` is zero.
pub const ALPHABET: &[u8; 66] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_.~";

/// Radix of the encoding.
pub const RADIX: u64 = ALPHABET.len() as u64;

/// Number of distinct values representable in `width` characters.
///
/// Saturates at `u64::MAX` for widths whose range exceeds `u64`.
pub fn capacity(width: usize) -> u64 {
    u32::try_from(width)
        .ok()
        .and_then(|w| RADIX.checked_pow(w))
        .unwrap_or(u64::MAX)
}

/// A sequentially assigned record identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompactId(pub u64);

impl CompactId {
    /// Create from a raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Whether this ID can be rendered in `width` characters.
    pub fn fits(&self, width: usize) -> bool {
        self.0 < capacity(width)
    }

    /// Render as exactly `width` characters, left-padded with `A`.
    pub fn encode(&self, width: usize) -> Result<String> {
        let mut digits = vec![ALPHABET[0]; width];
        let mut rest = self.0;
        for slot in digits.iter_mut().rev() {
            *slot = ALPHABET[(rest % RADIX) as usize];
            rest /= RADIX;
        }
        if rest != 0 {
            return Err(CoreError::CompactIdOverflow {
                value: self.0,
                width,
            });
        }
        // Every byte comes from ALPHABET, which is ASCII.
        Ok(digits.into_iter().map(char::from).collect())
    }

    /// Parse a `width`-character rendering.
    pub fn decode(s: &str, width: usize) -> Result<Self> {
        if s.len() != width {
            return Err(CoreError::InvalidCompactId(s.to_string()));
        }
        let mut value: u64 = 0;
        for byte in s.bytes() {
            let digit =
                digit_value(byte).ok_or_else(|| CoreError::InvalidCompactId(s.to_string()))?;
            value = value
                .checked_mul(RADIX)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| CoreError::InvalidCompactId(s.to_string()))?;
        }
        Ok(Self(value))
    }
}

fn digit_value(byte: u8) -> Option<u64> {
    match byte {
        b'A'..=b'Z' => Some(u64::from(byte - b'A')),
        b'a'..=b'z' => Some(u64::from(byte - b'a') + 26),
        b'0'..=b'9' => Some(u64::from(byte - b'0') + 52),
        b'-' => Some(62),
        b'_' => Some(63),
        b'.' => Some(64),
        b'~' => Some(65),
        _ => None,
    }
}

impl fmt::Debug for CompactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactId({})", self.0)
    }
}

impl fmt::Display for CompactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for CompactId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
