//! Golden test vectors for deterministic verification.
//!
//! Digests and compact ID encodings are part of the public address format,
//! so they must never change between releases or platforms.

use pb_core::{CompactId, Digest};
use serde::{Deserialize, Serialize};

/// Content and the digest it must hash to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestVector {
    pub name: String,
    pub content: String,
    /// Expected 64-character hex digest. Empty means not yet pinned.
    pub expected_hex: String,
}

/// A sequence value and its fixed-width encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactVector {
    pub value: u64,
    pub width: usize,
    pub encoded: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenVectors {
    pub digests: Vec<DigestVector>,
    pub compact: Vec<CompactVector>,
}

impl GoldenVectors {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

fn digest(name: &str, content: &str, expected_hex: &str) -> DigestVector {
    DigestVector {
        name: name.to_string(),
        content: content.to_string(),
        expected_hex: expected_hex.to_string(),
    }
}

fn compact(value: u64, width: usize, encoded: &str) -> CompactVector {
    CompactVector {
        value,
        width,
        encoded: encoded.to_string(),
    }
}

/// Get all golden test vectors.
pub fn all_vectors() -> GoldenVectors {
    GoldenVectors {
        digests: vec![
            digest(
                "empty input",
                "",
                "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262",
            ),
            digest(
                "abc",
                "abc",
                "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85",
            ),
            digest(
                "single line",
                "hello\n",
                "8e4c7c1b99dbfd50e7a95185fead5ee1448fa904a2fdd778eaf5f2dbfd629a99",
            ),
            digest(
                "url",
                "https://example.com/",
                "19f876713c227a568d939946496a0d306e0ce868cecd91293082e1d40691e0b0",
            ),
        ],
        compact: vec![
            compact(0, 4, "AAAA"),
            compact(1, 4, "AAAB"),
            compact(26, 1, "a"),
            compact(52, 1, "0"),
            compact(65, 1, "~"),
            compact(66, 2, "BA"),
            compact(67, 3, "ABB"),
            compact(4_355, 2, "~~"),
            compact(287_495, 3, "~~~"),
            compact(18_974_735, 4, "~~~~"),
        ],
    }
}

/// Check every vector against the current implementation.
///
/// Returns `(name, matches, actual)` per vector. Unpinned digests always
/// match and report what was computed.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let vectors = all_vectors();
    let digests = vectors.digests.iter().map(|v| {
        let hex = Digest::of(v.content.as_bytes()).to_hex();
        let matches = v.expected_hex.is_empty() || hex == v.expected_hex;
        (v.name.clone(), matches, hex)
    });
    let compact = vectors.compact.iter().map(|v| {
        let name = format!("compact {} at width {}", v.value, v.width);
        match CompactId(v.value).encode(v.width) {
            Ok(encoded) => {
                let matches = encoded == v.encoded
                    && CompactId::decode(&encoded, v.width).ok() == Some(CompactId(v.value));
                (name, matches, encoded)
            }
            Err(e) => (name, false, e.to_string()),
        }
    });
    digests.chain(compact).collect()
}
