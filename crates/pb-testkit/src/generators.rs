//! Proptest generators for property-based testing.

use proptest::prelude::*;

/// Non-empty content up to `max_len` bytes.
pub fn content(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1))
}

/// Printable text content, one or more lines.
pub fn text_content() -> impl Strategy<Value = String> {
    "[ -~]{1,64}(\n[ -~]{0,64}){0,4}".prop_map(String::from)
}

/// A plausible URL with no line breaks.
pub fn url() -> impl Strategy<Value = String> {
    "https://[a-z]{1,12}\\.example/[a-z0-9/_-]{0,24}".prop_map(String::from)
}

/// One step in a sequence of paste operations.
#[derive(Debug, Clone)]
pub enum PasteOp {
    /// Public create without a token.
    Create(Vec<u8>),
    /// Public create that keeps the token, if any.
    CreateOwned(Vec<u8>),
    /// Private create.
    CreatePrivate(Vec<u8>),
    /// Delete through the n-th token held so far (modulo the count).
    Delete(usize),
}

pub fn paste_op() -> impl Strategy<Value = PasteOp> {
    prop_oneof![
        3 => content(32).prop_map(PasteOp::Create),
        3 => content(32).prop_map(PasteOp::CreateOwned),
        1 => content(32).prop_map(PasteOp::CreatePrivate),
        2 => any::<usize>().prop_map(PasteOp::Delete),
    ]
}

/// A sequence of up to `max_len` operations.
pub fn paste_ops(max_len: usize) -> impl Strategy<Value = Vec<PasteOp>> {
    prop::collection::vec(paste_op(), 1..=max_len.max(1))
}
