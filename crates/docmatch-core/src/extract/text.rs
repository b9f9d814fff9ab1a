//! Whitespace normalization.

use super::patterns::REDUNDANT_WHITESPACE;

/// Collapse runs of two-or-more non-newline whitespace characters into a
/// single space, preserving line breaks.
///
/// Pure and idempotent: `normalize_whitespace(normalize_whitespace(x)) ==
/// normalize_whitespace(x)`.
pub fn normalize_whitespace(text: &str) -> String {
    REDUNDANT_WHITESPACE.replace_all(text, " ").into_owned()
}

/// Newline-flattened, whitespace-normalized copy of `text`, used for
/// institute matching where patterns may span line breaks.
pub fn flatten_lines(text: &str) -> String {
    normalize_whitespace(&text.replace(['\n', '\r'], " "))
}
