//! PDF decoding module.

mod extractor;

pub use extractor::PdfTextDecoder;

/// Turns an opaque binary attachment payload into plain text.
///
/// Total over the outcome space {text, no-text}: any decode failure,
/// corruption, or unsupported encoding converts to `None`, so callers
/// never need to distinguish "corrupt file" from "no text layer".
pub trait DocumentDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Option<String>;
}
