//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::DocumentDecoder;

/// Text-layer decoder for PDF attachments.
///
/// Decoding is best-effort by contract: encrypted files, corrupt
/// payloads, and scanned documents without a text layer all come back as
/// `None`. Decoded text shorter than `min_text_length` also counts as a
/// failure, guarding against near-empty text layers.
pub struct PdfTextDecoder {
    min_text_length: usize,
}

impl PdfTextDecoder {
    pub fn new(min_text_length: usize) -> Self {
        Self { min_text_length }
    }

    fn try_decode(&self, bytes: &[u8]) -> Option<String> {
        let mut doc = Document::load_mem(bytes).ok()?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                debug!("PDF is encrypted, no text extracted");
                return None;
            }
            // pdf-extract needs the decrypted byte stream
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted).ok()?;
            return extract_text(&decrypted);
        }

        if doc.get_pages().is_empty() {
            debug!("PDF has no pages");
            return None;
        }

        extract_text(bytes)
    }
}

impl DocumentDecoder for PdfTextDecoder {
    fn decode(&self, bytes: &[u8]) -> Option<String> {
        let text = self.try_decode(bytes)?;
        if text.trim().len() < self.min_text_length {
            debug!(
                length = text.trim().len(),
                threshold = self.min_text_length,
                "decoded text below minimum length"
            );
            return None;
        }
        Some(text)
    }
}

/// pdf-extract panics on some malformed font tables; contain that so the
/// decoder stays total.
fn extract_text(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.to_vec();
    std::panic::catch_unwind(move || pdf_extract::extract_text_from_mem(&bytes).ok())
        .ok()
        .flatten()
}
