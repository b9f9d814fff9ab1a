//! Inbound message and attachment types.
//!
//! Both are immutable inputs to the pipeline. The transport collaborator
//! has already downloaded attachment content; the pipeline only consumes
//! `(id, name, bytes)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A binary file attached to a message, candidate for text extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment identifier, unique within the mailbox.
    pub id: String,

    /// Display filename, including extension.
    pub name: String,

    /// Raw binary content. Not serialized; outcome records carry only the
    /// attachment identity.
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content,
        }
    }

    /// Whether the filename carries a `.pdf` extension, case-insensitive.
    pub fn is_pdf(&self) -> bool {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }
}

/// A mailbox message with its ordered attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier assigned by the mailbox.
    pub id: String,

    /// Identifier of the folder the message was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,

    /// Sender address.
    pub sender: String,

    /// Subject line.
    pub subject: String,

    /// When the message arrived.
    pub received_at: DateTime<Utc>,

    /// Read state at the time of processing.
    #[serde(default)]
    pub is_read: bool,

    /// Follow-up flag state at the time of processing.
    #[serde(default)]
    pub flagged: bool,

    /// Attachments in arrival order.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_by_suffix() {
        let pdf = Attachment::new("a1", "scan.pdf", Vec::new());
        assert!(pdf.is_pdf());

        let upper = Attachment::new("a2", "SCAN.PDF", Vec::new());
        assert!(upper.is_pdf());

        let docx = Attachment::new("a3", "letter.docx", Vec::new());
        assert!(!docx.is_pdf());

        let no_ext = Attachment::new("a4", "pdf", Vec::new());
        assert!(!no_ext.is_pdf());
    }
}
