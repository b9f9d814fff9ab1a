//! Structured pipeline outcome records.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::message::{Attachment, Message};
use super::population::PopulationRecord;

/// The pipeline step at which processing for an attachment stopped,
/// whether by success or by an unmet precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStage {
    /// The message carried no attachments at all.
    NoAttachments,
    /// The attachment is not a PDF.
    NotPdf,
    /// Decoding produced no usable text.
    NotParsed,
    /// The text contained no date-like substrings.
    NoDates,
    /// Date substrings were found but none formed a valid calendar date.
    NoValidDate,
    /// No population record shares the inferred birth date.
    NoCandidates,
    /// Candidates existed but no surname matched the text.
    NoNameMatch,
    /// At least one candidate surname matched; the outcome fans out one
    /// record per matched candidate.
    Matched,
}

impl TerminalStage {
    /// Whether this stage completes the full gate sequence.
    pub fn is_matched(self) -> bool {
        self == TerminalStage::Matched
    }
}

/// One structured result of running the pipeline on one attachment, or on
/// one matched identity within that attachment's fan-out.
///
/// Fields are populated progressively as the attachment passes each gate;
/// a terminal failure leaves the later fields at their defaults. Every
/// attachment produces at least one record, so the output sequence can be
/// used for downstream accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Identifier of the message this outcome belongs to.
    pub message_id: String,

    /// Folder the message was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,

    /// Sender address of the message.
    pub sender: String,

    /// Subject line of the message.
    pub subject: String,

    /// When the message arrived.
    pub received_at: DateTime<Utc>,

    /// Whether the message carried any attachments.
    pub has_attachments: bool,

    /// Attachment identifier, absent for attachment-less messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,

    /// Attachment display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_name: Option<String>,

    /// Whether the attachment filename has a `.pdf` suffix.
    pub is_pdf: bool,

    /// Whether decoding succeeded and yielded non-trivial text.
    pub is_parsed: bool,

    /// Institute patterns that matched anywhere in the text.
    pub institutes: BTreeSet<String>,

    /// Raw currency-amount substrings, euro sign included, never parsed
    /// to a numeric value.
    pub amounts: BTreeSet<String>,

    /// Number of date-like substrings found after month substitution.
    pub date_candidates_found: usize,

    /// Earliest valid extracted date, taken as the probable birth date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_date: Option<NaiveDate>,

    /// Whether the population query returned at least one row.
    pub has_candidates: bool,

    /// Whether the resolver failed or timed out; the lookup then counts
    /// as "no candidates" but stays distinguishable from a genuinely
    /// empty result.
    pub resolver_error: bool,

    /// Whether at least one candidate surname matched the text.
    pub found_student: bool,

    /// Number of distinct population rows matched for this attachment.
    pub match_count: usize,

    /// Position of this record within the attachment's fan-out; together
    /// with `attachment_id` it keys the output table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_index: Option<usize>,

    /// The matched population row merged into this record (fan-out point:
    /// one outcome per matched row).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student: Option<PopulationRecord>,

    /// The stage at which processing stopped.
    pub stage: TerminalStage,
}

impl ExtractionOutcome {
    /// Outcome skeleton carrying only message metadata, recording a
    /// message that had nothing to process.
    pub fn for_message(message: &Message) -> Self {
        Self {
            message_id: message.id.clone(),
            folder_id: message.folder_id.clone(),
            sender: message.sender.clone(),
            subject: message.subject.clone(),
            received_at: message.received_at,
            has_attachments: message.has_attachments(),
            attachment_id: None,
            attachment_name: None,
            is_pdf: false,
            is_parsed: false,
            institutes: BTreeSet::new(),
            amounts: BTreeSet::new(),
            date_candidates_found: 0,
            search_date: None,
            has_candidates: false,
            resolver_error: false,
            found_student: false,
            match_count: 0,
            match_index: None,
            student: None,
            stage: TerminalStage::NoAttachments,
        }
    }

    /// Outcome skeleton for one attachment of a message. Starts at the
    /// first gate; the pipeline overwrites `stage` as the attachment
    /// advances.
    pub fn for_attachment(message: &Message, attachment: &Attachment) -> Self {
        let mut outcome = Self::for_message(message);
        outcome.attachment_id = Some(attachment.id.clone());
        outcome.attachment_name = Some(attachment.name.clone());
        outcome.is_pdf = attachment.is_pdf();
        outcome.stage = TerminalStage::NotPdf;
        outcome
    }

    /// Replicate this outcome for one matched population record at
    /// position `match_index` of a fan-out of `match_count` records.
    pub fn with_student(
        &self,
        record: &PopulationRecord,
        match_index: usize,
        match_count: usize,
    ) -> Self {
        let mut outcome = self.clone();
        outcome.found_student = true;
        outcome.match_count = match_count;
        outcome.match_index = Some(match_index);
        outcome.student = Some(record.clone());
        outcome.stage = TerminalStage::Matched;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::population::tests::record;

    fn message_with(attachments: Vec<Attachment>) -> Message {
        Message {
            id: "m1".to_string(),
            folder_id: Some("inbox".to_string()),
            sender: "sender@example.org".to_string(),
            subject: "payment proof".to_string(),
            received_at: Utc::now(),
            is_read: false,
            flagged: false,
            attachments,
        }
    }

    #[test]
    fn test_for_message_records_absence() {
        let message = message_with(Vec::new());
        let outcome = ExtractionOutcome::for_message(&message);
        assert_eq!(outcome.stage, TerminalStage::NoAttachments);
        assert!(!outcome.has_attachments);
        assert!(outcome.attachment_id.is_none());
    }

    #[test]
    fn test_fan_out_shares_extraction_fields() {
        let attachment = Attachment::new("a1", "scan.pdf", Vec::new());
        let message = message_with(vec![attachment.clone()]);

        let mut base = ExtractionOutcome::for_attachment(&message, &attachment);
        base.is_parsed = true;
        base.search_date = NaiveDate::from_ymd_opt(1999, 1, 1);
        base.amounts.insert("€450,00".to_string());

        let birth = NaiveDate::from_ymd_opt(1999, 1, 1).unwrap();
        let first = base.with_student(&record("s1", "100", "Jansen", birth), 0, 2);
        let second = base.with_student(&record("s2", "200", "Jansen", birth), 1, 2);

        assert_eq!(first.amounts, second.amounts);
        assert_eq!(first.search_date, second.search_date);
        assert_eq!(first.match_count, 2);
        assert_eq!(first.match_index, Some(0));
        assert_eq!(second.match_index, Some(1));
        assert!(first.stage.is_matched());
        assert_ne!(
            first.student.as_ref().unwrap().student_number,
            second.student.as_ref().unwrap().student_number
        );
    }
}
