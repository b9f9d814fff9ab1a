//! Message-level classification of assembled outcome groups.
//!
//! Operates purely on the pipeline's output sequence; the decisions here
//! feed the forwarding collaborator (move to issues, annotate for the
//! central desk, or forward to a faculty).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{ExtractionOutcome, ForwarderConfig, PopulationRecord};

/// Routing status of one message, derived from its outcome group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// No PDF attachment on the message.
    NoPdfs,
    /// More than one PDF attachment; ambiguous, handled manually.
    TooManyPdfs,
    /// The single PDF could not be decoded.
    PdfNotParsed,
    /// Decoded, but no student was matched.
    NoStudentMatched,
    /// Matches span more than one student number.
    MultipleStudentsMatched,
    /// One student, more than one active enrollment application.
    MultipleEnrollments,
    /// Exactly one active enrollment application matched.
    SingleEnrollment,
}

/// Destination category for a classified message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingKind {
    /// Needs manual handling.
    Issue,
    /// Central enrollment application, handled by the central desk.
    Central,
    /// Decentral application, forwarded to the faculty.
    Faculty,
}

/// Split an ordered outcome sequence into per-message groups.
///
/// The pipeline emits outcomes contiguously per message, so grouping is a
/// single pass.
pub fn group_by_message(outcomes: &[ExtractionOutcome]) -> Vec<&[ExtractionOutcome]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for end in 1..=outcomes.len() {
        if end == outcomes.len() || outcomes[end].message_id != outcomes[start].message_id {
            groups.push(&outcomes[start..end]);
            start = end;
        }
    }
    groups
}

/// Matched, non-cancelled population records within one message group.
fn active_records<'a>(outcomes: &'a [ExtractionOutcome]) -> Vec<&'a PopulationRecord> {
    outcomes
        .iter()
        .filter_map(|outcome| outcome.student.as_ref())
        .filter(|record| !record.is_cancelled())
        .collect()
}

/// Classify one message's outcome group.
///
/// Cancelled enrollments are discarded before counting students and
/// enrollment applications.
pub fn classify_message(outcomes: &[ExtractionOutcome]) -> MessageStatus {
    let pdfs: Vec<&ExtractionOutcome> = outcomes.iter().filter(|o| o.is_pdf).collect();

    let pdf_ids: BTreeSet<&str> = pdfs
        .iter()
        .filter_map(|o| o.attachment_id.as_deref())
        .collect();
    if pdf_ids.is_empty() {
        return MessageStatus::NoPdfs;
    }
    if pdf_ids.len() > 1 {
        return MessageStatus::TooManyPdfs;
    }

    if !pdfs.iter().any(|o| o.is_parsed) {
        return MessageStatus::PdfNotParsed;
    }
    if !pdfs.iter().any(|o| o.found_student) {
        return MessageStatus::NoStudentMatched;
    }

    let records = active_records(outcomes);
    if records.is_empty() {
        // Every match was a cancelled enrollment.
        return MessageStatus::NoStudentMatched;
    }

    let students: BTreeSet<&str> = records.iter().map(|r| r.student_number.as_str()).collect();
    if students.len() > 1 {
        return MessageStatus::MultipleStudentsMatched;
    }

    let enrollments: BTreeSet<&str> = records.iter().map(|r| r.enrollment_id.as_str()).collect();
    if enrollments.len() > 1 {
        return MessageStatus::MultipleEnrollments;
    }

    MessageStatus::SingleEnrollment
}

/// Destination category for a classified message group.
pub fn routing_kind(status: MessageStatus, outcomes: &[ExtractionOutcome]) -> RoutingKind {
    if status != MessageStatus::SingleEnrollment {
        return RoutingKind::Issue;
    }
    if active_records(outcomes).iter().any(|r| r.is_central()) {
        RoutingKind::Central
    } else {
        RoutingKind::Faculty
    }
}

/// Resolve the recipient address for a classified message group.
///
/// Issues and central applications go to the central desk. Faculty
/// forwards look up the program first, then the faculty, in the
/// lowercased address book; `None` means no address is configured.
pub fn resolve_recipient(
    kind: RoutingKind,
    outcomes: &[ExtractionOutcome],
    forwarder: &ForwarderConfig,
) -> Option<String> {
    match kind {
        RoutingKind::Issue | RoutingKind::Central => {
            if forwarder.central_address.is_empty() {
                None
            } else {
                Some(forwarder.central_address.clone())
            }
        }
        RoutingKind::Faculty => {
            let record = active_records(outcomes)
                .into_iter()
                .find(|r| r.program.is_some())?;
            [record.program.as_deref(), record.faculty.as_deref()]
                .into_iter()
                .flatten()
                .find_map(|key| forwarder.addresses.get(&key.to_lowercase()).cloned())
        }
    }
}
