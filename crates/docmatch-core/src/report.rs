//! Aggregate reporting over an outcome sequence.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::ExtractionOutcome;

/// Counters summarizing one pipeline run, suitable for a log report.
///
/// Attachment counters are per unique attachment; a matched attachment
/// that fanned out to several records still counts once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Distinct messages seen.
    pub messages: usize,
    /// Distinct attachments seen.
    pub attachments: usize,
    /// Attachments with a `.pdf` suffix.
    pub pdf_attachments: usize,
    /// PDF attachments that decoded to usable text.
    pub parsed: usize,
    /// Attachments with at least one matched student.
    pub students_found: usize,
    /// Attachments whose matches include a central enrollment application.
    pub central_matches: usize,
    /// Attachments whose matches are decentral only.
    pub decentral_matches: usize,
    /// Total outcome records, fan-out included.
    pub records: usize,
}

impl ReportSummary {
    pub fn from_outcomes(outcomes: &[ExtractionOutcome]) -> Self {
        let messages: BTreeSet<&str> = outcomes.iter().map(|o| o.message_id.as_str()).collect();

        let mut attachments = BTreeSet::new();
        let mut pdf_attachments = BTreeSet::new();
        let mut parsed = BTreeSet::new();
        let mut students_found = BTreeSet::new();
        let mut central = BTreeSet::new();
        let mut decentral = BTreeSet::new();

        for outcome in outcomes {
            let Some(attachment_id) = outcome.attachment_id.as_deref() else {
                continue;
            };
            attachments.insert(attachment_id);
            if outcome.is_pdf {
                pdf_attachments.insert(attachment_id);
            }
            if outcome.is_parsed {
                parsed.insert(attachment_id);
            }
            if outcome.found_student {
                students_found.insert(attachment_id);
            }
            if let Some(student) = outcome.student.as_ref() {
                if student.is_central() {
                    central.insert(attachment_id);
                } else {
                    decentral.insert(attachment_id);
                }
            }
        }

        Self {
            messages: messages.len(),
            attachments: attachments.len(),
            pdf_attachments: pdf_attachments.len(),
            parsed: parsed.len(),
            students_found: students_found.len(),
            central_matches: central.len(),
            decentral_matches: decentral.len(),
            records: outcomes.len(),
        }
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "messages:          {}", self.messages)?;
        writeln!(f, "attachments:       {}", self.attachments)?;
        writeln!(f, "pdf attachments:   {}", self.pdf_attachments)?;
        writeln!(f, "parsed:            {}", self.parsed)?;
        writeln!(f, "students found:    {}", self.students_found)?;
        writeln!(f, "central matches:   {}", self.central_matches)?;
        writeln!(f, "decentral matches: {}", self.decentral_matches)?;
        write!(f, "outcome records:   {}", self.records)
    }
}
