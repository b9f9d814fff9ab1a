//! Reference population records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Enrollment type marker for applications handled by the central desk.
pub const CENTRAL_ENROLLMENT: &str = "S";

/// Enrollment status marker for cancelled enrollments.
pub const CANCELLED_STATUS: &str = "G";

/// A reference-dataset row representing a known identity with enrollment
/// attributes, queried by birth date.
///
/// Owned by the external population store; the pipeline never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    /// Unique identifier of this enrollment application.
    pub enrollment_id: String,

    /// Student number.
    pub student_number: String,

    /// Given-name initials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,

    /// Surname prefix particles ("van", "de"), kept separate from the
    /// searchable surname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname_prefix: Option<String>,

    /// Surname used for whole-word matching against document text.
    pub surname: String,

    /// Birth date, the lookup key.
    pub birth_date: NaiveDate,

    /// Enrollment application type; central applications are marked `"S"`.
    pub enrollment_type: String,

    /// Program code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Faculty code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,

    /// Enrollment status; cancelled enrollments are marked `"G"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Date the enrollment application was filed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_date: Option<NaiveDate>,

    /// First day of the enrollment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    /// Last day of the enrollment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Exam type of the program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_type: Option<String>,
}

impl PopulationRecord {
    /// Whether this application is handled by the central desk.
    pub fn is_central(&self) -> bool {
        self.enrollment_type == CENTRAL_ENROLLMENT
    }

    /// Whether the enrollment was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some(CANCELLED_STATUS)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal record for tests elsewhere in the crate.
    pub(crate) fn record(
        enrollment_id: &str,
        student_number: &str,
        surname: &str,
        birth_date: NaiveDate,
    ) -> PopulationRecord {
        PopulationRecord {
            enrollment_id: enrollment_id.to_string(),
            student_number: student_number.to_string(),
            initials: None,
            surname_prefix: None,
            surname: surname.to_string(),
            birth_date,
            enrollment_type: "D".to_string(),
            program: None,
            faculty: None,
            status: None,
            application_date: None,
            start_date: None,
            end_date: None,
            exam_type: None,
        }
    }

    #[test]
    fn test_markers() {
        let mut rec = record("s1", "100", "Jansen", NaiveDate::from_ymd_opt(1999, 1, 1).unwrap());
        assert!(!rec.is_central());
        assert!(!rec.is_cancelled());

        rec.enrollment_type = "S".to_string();
        rec.status = Some("G".to_string());
        assert!(rec.is_central());
        assert!(rec.is_cancelled());
    }
}
