//! In-memory population snapshot loaded from a CSV export of the
//! enrollment history.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use super::CandidateResolver;
use crate::error::{PopulationError, ResolverError};
use crate::models::PopulationRecord;

/// Enrollment-history snapshot indexed by birth date.
///
/// The snapshot is read once at startup and never mutated; lookups are
/// plain map reads, so this resolver cannot fail or block.
pub struct PopulationSnapshot {
    by_birth_date: HashMap<NaiveDate, Vec<PopulationRecord>>,
    len: usize,
}

impl PopulationSnapshot {
    /// Build a snapshot from records, relabelling legacy faculty codes
    /// through `faculty_aliases`.
    pub fn new(
        records: impl IntoIterator<Item = PopulationRecord>,
        faculty_aliases: &HashMap<String, String>,
    ) -> Self {
        let mut by_birth_date: HashMap<NaiveDate, Vec<PopulationRecord>> = HashMap::new();
        let mut len = 0;

        for mut record in records {
            if let Some(faculty) = record.faculty.as_ref() {
                if let Some(alias) = faculty_aliases.get(faculty) {
                    record.faculty = Some(alias.clone());
                }
            }
            by_birth_date
                .entry(record.birth_date)
                .or_default()
                .push(record);
            len += 1;
        }

        Self { by_birth_date, len }
    }

    /// Load a snapshot from a CSV file with headers matching the
    /// [`PopulationRecord`] field names.
    pub fn from_csv_path(
        path: &Path,
        faculty_aliases: &HashMap<String, String>,
    ) -> Result<Self, PopulationError> {
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<PopulationRecord>, _>>()?;

        let snapshot = Self::new(records, faculty_aliases);
        info!(
            records = snapshot.len(),
            birth_dates = snapshot.by_birth_date.len(),
            "population snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Number of records in the snapshot.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl CandidateResolver for PopulationSnapshot {
    fn lookup_by_birth_date(
        &self,
        birth_date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<PopulationRecord>, ResolverError>> + Send {
        let records = self
            .by_birth_date
            .get(&birth_date)
            .cloned()
            .unwrap_or_default();
        async move { Ok(records) }
    }
}
