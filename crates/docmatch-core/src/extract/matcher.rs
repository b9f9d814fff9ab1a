//! Surname matching against document text.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::debug;

use crate::models::PopulationRecord;

/// Whole-word, case-sensitive search of `surname` within `text`.
pub fn surname_matches(surname: &str, text: &str) -> bool {
    Regex::new(&format!(r"\b{}\b", regex::escape(surname)))
        .map(|regex| regex.is_match(text))
        .unwrap_or(false)
}

/// Disambiguate among `candidates` by searching the document text for
/// each distinct surname.
///
/// Every record whose surname matched is retained, in candidate order.
/// Multiple candidates can legitimately share a surname (siblings,
/// common names), so the fan-out is preserved rather than collapsed to a
/// single best match.
pub fn match_candidates<'a>(
    candidates: &'a [PopulationRecord],
    text: &str,
) -> Vec<&'a PopulationRecord> {
    let surnames: BTreeSet<&str> = candidates
        .iter()
        .map(|record| record.surname.as_str())
        .collect();

    let matched: BTreeSet<&str> = surnames
        .into_iter()
        .filter(|surname| surname_matches(surname, text))
        .collect();

    if !matched.is_empty() {
        debug!(surnames = ?matched, "surname hits in document text");
    }

    candidates
        .iter()
        .filter(|record| matched.contains(record.surname.as_str()))
        .collect()
}
