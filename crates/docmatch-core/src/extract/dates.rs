//! Date-string extraction and normalization.
//!
//! Document dates are noisy: scans carry request dates, issue dates, and
//! OCR artifacts next to the birth date. The pipeline substitutes month
//! names, extracts every date-shaped substring, and keeps the earliest
//! valid calendar date; birth dates necessarily predate every other date
//! on an enrollment form.

use chrono::NaiveDate;

use super::patterns::{DATE_SEPARATOR, DATE_STRING, MONTH_PATTERNS};

/// Replace Dutch and English month names and abbreviations with their
/// two-digit month number, case-insensitive, so the date-string pass can
/// recognize dates written with month names.
pub fn replace_months(text: &str) -> String {
    let mut text = text.to_string();
    for (regex, number) in MONTH_PATTERNS.iter() {
        text = regex.replace_all(&text, *number).into_owned();
    }
    text
}

/// Return all non-overlapping date-shaped substrings, left to right.
pub fn find_datestrings(text: &str) -> Vec<String> {
    DATE_STRING
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Interpret a date substring as day-month-year.
fn parse_datestring(datestring: &str) -> Option<NaiveDate> {
    let mut parts = DATE_SEPARATOR.splitn(datestring, 3);
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Convert date substrings into calendar dates and return the earliest
/// valid one. Substrings that do not form a valid calendar date (month
/// 13, day 32) are discarded; `None` means no substring survived.
pub fn earliest_valid_date<S: AsRef<str>>(datestrings: &[S]) -> Option<NaiveDate> {
    datestrings
        .iter()
        .filter_map(|s| parse_datestring(s.as_ref()))
        .min()
}
