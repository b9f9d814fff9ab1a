//! Compiled regex patterns for document field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Currency amounts: a euro sign, optional same-line whitespace, a
    // digit, then digits with at most one separator interleaved per
    // position. A digit-letter adjacency breaks the match entirely.
    pub static ref AMOUNT: Regex = Regex::new(
        r"€[^\S\n\r]*\d(?:[.,]?|[^\S\n\r])\d+[.,]?\d*"
    ).unwrap();

    // Date substrings: d{1,2} SEP d{1,2} SEP d{4}, SEP one of -/. or a
    // single same-line whitespace character. The word boundary keeps the
    // year from matching the first four digits of a longer run.
    pub static ref DATE_STRING: Regex = Regex::new(
        r"\d{1,2}(?:[-/.]|[^\S\n\r])\d{1,2}(?:[-/.]|[^\S\n\r])\d{4}\b"
    ).unwrap();

    // Separator set used to split a matched date substring into parts.
    pub static ref DATE_SEPARATOR: Regex = Regex::new(
        r"(?:[-/.]|[^\S\n\r])"
    ).unwrap();

    // Runs of two-or-more non-newline whitespace characters.
    pub static ref REDUNDANT_WHITESPACE: Regex = Regex::new(
        r"[^\S\n\r]{2,}"
    ).unwrap();

    // Month names (Dutch and English) and their abbreviations, paired
    // with the two-digit month number. Longer alternatives come first so
    // an abbreviation never shadows the full name.
    pub static ref MONTH_PATTERNS: Vec<(Regex, &'static str)> = [
        (r"(?i)(januari|january|jan)", "01"),
        (r"(?i)(februari|february|feb)", "02"),
        (r"(?i)(maart|march|mrt|mar)", "03"),
        (r"(?i)(april|apr)", "04"),
        (r"(?i)(mei|may)", "05"),
        (r"(?i)(juni|june|jun)", "06"),
        (r"(?i)(juli|july|jul)", "07"),
        (r"(?i)(augustus|august|aug)", "08"),
        (r"(?i)(september|sep)", "09"),
        (r"(?i)(oktober|october|okt|oct)", "10"),
        (r"(?i)(november|nov)", "11"),
        (r"(?i)(december|dec)", "12"),
    ]
    .iter()
    .map(|(pattern, number)| (Regex::new(pattern).unwrap(), *number))
    .collect();
}
