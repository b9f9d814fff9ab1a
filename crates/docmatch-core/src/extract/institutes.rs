//! Institute name matching.

use regex::Regex;

/// A configured list of institute name patterns, compiled once at
/// pipeline construction.
pub struct InstituteMatcher {
    patterns: Vec<(String, Regex)>,
}

impl InstituteMatcher {
    /// Compile the configured patterns. An invalid pattern is a
    /// configuration error, not a silent skip.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map(|regex| (pattern.to_string(), regex))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Return the configured patterns that match anywhere in `text`.
    ///
    /// Callers pass the newline-flattened, whitespace-normalized text so
    /// multi-word names survive line wrapping in the source document.
    pub fn find(&self, text: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|(_, regex)| regex.is_match(text))
            .map(|(pattern, _)| pattern.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::text::flatten_lines;

    #[test]
    fn test_pattern_search_not_equality() {
        let matcher = InstituteMatcher::new(["UU", "Hogeschool Utrecht"]).unwrap();
        let found = matcher.find("collegegeld voldaan aan de UU in 2020");
        assert_eq!(found, vec!["UU".to_string()]);
    }

    #[test]
    fn test_match_across_wrapped_lines() {
        let matcher = InstituteMatcher::new(["Hogeschool Utrecht"]).unwrap();
        let text = flatten_lines("bewijs   Hogeschool\nUtrecht   2020");
        assert_eq!(matcher.find(&text), vec!["Hogeschool Utrecht".to_string()]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let matcher = InstituteMatcher::new(["UU"]).unwrap();
        assert!(matcher.find("geen instelling genoemd").is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(InstituteMatcher::new(["(unclosed"]).is_err());
    }
}
