//! Currency amount extraction.

use super::patterns::AMOUNT;

/// Search `text` and return raw substrings matching the amount format,
/// e.g. `€120`, `€1200,00`, `€ 1.200,00`, `€ 1 200,00`.
///
/// Matches are returned verbatim, euro sign included. Resolving the
/// currency format to a numeric value is left to downstream consumers.
pub fn find_amounts(text: &str) -> Vec<String> {
    AMOUNT
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_amount_formats() {
        let text = "\n1200\n€120\n€1200\n€1200,00\n€ 1200,00\n€ 1,200.00\n€ 1.200,00\n€ 1 200,00\n€ 1x200,00\n";
        let expected = vec![
            "€120",
            "€1200",
            "€1200,00",
            "€ 1200,00",
            "€ 1,200.00",
            "€ 1.200,00",
            "€ 1 200,00",
        ];
        assert_eq!(find_amounts(text), expected);
    }

    #[test]
    fn test_rejects_digit_letter_adjacency() {
        assert!(find_amounts("€ 1x200,00").is_empty());
        assert!(find_amounts("€x120").is_empty());
    }

    #[test]
    fn test_whitespace_never_spans_newline() {
        // The euro sign and the digits must share a line.
        assert!(find_amounts("€\n120").is_empty());
    }

    #[test]
    fn test_amounts_on_one_line() {
        let found = find_amounts("€120 €1200,00 € 1.200,00 € 1x200,00");
        assert_eq!(found, vec!["€120", "€1200,00", "€ 1.200,00"]);
    }
}
