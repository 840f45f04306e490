//! Customer name extraction.

use super::patterns::{
    NAME_CAPITALIZED, NAME_LABELED, NAME_LEADING, OPENING_NAME_CUSTOMER, OPENING_NAME_INVOICE,
};
use super::{ExtractionMatch, FieldExtractor, Matcher, Resolved, first_match};

/// Customer name extractor for a direct answer to "who is this invoice for?".
pub struct NameExtractor;

impl NameExtractor {
    const MATCHERS: &'static [Matcher<Self, String>] = &[
        ("labeled", Self::match_labeled),
        ("leading", Self::match_leading),
        ("capitalized", Self::match_capitalized),
    ];

    pub fn new() -> Self {
        Self
    }

    /// "for Acme", "customer: Acme", "the client name is Acme."
    fn match_labeled(&self, text: &str) -> Option<ExtractionMatch<String>> {
        capture_name(NAME_LABELED.captures(text)?)
    }

    /// A message that starts with a capitalized phrase, up to the first period.
    fn match_leading(&self, text: &str) -> Option<ExtractionMatch<String>> {
        capture_name(NAME_LEADING.captures(text.trim())?)
    }

    fn match_capitalized(&self, text: &str) -> Option<ExtractionMatch<String>> {
        capture_name(NAME_CAPITALIZED.captures(text)?)
    }
}

impl Default for NameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for NameExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(self, text, Self::MATCHERS)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        NAME_CAPITALIZED
            .captures_iter(text)
            .filter_map(capture_name)
            .collect()
    }
}

/// Resolve a direct name answer. When no pattern matches, the whole trimmed
/// message is taken as the name.
pub fn resolve_customer_name(text: &str) -> Resolved<String> {
    match NameExtractor::new().extract(text) {
        Some(found) => Resolved::Parsed(found),
        None => Resolved::Defaulted(text.trim().to_string()),
    }
}

/// Find the customer name inside a free-form opening message such as
/// "Invoice Acme Corp for 10 cameras at $125". No fallback.
pub fn extract_customer_name(text: &str) -> Option<ExtractionMatch<String>> {
    [("invoice", &*OPENING_NAME_INVOICE), ("customer", &*OPENING_NAME_CUSTOMER)]
        .into_iter()
        .find_map(|(name, pattern)| {
            pattern
                .captures_iter(text)
                .find_map(capture_name)
                .map(|found| found.with_matcher(name))
        })
}

fn capture_name(caps: regex::Captures<'_>) -> Option<ExtractionMatch<String>> {
    let group = caps.get(1)?;
    let name = clean_name(group.as_str());
    if name.is_empty() {
        return None;
    }

    Some(ExtractionMatch::new(name, group.as_str()).with_position(group.start(), group.end()))
}

fn clean_name(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| c == '.' || c == ',' || c == '-' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> String {
        resolve_customer_name(text).into_value()
    }

    #[test]
    fn test_labeled_name() {
        assert_eq!(name("The customer is Acme Corp."), "Acme Corp");
        assert_eq!(name("client name is Globex, thanks"), "Globex");
        assert_eq!(name("It's for Initech"), "Initech");
        assert_eq!(name("customer: Wayne Enterprises"), "Wayne Enterprises");
    }

    #[test]
    fn test_leading_capitalized_phrase() {
        let found = NameExtractor::new().extract("Acme Corp. They pay late.").unwrap();
        assert_eq!(found.value, "Acme Corp");
        assert_eq!(found.matcher, "leading");
    }

    #[test]
    fn test_capitalized_run() {
        let found = NameExtractor::new().extract("bill them at Stark Industries").unwrap();
        assert_eq!(found.value, "Stark Industries");
        assert_eq!(found.matcher, "capitalized");
    }

    #[test]
    fn test_whole_message_fallback() {
        let resolved = resolve_customer_name("  bob's bakery  ");
        assert!(resolved.is_default());
        assert_eq!(resolved.into_value(), "bob's bakery");
    }

    #[test]
    fn test_opening_message_invoice_pattern() {
        let found =
            extract_customer_name("Invoice Acme Corp for 10 cameras at $125, due 12/31/2025")
                .unwrap();
        assert_eq!(found.value, "Acme Corp");
        assert_eq!(found.matcher, "invoice");
    }

    #[test]
    fn test_opening_message_bill_pattern() {
        let found = extract_customer_name("Bill Globex Inc $500 for consulting").unwrap();
        assert_eq!(found.value, "Globex Inc");
    }

    #[test]
    fn test_opening_message_customer_pattern() {
        let found =
            extract_customer_name("I need an invoice for Initech for 3 widgets at $5").unwrap();
        assert_eq!(found.value, "Initech");
        assert_eq!(found.matcher, "customer");
    }

    #[test]
    fn test_opening_message_stops_at_due() {
        let found = extract_customer_name("Invoice Acme Corp due 1/15/2026").unwrap();
        assert_eq!(found.value, "Acme Corp");
    }

    #[test]
    fn test_opening_message_without_name() {
        assert!(extract_customer_name("I'd like to create an invoice").is_none());
        assert!(extract_customer_name("hello there").is_none());
    }
}
