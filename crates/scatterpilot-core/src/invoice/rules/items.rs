//! Line-item extraction: quantity, unit price, and description.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::models::invoice::LineItem;

use super::amounts::parse_amount;
use super::patterns::{
    ITEM_AT_PRICE, ITEM_LABELED, ITEM_TIMES, NUMBER_TOKEN, OPENING_ITEM_PRICE, OPENING_QTY_ITEM,
};
use super::{ExtractionMatch, FieldExtractor, Matcher, first_match};

lazy_static! {
    static ref RATE_SUFFIX: Regex = Regex::new(
        r"(?i)(?:/\s*[a-z]+\b|\bper\s+[a-z]+\b|\beach\b|\bea\b)"
    ).unwrap();

    static ref LABEL_PREFIX: Regex = Regex::new(
        r"(?i)^(?:item|description|desc|product|service)\s*:\s*"
    ).unwrap();

    static ref FILLER_PREFIX: Regex = Regex::new(
        r"(?i)^(?:(?:and|plus|also|with|then|for)\s+)+"
    ).unwrap();

    static ref FOR_WORD: Regex = Regex::new(r"(?i)\bfor\s+").unwrap();
}

/// Minimum length of an implicit-quantity item description in an opening message.
const MIN_IMPLICIT_DESCRIPTION_LEN: usize = 4;

/// Line-item extractor for a single-item answer.
pub struct LineItemExtractor;

impl LineItemExtractor {
    const MATCHERS: &'static [Matcher<Self, LineItem>] = &[
        ("at_price", Self::match_at_price),
        ("times", Self::match_times),
        ("labeled", Self::match_labeled),
        ("numbers", Self::match_numbers),
    ];

    pub fn new() -> Self {
        Self
    }

    /// "40 hours at $150", "Web design 10 @ 75", "3 licenses for $99".
    fn match_at_price(&self, text: &str) -> Option<ExtractionMatch<LineItem>> {
        let caps = ITEM_AT_PRICE.captures(text)?;
        let full_match = caps.get(0)?;
        let quantity = positive(&caps[1])?;
        let unit_price = parse_amount(&caps[3])?;

        let mut description = clean_description(&remainder(text, full_match.start(), full_match.end()));
        if description.is_empty() {
            description = caps
                .get(2)
                .map(|m| clean_description(m.as_str()))
                .unwrap_or_default();
        }

        let item = LineItem::try_new(description, quantity, unit_price)?;

        Some(
            ExtractionMatch::new(item, full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    }

    /// "Banner printing 5 x $20", "2 * 15".
    fn match_times(&self, text: &str) -> Option<ExtractionMatch<LineItem>> {
        let caps = ITEM_TIMES.captures(text)?;
        let full_match = caps.get(0)?;
        let quantity = positive(&caps[1])?;
        let unit_price = parse_amount(&caps[2])?;
        let description = clean_description(&remainder(text, full_match.start(), full_match.end()));

        let item = LineItem::try_new(description, quantity, unit_price)?;

        Some(
            ExtractionMatch::new(item, full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    }

    /// "Item: Logo design, qty: 2, price: $300".
    fn match_labeled(&self, text: &str) -> Option<ExtractionMatch<LineItem>> {
        let caps = ITEM_LABELED.captures(text)?;
        let full_match = caps.get(0)?;
        let quantity = positive(&caps[1])?;
        let unit_price = parse_amount(&caps[2])?;
        let description = clean_description(&remainder(text, full_match.start(), full_match.end()));

        let item = LineItem::try_new(description, quantity, unit_price)?;

        Some(
            ExtractionMatch::new(item, full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    }

    /// Last resort: first number is the quantity, last number the price.
    fn match_numbers(&self, text: &str) -> Option<ExtractionMatch<LineItem>> {
        let tokens: Vec<_> = NUMBER_TOKEN.find_iter(text).collect();
        if tokens.len() < 2 {
            return None;
        }

        let first = tokens.first()?;
        let last = tokens.last()?;
        let quantity = positive(first.as_str())?;
        let unit_price = parse_amount(last.as_str())?;

        let stripped = NUMBER_TOKEN.replace_all(text, " ").replace('$', " ");
        let description = clean_description(&stripped);

        let item = LineItem::try_new(description, quantity, unit_price)?;

        Some(
            ExtractionMatch::new(item, text.trim())
                .with_position(first.start(), last.end()),
        )
    }
}

impl Default for LineItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for LineItemExtractor {
    type Output = ExtractionMatch<LineItem>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(self, text, Self::MATCHERS)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        extract_line_items(text)
            .into_iter()
            .map(|item| ExtractionMatch::new(item, text).with_matcher("opening"))
            .collect()
    }
}

/// Find every line item in a free-form opening message.
///
/// Two sweeps: "N ITEM at $P" items first, then "ITEM at/for $P" items with an
/// implicit quantity of one. A second-sweep item is skipped when its description
/// already appears inside an earlier item's description, or is three characters
/// or shorter.
pub fn extract_line_items(text: &str) -> Vec<LineItem> {
    let mut items: Vec<LineItem> = OPENING_QTY_ITEM
        .captures_iter(text)
        .filter_map(|caps| {
            let quantity = positive(&caps[1])?;
            let unit_price = parse_amount(&caps[3])?;
            LineItem::try_new(clean_description(&caps[2]), quantity, unit_price)
        })
        .collect();

    for caps in OPENING_ITEM_PRICE.captures_iter(text) {
        let description = clean_description(after_last_for(&caps[1]));
        if description.chars().count() < MIN_IMPLICIT_DESCRIPTION_LEN {
            continue;
        }

        let lowered = description.to_lowercase();
        if items
            .iter()
            .any(|item| item.description.to_lowercase().contains(&lowered))
        {
            continue;
        }

        if let Some(item) = parse_amount(&caps[2])
            .and_then(|unit_price| LineItem::try_new(description, Decimal::ONE, unit_price))
        {
            items.push(item);
        }
    }

    items
}

fn positive(s: &str) -> Option<Decimal> {
    parse_amount(s).filter(|quantity| *quantity > Decimal::ZERO)
}

/// "Invoice Acme for web hosting" → "web hosting".
fn after_last_for(raw: &str) -> &str {
    FOR_WORD
        .find_iter(raw)
        .last()
        .map_or(raw, |found| &raw[found.end()..])
}

fn remainder(text: &str, start: usize, end: usize) -> String {
    format!("{} {}", &text[..start], &text[end..])
}

fn clean_description(raw: &str) -> String {
    let without_rate = RATE_SUFFIX.replace_all(raw, " ");
    let collapsed = without_rate.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | ',' | ':' | ';' | '.' | '(' | ')' | '–' | '—')
    });
    let unlabeled = LABEL_PREFIX.replace(trimmed, "");
    let unfilled = FILLER_PREFIX.replace(&unlabeled, "");
    unfilled
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ',' | ':' | ';' | '.'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::DEFAULT_ITEM_DESCRIPTION;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn extract(text: &str) -> ExtractionMatch<LineItem> {
        LineItemExtractor::new().extract(text).unwrap()
    }

    #[test]
    fn test_hours_at_price() {
        let found = extract("40 hours at $150");
        assert_eq!(found.matcher, "at_price");
        assert_eq!(found.value.description, "hours");
        assert_eq!(found.value.quantity, dec("40"));
        assert_eq!(found.value.unit_price.to_string(), "150.00");
    }

    #[test]
    fn test_description_from_remaining_text() {
        let found = extract("Website redesign - 1 at $2,500");
        assert_eq!(found.value.description, "Website redesign");
        assert_eq!(found.value.unit_price, dec("2500"));

        let found = extract("Consulting: 40 hours at $150/hr");
        assert_eq!(found.value.description, "Consulting");
    }

    #[test]
    fn test_at_sign_and_for() {
        let found = extract("10 @ 12.50 for stickers");
        assert_eq!(found.value.quantity, dec("10"));
        assert_eq!(found.value.unit_price, dec("12.50"));
        assert_eq!(found.value.description, "stickers");

        let found = extract("3 licenses for $99");
        assert_eq!(found.value.description, "licenses");
        assert_eq!(found.value.unit_price, dec("99"));
    }

    #[test]
    fn test_times_pattern() {
        let found = extract("Banner printing 5 x $20");
        assert_eq!(found.matcher, "times");
        assert_eq!(found.value.description, "Banner printing");
        assert_eq!(found.value.quantity, dec("5"));
        assert_eq!(found.value.unit_price, dec("20"));
    }

    #[test]
    fn test_labeled_pattern() {
        let found = extract("Item: Logo design, qty: 2, price: $300");
        assert_eq!(found.matcher, "labeled");
        assert_eq!(found.value.description, "Logo design");
        assert_eq!(found.value.quantity, dec("2"));
        assert_eq!(found.value.unit_price, dec("300"));
    }

    #[test]
    fn test_numbers_fallback() {
        let found = extract("Logo design 2 300");
        assert_eq!(found.matcher, "numbers");
        assert_eq!(found.value.description, "Logo design");
        assert_eq!(found.value.quantity, dec("2"));
        assert_eq!(found.value.unit_price, dec("300"));
    }

    #[test]
    fn test_numbers_fallback_default_description() {
        let found = extract("5 20");
        assert_eq!(found.value.description, DEFAULT_ITEM_DESCRIPTION);
    }

    #[test]
    fn test_unparseable_item() {
        let extractor = LineItemExtractor::new();
        assert!(extractor.extract("hello").is_none());
        assert!(extractor.extract("I have 3 things").is_none());
        assert!(extractor.extract("0 widgets").is_none());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert!(LineItemExtractor::new().extract("0 at $5").is_none());
    }

    #[test]
    fn test_opening_items_single() {
        let items = extract_line_items("Invoice Acme Corp for 10 cameras at $125, due 12/31/2025");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "cameras");
        assert_eq!(items[0].quantity, dec("10"));
        assert_eq!(items[0].unit_price.to_string(), "125.00");
    }

    #[test]
    fn test_opening_items_multiple_with_implicit_quantity() {
        let items = extract_line_items(
            "Bill Globex for 2 logos at $50 and 3 banners at $20, plus hosting for $15",
        );
        let descriptions: Vec<&str> = items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(descriptions, vec!["logos", "banners", "hosting"]);
        assert_eq!(items[2].quantity, Decimal::ONE);
        assert_eq!(items[2].unit_price, dec("15"));
    }

    #[test]
    fn test_opening_item_drops_leading_request() {
        let items = extract_line_items("Invoice Acme for web hosting at $20");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "web hosting");
    }

    #[test]
    fn test_opening_items_skip_short_implicit_description() {
        let items = extract_line_items("one fee at $5");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "one fee");

        assert!(extract_line_items("tip at $5").is_empty());
    }

    #[test]
    fn test_overflowing_amount_is_not_an_item() {
        let text = "99999999999999999999 widgets at $99999999999999999999";
        assert!(LineItemExtractor::new().extract(text).is_none());
        assert!(
            extract_line_items(text)
                .iter()
                .all(|item| item.checked_amount().is_some())
        );
    }
}
