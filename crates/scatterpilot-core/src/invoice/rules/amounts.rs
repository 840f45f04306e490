//! Amount parsing and formatting, plus the tax-rate and discount extractors.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::patterns::{DISCOUNT_AMOUNT, TAX_RATE};
use super::{ExtractionMatch, FieldExtractor, Matcher, Resolved, first_match, is_negative_answer};

/// Tax-rate field extractor.
///
/// Reads the first number in the message. Values above 1 are percentages
/// (`8` or `8%` → 0.08); anything else is already a fraction (`0.08`).
pub struct TaxRateExtractor;

impl TaxRateExtractor {
    pub fn new() -> Self {
        Self
    }

    fn capture(caps: regex::Captures<'_>) -> Option<ExtractionMatch<Decimal>> {
        let full_match = caps.get(0)?;
        let raw = parse_amount(&caps[1])?;
        let rate = if raw > Decimal::ONE {
            raw / Decimal::ONE_HUNDRED
        } else {
            raw
        };

        Some(
            ExtractionMatch::new(round_cents(rate), full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    }
}

impl Default for TaxRateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TaxRateExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        TAX_RATE.captures(text).and_then(Self::capture)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        TAX_RATE.captures_iter(text).filter_map(Self::capture).collect()
    }
}

/// Resolve the tax-rate answer; no number means no tax.
pub fn resolve_tax_rate(text: &str) -> Resolved<Decimal> {
    match TaxRateExtractor::new().extract(text) {
        Some(found) => Resolved::Parsed(found.with_matcher("rate")),
        None => Resolved::Defaulted(Decimal::ZERO),
    }
}

/// Discount field extractor.
pub struct DiscountExtractor;

impl DiscountExtractor {
    const MATCHERS: &'static [Matcher<Self, Decimal>] = &[
        ("declined", Self::match_declined),
        ("amount", Self::match_amount),
    ];

    pub fn new() -> Self {
        Self
    }

    /// "no" anywhere, or a bare "0", is an explicit zero discount.
    fn match_declined(&self, text: &str) -> Option<ExtractionMatch<Decimal>> {
        let trimmed = text.trim();
        (is_negative_answer(trimmed) || trimmed == "0")
            .then(|| ExtractionMatch::new(round_cents(Decimal::ZERO), trimmed))
    }

    fn match_amount(&self, text: &str) -> Option<ExtractionMatch<Decimal>> {
        let caps = DISCOUNT_AMOUNT.captures(text)?;
        let full_match = caps.get(0)?;
        let amount = parse_amount(&caps[1])?;

        Some(
            ExtractionMatch::new(round_cents(amount), full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    }
}

impl Default for DiscountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DiscountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(self, text, Self::MATCHERS)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.extract(text).into_iter().collect()
    }
}

/// Resolve the discount answer; nothing recognizable means no discount.
pub fn resolve_discount(text: &str) -> Resolved<Decimal> {
    match DiscountExtractor::new().extract(text) {
        Some(found) => Resolved::Parsed(found),
        None => Resolved::Defaulted(round_cents(Decimal::ZERO)),
    }
}

/// Parse an amount such as `1,500.50`, `125` or `.08`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.starts_with('.') {
        format!("0{}", cleaned)
    } else {
        cleaned
    };

    Decimal::from_str(&normalized).ok()
}

/// Round half away from zero to two decimals.
pub fn round_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Format an amount as fixed two-decimal text (`125` → `125.00`).
pub fn format_amount(amount: Decimal) -> String {
    round_cents(amount).to_string()
}

/// Format a quantity without trailing zeros (`10.0` → `10`, `1.50` → `1.5`).
pub fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,500.50"), Some(dec("1500.50")));
        assert_eq!(parse_amount("125"), Some(dec("125")));
        assert_eq!(parse_amount(".08"), Some(dec("0.08")));
        assert_eq!(parse_amount("$"), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("125")), "125.00");
        assert_eq!(format_amount(dec("0.085")), "0.09");
        assert_eq!(format_amount(dec("1332.4")), "1332.40");
        assert_eq!(format_amount(dec("-12.345")), "-12.35");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(dec("10")), "10");
        assert_eq!(format_quantity(dec("1.50")), "1.5");
    }

    #[test]
    fn test_tax_rate_percentage() {
        let extractor = TaxRateExtractor::new();
        assert_eq!(extractor.extract("8%").unwrap().value, dec("0.08"));
        assert_eq!(extractor.extract("8").unwrap().value, dec("0.08"));
        assert_eq!(extractor.extract("tax is 7.5 percent").unwrap().value, dec("0.08"));
    }

    #[test]
    fn test_tax_rate_fraction() {
        let extractor = TaxRateExtractor::new();
        assert_eq!(extractor.extract("0.08").unwrap().value, dec("0.08"));
        assert_eq!(extractor.extract(".1").unwrap().value, dec("0.10"));
    }

    #[test]
    fn test_tax_rate_formats_two_decimals() {
        let found = TaxRateExtractor::new().extract("8%").unwrap();
        assert_eq!(format_amount(found.value), "0.08");
        assert_eq!(found.value.to_string(), "0.08");
    }

    #[test]
    fn test_tax_rate_default() {
        let resolved = resolve_tax_rate("no tax please");
        assert!(resolved.is_default());
        assert_eq!(*resolved.value(), Decimal::ZERO);
    }

    #[test]
    fn test_discount_declined() {
        for answer in ["no", "No discount", "0", " 0 "] {
            let resolved = resolve_discount(answer);
            assert!(!resolved.is_default(), "{answer}");
            assert_eq!(resolved.value().to_string(), "0.00", "{answer}");
        }
    }

    #[test]
    fn test_discount_amount() {
        let resolved = resolve_discount("$50");
        assert_eq!(resolved.value().to_string(), "50.00");

        let resolved = resolve_discount("take off 1,250.5");
        assert_eq!(resolved.value().to_string(), "1250.50");
    }

    #[test]
    fn test_discount_without_number_defaults_to_zero() {
        let resolved = resolve_discount("whatever you think");
        assert!(resolved.is_default());
        assert_eq!(resolved.value().to_string(), "0.00");
    }
}
