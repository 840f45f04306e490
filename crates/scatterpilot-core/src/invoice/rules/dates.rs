//! Date extraction for chat answers.
//!
//! Numeric dates are read month-first (`MM/DD/YYYY`, `MM-DD-YY`); there is no
//! day/month disambiguation. Two-digit years are 20XX.

use chrono::{Days, NaiveDate};

use super::patterns::{
    DATE_ISO, DATE_NAMED, DATE_NUMERIC, DUE_DATE_CUE, INVOICE_DATE_CUES, RELATIVE_DAYS, TODAY,
};
use super::{ExtractionMatch, FieldExtractor, Matcher, Resolved, first_match};

/// Date field extractor. Relative phrases are resolved against `today`.
pub struct DateExtractor {
    today: NaiveDate,
}

impl DateExtractor {
    const MATCHERS: &'static [Matcher<Self, NaiveDate>] = &[
        ("today", Self::match_today),
        ("numeric", Self::match_numeric),
        ("iso", Self::match_iso),
        ("named", Self::match_named),
        ("relative", Self::match_relative),
    ];

    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    fn match_today(&self, text: &str) -> Option<ExtractionMatch<NaiveDate>> {
        let m = TODAY.find(text)?;
        Some(ExtractionMatch::new(self.today, m.as_str()).with_position(m.start(), m.end()))
    }

    fn match_numeric(&self, text: &str) -> Option<ExtractionMatch<NaiveDate>> {
        numeric_dates(text).into_iter().next()
    }

    fn match_iso(&self, text: &str) -> Option<ExtractionMatch<NaiveDate>> {
        iso_dates(text).into_iter().next()
    }

    fn match_named(&self, text: &str) -> Option<ExtractionMatch<NaiveDate>> {
        named_dates(text).into_iter().next()
    }

    /// "30 days", "in 45 days", "14 days from now".
    fn match_relative(&self, text: &str) -> Option<ExtractionMatch<NaiveDate>> {
        let caps = RELATIVE_DAYS.captures(text)?;
        let full_match = caps.get(0)?;
        let days: u64 = caps[1].parse().ok()?;
        let date = self.today.checked_add_days(Days::new(days))?;

        Some(
            ExtractionMatch::new(date, full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(self, text, Self::MATCHERS)
    }

    /// All absolute dates in order of appearance.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        absolute_dates(text)
    }
}

/// Resolve an invoice-date answer; defaults to today.
pub fn resolve_invoice_date(text: &str, today: NaiveDate) -> Resolved<NaiveDate> {
    match DateExtractor::new(today).extract(text) {
        Some(found) => Resolved::Parsed(found),
        None => Resolved::Defaulted(default_invoice_date(today)),
    }
}

/// Resolve a due-date answer; defaults to `default_days` after the invoice
/// date, or after today when no invoice date is known.
pub fn resolve_due_date(
    text: &str,
    today: NaiveDate,
    invoice_date: Option<NaiveDate>,
    default_days: u32,
) -> Resolved<NaiveDate> {
    match DateExtractor::new(today).extract(text) {
        Some(found) => Resolved::Parsed(found),
        None => Resolved::Defaulted(default_due_date(today, invoice_date, default_days)),
    }
}

/// Invoice date used when the answer has no recognizable date.
pub fn default_invoice_date(today: NaiveDate) -> NaiveDate {
    today
}

/// Due date used when the answer has no recognizable date.
pub fn default_due_date(today: NaiveDate, invoice_date: Option<NaiveDate>, days: u32) -> NaiveDate {
    let base = invoice_date.unwrap_or(today);
    base.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(base)
}

/// Dates found in a free-form opening message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpeningDates {
    pub invoice_date: Option<ExtractionMatch<NaiveDate>>,
    pub due_date: Option<ExtractionMatch<NaiveDate>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateCue {
    Invoice,
    Due,
}

/// Assign the dates in an opening message to invoice/due date.
///
/// A date right after "performed", "dated" or "on" is the invoice date; one
/// within two words after "due" is the due date. Remaining dates fill the
/// invoice date, then the due date, in order of appearance.
pub fn extract_dates(text: &str) -> OpeningDates {
    let mut result = OpeningDates::default();
    let mut unlabeled = Vec::new();

    for found in absolute_dates(text) {
        let start = found.position.map(|(start, _)| start).unwrap_or(0);
        match date_cue(&text[..start]) {
            Some(DateCue::Due) if result.due_date.is_none() => {
                result.due_date = Some(found.with_matcher("due"));
            }
            Some(DateCue::Invoice) if result.invoice_date.is_none() => {
                result.invoice_date = Some(found.with_matcher("dated"));
            }
            _ => unlabeled.push(found.with_matcher("ordered")),
        }
    }

    for found in unlabeled {
        if result.invoice_date.is_none() {
            result.invoice_date = Some(found);
        } else if result.due_date.is_none() {
            result.due_date = Some(found);
        }
    }

    result
}

fn date_cue(preceding: &str) -> Option<DateCue> {
    let lowered = preceding.to_lowercase();
    let mut words = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .rev();

    let last = words.next()?;
    let before_last = words.next();

    if last == DUE_DATE_CUE || before_last == Some(DUE_DATE_CUE) {
        Some(DateCue::Due)
    } else if INVOICE_DATE_CUES.contains(&last) {
        Some(DateCue::Invoice)
    } else {
        None
    }
}

fn absolute_dates(text: &str) -> Vec<ExtractionMatch<NaiveDate>> {
    let mut results = numeric_dates(text);
    results.extend(iso_dates(text));
    results.extend(named_dates(text));
    results.sort_by_key(|found| found.position);
    results
}

/// MM/DD/YYYY, MM-DD-YYYY, MM/DD/YY.
fn numeric_dates(text: &str) -> Vec<ExtractionMatch<NaiveDate>> {
    DATE_NUMERIC
        .captures_iter(text)
        .filter_map(|caps| {
            let month: u32 = caps[1].parse().ok()?;
            let day: u32 = caps[2].parse().ok()?;
            let year = parse_year(&caps[3])?;
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let full_match = caps.get(0)?;
            Some(
                ExtractionMatch::new(date, full_match.as_str())
                    .with_position(full_match.start(), full_match.end()),
            )
        })
        .collect()
}

/// YYYY-MM-DD.
fn iso_dates(text: &str) -> Vec<ExtractionMatch<NaiveDate>> {
    DATE_ISO
        .captures_iter(text)
        .filter_map(|caps| {
            let year: i32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = caps[3].parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let full_match = caps.get(0)?;
            Some(
                ExtractionMatch::new(date, full_match.as_str())
                    .with_position(full_match.start(), full_match.end()),
            )
        })
        .collect()
}

/// "December 31, 2025", "march 3rd 2026".
fn named_dates(text: &str) -> Vec<ExtractionMatch<NaiveDate>> {
    DATE_NAMED
        .captures_iter(text)
        .filter_map(|caps| {
            let month = month_to_number(&caps[1])?;
            let day: u32 = caps[2].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let full_match = caps.get(0)?;
            Some(
                ExtractionMatch::new(date, full_match.as_str())
                    .with_position(full_match.start(), full_match.end()),
            )
        })
        .collect()
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(if s.len() == 2 { 2000 + year } else { year })
}

fn month_to_number(month: &str) -> Option<u32> {
    let number = match month.to_lowercase().as_str() {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => return None,
    };
    Some(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2025, 6, 15)
    }

    #[test]
    fn test_extract_today() {
        let found = DateExtractor::new(today()).extract("Today please").unwrap();
        assert_eq!(found.value, today());
        assert_eq!(found.matcher, "today");
    }

    #[test]
    fn test_extract_numeric_month_first() {
        let extractor = DateExtractor::new(today());
        assert_eq!(extractor.extract("12/31/2025").unwrap().value, ymd(2025, 12, 31));
        assert_eq!(extractor.extract("01-05-2026").unwrap().value, ymd(2026, 1, 5));
        assert_eq!(extractor.extract("3/4/26").unwrap().value, ymd(2026, 3, 4));
    }

    #[test]
    fn test_invalid_numeric_date_falls_through() {
        // 31/12 is not a valid month-first date, so no date is found.
        assert!(DateExtractor::new(today()).extract("31/12/2025").is_none());
    }

    #[test]
    fn test_extract_iso() {
        let found = DateExtractor::new(today()).extract("2025-7-4").unwrap();
        assert_eq!(found.value, ymd(2025, 7, 4));
        assert_eq!(found.value.format("%Y-%m-%d").to_string(), "2025-07-04");
        assert_eq!(found.matcher, "iso");
    }

    #[test]
    fn test_extract_named_month() {
        let extractor = DateExtractor::new(today());
        assert_eq!(extractor.extract("December 31, 2025").unwrap().value, ymd(2025, 12, 31));
        assert_eq!(extractor.extract("on march 3rd 2026").unwrap().value, ymd(2026, 3, 3));
    }

    #[test]
    fn test_extract_relative_days() {
        let extractor = DateExtractor::new(today());
        assert_eq!(extractor.extract("30 days").unwrap().value, ymd(2025, 7, 15));
        assert_eq!(extractor.extract("in 1 day from now").unwrap().value, ymd(2025, 6, 16));
        assert_eq!(extractor.extract("in 1 day").unwrap().matcher, "relative");
    }

    #[test]
    fn test_invoice_date_default() {
        let resolved = resolve_invoice_date("whenever", today());
        assert!(resolved.is_default());
        assert_eq!(*resolved.value(), today());
    }

    #[test]
    fn test_due_date_default_from_invoice_date() {
        let resolved = resolve_due_date("not sure", today(), Some(ymd(2025, 1, 1)), 30);
        assert!(resolved.is_default());
        assert_eq!(*resolved.value(), ymd(2025, 1, 31));
    }

    #[test]
    fn test_due_date_default_from_today() {
        let resolved = resolve_due_date("not sure", today(), None, 30);
        assert_eq!(*resolved.value(), ymd(2025, 7, 15));
    }

    #[test]
    fn test_due_date_parsed() {
        let resolved = resolve_due_date("due 12/31/2025", today(), None, 30);
        assert!(!resolved.is_default());
        assert_eq!(*resolved.value(), ymd(2025, 12, 31));
    }

    #[test]
    fn test_opening_dates_labeled_due() {
        let dates = extract_dates("Invoice Acme Corp for 10 cameras at $125, due 12/31/2025");
        assert!(dates.invoice_date.is_none());
        assert_eq!(dates.due_date.unwrap().value, ymd(2025, 12, 31));
    }

    #[test]
    fn test_opening_dates_labeled_both() {
        let dates = extract_dates("Work performed 2025-03-01, payment due by March 31, 2025");
        assert_eq!(dates.invoice_date.unwrap().value, ymd(2025, 3, 1));
        assert_eq!(dates.due_date.unwrap().value, ymd(2025, 3, 31));
    }

    #[test]
    fn test_opening_dates_due_on() {
        let dates = extract_dates("dated 1/2/2025 and due on 2/1/2025");
        assert_eq!(dates.invoice_date.unwrap().value, ymd(2025, 1, 2));
        assert_eq!(dates.due_date.unwrap().value, ymd(2025, 2, 1));
    }

    #[test]
    fn test_opening_dates_by_order() {
        let dates = extract_dates("From 1/2/2025 until 2/1/2025");
        let invoice_date = dates.invoice_date.unwrap();
        assert_eq!(invoice_date.value, ymd(2025, 1, 2));
        assert_eq!(invoice_date.matcher, "ordered");
        assert_eq!(dates.due_date.unwrap().value, ymd(2025, 2, 1));
    }

    #[test]
    fn test_opening_dates_unlabeled_fills_remaining_slot() {
        let dates = extract_dates("due 2/1/2025, issued 1/2/2025");
        assert_eq!(dates.due_date.unwrap().value, ymd(2025, 2, 1));
        assert_eq!(dates.invoice_date.unwrap().value, ymd(2025, 1, 2));
    }
}
