//! Rule-based field extractors for chat messages.
//!
//! Every field is read by an ordered list of matchers; the first matcher that
//! produces a value wins. Fields with a fallback value expose it through
//! [`Resolved::Defaulted`] so callers can tell a parsed value from a default.

pub mod amounts;
pub mod dates;
pub mod items;
pub mod names;
pub mod patterns;

pub use amounts::{
    DiscountExtractor, TaxRateExtractor, format_amount, format_quantity, parse_amount, round_cents,
};
pub use dates::{DateExtractor, OpeningDates, extract_dates, resolve_due_date, resolve_invoice_date};
pub use items::{LineItemExtractor, extract_line_items};
pub use names::{NameExtractor, extract_customer_name};
pub use patterns::*;

use tracing::debug;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value pulled out of a message, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Name of the matcher that produced the value.
    pub matcher: &'static str,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            matcher: "",
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn with_matcher(mut self, matcher: &'static str) -> Self {
        self.matcher = matcher;
        self
    }
}

/// One named strategy in an extractor's ordered pipeline.
pub type Matcher<E, T> = (&'static str, fn(&E, &str) -> Option<ExtractionMatch<T>>);

/// Run `matchers` in order and return the first hit, tagged with its name.
pub fn first_match<E, T: std::fmt::Debug>(
    extractor: &E,
    text: &str,
    matchers: &[Matcher<E, T>],
) -> Option<ExtractionMatch<T>> {
    matchers.iter().find_map(|&(name, matcher)| {
        let found = matcher(extractor, text)?.with_matcher(name);
        debug!(matcher = name, value = ?found.value, "field matched");
        Some(found)
    })
}

/// A field value that was either parsed from text or filled by a named default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    /// Parsed from the message.
    Parsed(ExtractionMatch<T>),
    /// Nothing parsed; the fallback value was applied.
    Defaulted(T),
}

impl<T> Resolved<T> {
    pub fn value(&self) -> &T {
        match self {
            Resolved::Parsed(found) => &found.value,
            Resolved::Defaulted(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Resolved::Parsed(found) => found.value,
            Resolved::Defaulted(value) => value,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Resolved::Defaulted(_))
    }
}

/// True when the answer is a plain "no" (or "none", "nope", "nothing", "n/a").
///
/// Keywords match whole words, so "Thanks, noted" is not a no.
pub fn is_negative_answer(text: &str) -> bool {
    NEGATIVE_ANSWER.is_match(text)
}

/// True when the user signals they have no more line items to add.
pub fn is_done_adding(text: &str) -> bool {
    DONE_ADDING.is_match(text)
}
