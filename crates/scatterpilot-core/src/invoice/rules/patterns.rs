//! Common regex patterns for chat-message field extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Price or quantity: `1,500.50`, `1500`, `12.5`.
macro_rules! number {
    () => {
        r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)"
    };
}

lazy_static! {
    // Customer name, single-field answers
    pub static ref NAME_LABELED: Regex = Regex::new(
        r"(?i)\b(?:(?:customer\s+|client\s+)?name\s+is|customer|client|for)\b(?:\s+is)?[\s:]+([^.,\n]+?)\s*(?:[.,\n]|$)"
    ).unwrap();

    pub static ref NAME_LEADING: Regex = Regex::new(
        r"^([A-Z][^.\n]*?)\s*(?:\.|$)"
    ).unwrap();

    pub static ref NAME_CAPITALIZED: Regex = Regex::new(
        r"\b([A-Z][A-Za-z&'\-]*(?:\s+[A-Z][A-Za-z&'\-]*)*)"
    ).unwrap();

    // Customer name inside a free-form opening message
    pub static ref OPENING_NAME_INVOICE: Regex = Regex::new(
        r"(?i:\binvoice|\bbill)\s+([A-Z][A-Za-z&'.\- ]*?)\s*(?:\$|\b(?:for|due|dated|on)\b|\d|,|$)"
    ).unwrap();

    pub static ref OPENING_NAME_CUSTOMER: Regex = Regex::new(
        r"(?i:\bcustomer|\bclient|\bfor)\s+([A-Z][A-Za-z&'.\- ]*?)\s*(?:\$|\b(?:for|due|dated|on)\b|\d|,|$)"
    ).unwrap();

    // Dates. Numeric dates are month-first.
    pub static ref TODAY: Regex = Regex::new(
        r"(?i)\btoday\b"
    ).unwrap();

    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[/\-](\d{1,2})[/\-](\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_NAMED: Regex = Regex::new(
        r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"
    ).unwrap();

    pub static ref RELATIVE_DAYS: Regex = Regex::new(
        r"(?i)\b(\d+)\s+days?\b(?:\s+from\s+now)?"
    ).unwrap();

    // Line items, single-item answers
    pub static ref ITEM_AT_PRICE: Regex = Regex::new(concat!(
        r"(?i)\b(\d+(?:\.\d+)?)\s*(?:([a-z][a-z\s\-]*?)\s*)?(?:\bat\b|@|\bfor\b)\s*\$?\s*",
        number!()
    )).unwrap();

    pub static ref ITEM_TIMES: Regex = Regex::new(concat!(
        r"(?i)\b(\d+(?:\.\d+)?)\s*(?:x|×|\*)\s*\$?\s*",
        number!()
    )).unwrap();

    pub static ref ITEM_LABELED: Regex = Regex::new(concat!(
        r"(?is)\b(?:qty|quantity):?\s*(\d+(?:\.\d+)?).*?\bprice:?\s*\$?\s*",
        number!()
    )).unwrap();

    pub static ref NUMBER_TOKEN: Regex = Regex::new(
        number!()
    ).unwrap();

    // Line items inside a free-form opening message
    pub static ref OPENING_QTY_ITEM: Regex = Regex::new(concat!(
        r"(?i)\b(\d+(?:\.\d+)?)\s+([a-z][a-z\s\-]*?)\s+(?:at|@)\s*\$?\s*",
        number!()
    )).unwrap();

    pub static ref OPENING_ITEM_PRICE: Regex = Regex::new(concat!(
        r"(?i)\b([a-z][a-z\s\-]*?)\s+(?:at|for)\s+\$\s*",
        number!()
    )).unwrap();

    // Tax and discount
    pub static ref TAX_RATE: Regex = Regex::new(
        r"(\d+(?:\.\d+)?|\.\d+)\s*%?"
    ).unwrap();

    pub static ref DISCOUNT_AMOUNT: Regex = Regex::new(concat!(
        r"\$?\s*",
        number!()
    )).unwrap();

    // Yes/no style answers
    pub static ref NEGATIVE_ANSWER: Regex = Regex::new(
        r"(?i)\b(?:no|none|nope|nothing)\b|\bn/a\b"
    ).unwrap();

    pub static ref DONE_ADDING: Regex = Regex::new(
        r"(?i)\b(?:no|done|continue|next)\b|\bthat'?s\s+(?:it|all)\b"
    ).unwrap();

    // Content never accepted in a chat message
    pub static ref UNSAFE_CONTENT: Vec<Regex> = vec![
        Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
        Regex::new(r"(?i)\bon[a-z]+\s*=").unwrap(),
        Regex::new(r"(?i)\beval\s*\(").unwrap(),
        Regex::new(r"(?i)\bexpression\s*\(").unwrap(),
        Regex::new(r"(?i)<(?:iframe|embed|object)[^>]*>").unwrap(),
    ];
}

/// Words that, directly before a date, mark it as the invoice date.
pub const INVOICE_DATE_CUES: &[&str] = &["performed", "dated", "on"];

/// Word that, shortly before a date, marks it as the due date.
pub const DUE_DATE_CUE: &str = "due";
