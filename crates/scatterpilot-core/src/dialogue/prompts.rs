//! Reply templates.

use chrono::NaiveDate;

use crate::invoice::rules::{format_amount, format_quantity};
use crate::models::invoice::{CollectedData, InvoiceRecord, LineItem};

use super::Stage;

pub(crate) const ITEM_RETRY: &str = "I couldn't find a quantity and price in that. \
     Try something like \"10 hours at $150\" or \"Logo design, qty: 1, price: $500\".";

pub(crate) const MORE_ITEMS_RETRY: &str = "I couldn't read that as an item. \
     Describe another item like \"3 widgets at $20\", or say \"done\" to continue.";

pub(crate) const EMPTY_MESSAGE: &str = "I didn't catch that.";

pub(crate) const NOTHING_EXTRACTED: &str = "Let's create an invoice.";

pub(crate) const AMOUNT_TOO_LARGE: &str = "That amount is too large to add to this invoice.";

pub(crate) const TOTALS_TOO_LARGE: &str =
    "The amounts on this invoice are too large to total. Please start a new conversation.";

/// The question asked when the conversation reaches `stage`.
pub(crate) fn ask(stage: Stage) -> &'static str {
    match stage {
        Stage::Initial => "Tell me about the invoice: who it's for, the dates, and what you're billing.",
        Stage::AwaitName => "Who is this invoice for?",
        Stage::AwaitInvoiceDate => {
            "What's the invoice date? You can say \"today\" or give a date like 01/15/2025."
        }
        Stage::AwaitDueDate => {
            "When is payment due? Give a date like 02/15/2025 or say something like \"30 days\"."
        }
        Stage::AwaitFirstItem => {
            "What's the first line item? Include a quantity and price, e.g. \"10 hours at $150\"."
        }
        Stage::AwaitMoreItems => "Anything else to add? Describe another item, or say \"done\".",
        Stage::AwaitTax => "What tax rate should I apply? (e.g. 8% or 0.08)",
        Stage::AwaitDiscount => "Any discount? Give an amount like $50, or say \"no\".",
        Stage::AwaitNotesAndFinalize => "Any notes for the invoice? Say \"no\" to skip.",
        Stage::Complete => {
            "This invoice is already complete. Start a new conversation to create another one."
        }
    }
}

pub(crate) fn money(amount: rust_decimal::Decimal) -> String {
    format!("${}", format_amount(amount))
}

pub(crate) fn date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// "10 × cameras at $125.00"
pub(crate) fn item_line(item: &LineItem) -> String {
    format!(
        "{} × {} at {}",
        format_quantity(item.quantity),
        item.description,
        money(item.unit_price)
    )
}

pub(crate) fn item_added(item: &LineItem) -> String {
    format!("Added {} ({}).", item_line(item), money(item.total()))
}

/// Everything pulled out of an opening message, or `None` if nothing was.
pub(crate) fn recap(data: &CollectedData) -> Option<String> {
    if data.is_empty() {
        return None;
    }

    let mut lines = vec!["Here's what I have so far:".to_string()];
    if let Some(name) = &data.customer_name {
        lines.push(format!("- Customer: {}", name));
    }
    if let Some(invoice_date) = data.invoice_date {
        lines.push(format!("- Invoice date: {}", date(invoice_date)));
    }
    if let Some(due_date) = data.due_date {
        lines.push(format!("- Due date: {}", date(due_date)));
    }
    for item in &data.line_items {
        lines.push(format!("- Item: {}", item_line(item)));
    }

    Some(lines.join("\n"))
}

/// Final summary shown when the invoice is ready.
pub(crate) fn confirmation(record: &InvoiceRecord) -> String {
    format!(
        "Your invoice is ready!\n\
         Customer: {}\n\
         Invoice date: {}\n\
         Due date: {}\n\
         Items: {}\n\
         Subtotal: {}\n\
         Tax: {}\n\
         Total: {}",
        record.customer_name,
        date(record.invoice_date),
        date(record.due_date),
        record.line_items.len(),
        money(record.subtotal),
        money(record.tax_amount),
        money(record.total),
    )
}
