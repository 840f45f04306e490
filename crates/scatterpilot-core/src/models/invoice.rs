//! Invoice data models: collected conversation fields, the finalized invoice
//! record, and its wire representation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::rules::amounts::{format_amount, format_quantity};

/// Description used when an item's text carries nothing but numbers.
pub const DEFAULT_ITEM_DESCRIPTION: &str = "Service/Product";

/// A single billable entry collected during the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service description (never empty).
    pub description: String,

    /// Quantity (positive).
    pub quantity: Decimal,

    /// Price per unit, rounded to cents.
    pub unit_price: Decimal,
}

impl LineItem {
    /// Create a line item, substituting the default description for blank text
    /// and rounding the unit price to two decimals.
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        let description = description.into();
        let description = if description.trim().is_empty() {
            DEFAULT_ITEM_DESCRIPTION.to_string()
        } else {
            description.trim().to_string()
        };

        Self {
            description,
            quantity,
            unit_price: crate::invoice::rules::amounts::round_cents(unit_price),
        }
    }

    /// Like [`new`](Self::new), but `None` when `quantity × unit_price` does
    /// not fit in a `Decimal`.
    pub fn try_new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Option<Self> {
        let item = Self::new(description, quantity, unit_price);
        item.checked_amount().map(|_| item)
    }

    /// Unrounded `quantity × unit_price`, `None` on overflow.
    pub fn checked_amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }

    /// Unrounded `quantity × unit_price`, saturating at the `Decimal` bounds.
    pub fn amount(&self) -> Decimal {
        self.quantity.saturating_mul(self.unit_price)
    }

    /// Line total rounded to cents.
    pub fn total(&self) -> Decimal {
        crate::invoice::rules::amounts::round_cents(self.amount())
    }
}

/// Fields accumulated over one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedData {
    pub customer_name: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    /// Insertion order is addition order.
    pub line_items: Vec<LineItem>,
    /// Fraction, e.g. 0.08 for 8%.
    pub tax_rate: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub notes: Option<String>,
}

impl CollectedData {
    /// Check if nothing has been collected yet.
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.invoice_date.is_none()
            && self.due_date.is_none()
            && self.line_items.is_empty()
            && self.tax_rate.is_none()
            && self.discount.is_none()
            && self.notes.is_none()
    }

    /// Sum of unrounded line amounts, `None` on overflow.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.line_items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.checked_amount()?))
    }

    /// Append `item` unless the subtotal would overflow. Returns whether it was
    /// added.
    pub fn push_item(&mut self, item: LineItem) -> bool {
        let fits = self
            .subtotal()
            .zip(item.checked_amount())
            .is_some_and(|(subtotal, amount)| subtotal.checked_add(amount).is_some());
        if fits {
            self.line_items.push(item);
        }
        fits
    }

    /// Totals for the collected items at `tax_rate` and `discount`.
    pub fn totals(&self, tax_rate: Decimal, discount: Decimal) -> Option<Totals> {
        Totals::compute(self.subtotal()?, tax_rate, discount)
    }
}

/// Derived invoice amounts, all unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// `tax_amount = subtotal × tax_rate`, `total = subtotal − discount + tax_amount`.
    ///
    /// `None` when any amount overflows a `Decimal`.
    pub fn compute(subtotal: Decimal, tax_rate: Decimal, discount: Decimal) -> Option<Self> {
        let tax_amount = subtotal.checked_mul(tax_rate)?;
        let total = subtotal.checked_add(tax_amount)?.checked_sub(discount)?;
        Some(Self {
            subtotal,
            tax_amount,
            total,
        })
    }
}

/// The finalized invoice. Built once when the conversation completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub customer_name: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,

    /// Short demo identifier. Collisions are unlikely within one session but
    /// nothing guarantees global uniqueness.
    pub invoice_number: String,

    pub line_items: Vec<LineItem>,
    pub tax_rate: Decimal,
    pub discount: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Σ quantity × unit price, unrounded.
    pub subtotal: Decimal,
    /// subtotal × tax rate, unrounded.
    pub tax_amount: Decimal,
    /// subtotal − discount + tax amount. May be negative; see `validate`.
    pub total: Decimal,
}

impl InvoiceRecord {
    /// Validate the invoice and return any issues found.
    ///
    /// Issues are advisory: the conversation still completes.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.customer_name.trim().is_empty() {
            issues.push("Missing customer name".to_string());
        }

        if self.line_items.is_empty() {
            issues.push("No line items".to_string());
        }

        if self.due_date < self.invoice_date {
            issues.push(format!(
                "Due date ({}) is before invoice date ({})",
                self.due_date, self.invoice_date
            ));
        }

        for (i, item) in self.line_items.iter().enumerate() {
            if item.quantity <= Decimal::ZERO {
                issues.push(format!("Line item {} has non-positive quantity", i + 1));
            }
            if item.unit_price < Decimal::ZERO {
                issues.push(format!("Line item {} has negative unit price", i + 1));
            }
        }

        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            issues.push(format!("Tax rate {} is outside 0..1", self.tax_rate));
        }

        if self.total < Decimal::ZERO {
            issues.push(format!(
                "Discount ({}) exceeds subtotal plus tax; total is negative",
                format_amount(self.discount)
            ));
        }

        issues
    }

    /// Wire representation with every amount as fixed two-decimal text.
    pub fn to_data(&self) -> InvoiceData {
        InvoiceData {
            customer_name: self.customer_name.clone(),
            customer_email: None,
            customer_address: None,
            invoice_date: self.invoice_date.format("%Y-%m-%d").to_string(),
            due_date: self.due_date.format("%Y-%m-%d").to_string(),
            invoice_number: self.invoice_number.clone(),
            line_items: self
                .line_items
                .iter()
                .map(|item| LineItemData {
                    description: item.description.clone(),
                    quantity: format_quantity(item.quantity),
                    unit_price: format_amount(item.unit_price),
                    total: format_amount(item.total()),
                })
                .collect(),
            tax_rate: format_amount(self.tax_rate),
            discount: format_amount(self.discount),
            notes: self.notes.clone(),
            subtotal: format_amount(self.subtotal),
            tax_amount: format_amount(self.tax_amount),
            total: format_amount(self.total),
        }
    }

    /// Full `create_invoice` payload for the response.
    pub fn to_payload(&self) -> InvoicePayload {
        InvoicePayload {
            action: InvoiceAction::CreateInvoice,
            data: self.to_data(),
        }
    }
}

/// Action tag carried by the invoice payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceAction {
    CreateInvoice,
}

/// `{ action, data }` envelope returned when an invoice is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePayload {
    pub action: InvoiceAction,
    pub data: InvoiceData,
}

/// Invoice as emitted to callers. Numeric fields are text so downstream
/// renderers never see floating-point artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceData {
    pub customer_name: String,
    /// Never collected by the dialogue; always null.
    pub customer_email: Option<String>,
    /// Never collected by the dialogue; always null.
    pub customer_address: Option<String>,
    pub invoice_date: String,
    pub due_date: String,
    pub invoice_number: String,
    pub line_items: Vec<LineItemData>,
    pub tax_rate: String,
    pub discount: String,
    pub notes: Option<String>,
    pub subtotal: String,
    pub tax_amount: String,
    pub total: String,
}

/// Line item as emitted to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemData {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(items: Vec<LineItem>, tax_rate: &str, discount: &str) -> InvoiceRecord {
        let subtotal: Decimal = items.iter().map(LineItem::amount).sum();
        let tax_amount = subtotal * dec(tax_rate);
        InvoiceRecord {
            customer_name: "Acme Corp".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            invoice_number: "INV-000001".to_string(),
            line_items: items,
            tax_rate: dec(tax_rate),
            discount: dec(discount),
            notes: None,
            subtotal,
            tax_amount,
            total: subtotal - dec(discount) + tax_amount,
        }
    }

    #[test]
    fn test_line_item_defaults_description() {
        let item = LineItem::new("   ", dec("2"), dec("10"));
        assert_eq!(item.description, DEFAULT_ITEM_DESCRIPTION);
        assert_eq!(item.unit_price, dec("10.00"));
    }

    #[test]
    fn test_line_item_total_rounds_to_cents() {
        let item = LineItem::new("widget", dec("3"), dec("3.333"));
        assert_eq!(item.unit_price, dec("3.33"));
        assert_eq!(item.total(), dec("9.99"));
    }

    #[test]
    fn test_to_data_formats_amounts() {
        let invoice = record(
            vec![
                LineItem::new("cameras", dec("10"), dec("125")),
                LineItem::new("tripods", dec("1.5"), dec("20")),
            ],
            "0.08",
            "50",
        );

        let data = invoice.to_data();
        assert_eq!(data.invoice_date, "2025-01-01");
        assert_eq!(data.line_items[0].quantity, "10");
        assert_eq!(data.line_items[0].unit_price, "125.00");
        assert_eq!(data.line_items[0].total, "1250.00");
        assert_eq!(data.line_items[1].quantity, "1.5");
        assert_eq!(data.subtotal, "1280.00");
        assert_eq!(data.tax_amount, "102.40");
        assert_eq!(data.discount, "50.00");
        assert_eq!(data.total, "1332.40");
        assert_eq!(data.customer_email, None);
    }

    #[test]
    fn test_payload_serializes_action_tag() {
        let invoice = record(vec![LineItem::new("x", dec("1"), dec("1"))], "0", "0");
        let json = serde_json::to_value(invoice.to_payload()).unwrap();
        assert_eq!(json["action"], "create_invoice");
        assert_eq!(json["data"]["customer_address"], serde_json::Value::Null);
        assert_eq!(json["data"]["total"], "1.00");
    }

    #[test]
    fn test_validate_flags_negative_total() {
        let invoice = record(vec![LineItem::new("x", dec("1"), dec("10"))], "0", "25");
        let issues = invoice.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("negative"));
    }

    #[test]
    fn test_validate_flags_due_before_invoice_date() {
        let mut invoice = record(vec![LineItem::new("x", dec("1"), dec("10"))], "0", "0");
        invoice.due_date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert!(invoice.validate().iter().any(|i| i.contains("before invoice date")));
    }

    #[test]
    fn test_collected_data_subtotal_is_unrounded() {
        let data = CollectedData {
            line_items: vec![
                LineItem::new("a", dec("0.5"), dec("0.01")),
                LineItem::new("b", dec("0.5"), dec("0.01")),
            ],
            ..Default::default()
        };
        assert_eq!(data.subtotal(), Some(dec("0.0100")));
    }

    #[test]
    fn test_try_new_rejects_overflowing_amount() {
        let huge = dec("99999999999999999999");
        assert!(LineItem::try_new("widgets", huge, huge).is_none());
        assert!(LineItem::try_new("widgets", dec("2"), dec("10")).is_some());
    }

    #[test]
    fn test_push_item_keeps_subtotal_in_range() {
        let mut data = CollectedData::default();
        let big = dec("50000000000000000000000000000");

        assert!(data.push_item(LineItem::new("first", Decimal::ONE, big)));
        assert!(!data.push_item(LineItem::new("second", Decimal::ONE, big)));
        assert_eq!(data.line_items.len(), 1);
        assert_eq!(data.subtotal(), Some(big));
    }

    #[test]
    fn test_totals_overflow_is_none() {
        let big = dec("50000000000000000000000000000");
        assert!(Totals::compute(big, dec("2"), Decimal::ZERO).is_none());

        let totals = Totals::compute(dec("6050"), dec("0.08"), dec("50")).unwrap();
        assert_eq!(totals.tax_amount, dec("484"));
        assert_eq!(totals.total, dec("6484"));
    }
}
