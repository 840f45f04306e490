//! Turns the fields collected over a conversation into a finalized invoice.

use chrono::NaiveDate;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::invoice::rules::dates::{default_due_date, default_invoice_date};
use crate::invoice::rules::format_amount;
use crate::models::invoice::{CollectedData, InvoiceRecord};

/// Builds [`InvoiceRecord`]s from collected conversation data.
///
/// Missing optional fields fall back to the same defaults the dialogue uses:
/// today for the invoice date, `default_due_days` later for the due date, and
/// zero tax and discount.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceAssembler {
    today: NaiveDate,
    default_due_days: u32,
}

impl InvoiceAssembler {
    pub fn new(today: NaiveDate, default_due_days: u32) -> Self {
        Self {
            today,
            default_due_days,
        }
    }

    /// Assemble the invoice and compute its totals.
    ///
    /// `subtotal` sums the unrounded line amounts; rounding happens only when
    /// the record is formatted. `None` when an amount overflows a `Decimal`.
    pub fn assemble(
        &self,
        data: &CollectedData,
        invoice_number: impl Into<String>,
    ) -> Option<InvoiceRecord> {
        let invoice_date = data
            .invoice_date
            .unwrap_or_else(|| default_invoice_date(self.today));
        let due_date = data.due_date.unwrap_or_else(|| {
            default_due_date(self.today, Some(invoice_date), self.default_due_days)
        });

        let tax_rate = data.tax_rate.unwrap_or(Decimal::ZERO);
        let discount = data.discount.unwrap_or(Decimal::ZERO);

        let Some(totals) = data.totals(tax_rate, discount) else {
            warn!(items = data.line_items.len(), "invoice totals overflow");
            return None;
        };

        let record = InvoiceRecord {
            customer_name: data.customer_name.clone().unwrap_or_default(),
            invoice_date,
            due_date,
            invoice_number: invoice_number.into(),
            line_items: data.line_items.clone(),
            tax_rate,
            discount,
            notes: data.notes.clone(),
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total: totals.total,
        };

        info!(
            invoice_number = %record.invoice_number,
            items = record.line_items.len(),
            total = %format_amount(record.total),
            "invoice assembled"
        );

        for issue in record.validate() {
            warn!(invoice_number = %record.invoice_number, "{}", issue);
        }

        Some(record)
    }
}

/// Short demo invoice number, `INV-` followed by six random digits.
///
/// Not globally unique; fine for a demo session, not for real bookkeeping.
pub fn generate_invoice_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("INV-{:06}", rng.gen_range(0..1_000_000u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::LineItem;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn collected() -> CollectedData {
        CollectedData {
            customer_name: Some("Acme Corp".to_string()),
            invoice_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            due_date: NaiveDate::from_ymd_opt(2025, 12, 31),
            line_items: vec![
                LineItem::new("cameras", dec("10"), dec("125")),
                LineItem::new("hours", dec("40"), dec("150")),
            ],
            tax_rate: Some(dec("0.08")),
            discount: Some(dec("50")),
            notes: Some("Thanks!".to_string()),
        }
    }

    #[test]
    fn test_assemble_computes_totals() {
        let record = InvoiceAssembler::new(today(), 30)
            .assemble(&collected(), "INV-123456")
            .unwrap();
        let data = record.to_data();

        assert_eq!(data.subtotal, "7250.00");
        assert_eq!(data.tax_amount, "580.00");
        assert_eq!(data.discount, "50.00");
        assert_eq!(data.total, "7780.00");
        assert_eq!(data.tax_rate, "0.08");
        assert_eq!(data.notes.as_deref(), Some("Thanks!"));
        assert!(record.validate().is_empty());
    }

    #[test]
    fn test_assemble_rounds_only_when_formatting() {
        let mut data = collected();
        data.line_items = vec![LineItem::new("tiny", dec("0.5"), dec("0.01"))];
        data.tax_rate = Some(dec("0.5"));
        data.discount = None;

        let record = InvoiceAssembler::new(today(), 30)
            .assemble(&data, "INV-000001")
            .unwrap();
        assert_eq!(record.subtotal, dec("0.005"));
        assert_eq!(record.tax_amount, dec("0.0025"));
        assert_eq!(record.to_data().total, "0.01");
    }

    #[test]
    fn test_assemble_defaults_missing_fields() {
        let data = CollectedData {
            customer_name: Some("Globex".to_string()),
            line_items: vec![LineItem::new("widget", dec("1"), dec("9.99"))],
            ..Default::default()
        };

        let record = InvoiceAssembler::new(today(), 30)
            .assemble(&data, "INV-000002")
            .unwrap();
        assert_eq!(record.invoice_date, today());
        assert_eq!(record.due_date, NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
        assert_eq!(record.tax_rate, Decimal::ZERO);
        assert_eq!(record.to_data().discount, "0.00");
        assert_eq!(record.to_data().total, "9.99");
    }

    #[test]
    fn test_assemble_allows_negative_total() {
        let mut data = collected();
        data.discount = Some(dec("100000"));

        let record = InvoiceAssembler::new(today(), 30)
            .assemble(&data, "INV-000003")
            .unwrap();
        assert!(record.total < Decimal::ZERO);
        assert_eq!(record.validate().len(), 1);
    }

    #[test]
    fn test_assemble_overflowing_totals_is_none() {
        let mut data = collected();
        let price = dec("50000000000000000000000000000");
        data.line_items = vec![LineItem::new("yacht", Decimal::ONE, price)];
        data.tax_rate = Some(dec("0.8"));

        assert!(InvoiceAssembler::new(today(), 30).assemble(&data, "INV-000004").is_none());
    }

    #[test]
    fn test_invoice_number_format() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let number = generate_invoice_number(&mut rng);
            assert_eq!(number.len(), 10);
            assert!(number.starts_with("INV-"));
            assert!(number[4..].chars().all(|c| c.is_ascii_digit()));
        }
    }
}
