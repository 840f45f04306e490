//! Conversation stages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::invoice::CollectedData;

/// A point in the fixed slot-filling sequence.
///
/// Stages only move forward; `AwaitMoreItems` is the one stage that may repeat
/// while items are being added. `Complete` is entered once the invoice is built.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Initial,
    AwaitName,
    AwaitInvoiceDate,
    AwaitDueDate,
    AwaitFirstItem,
    AwaitMoreItems,
    AwaitTax,
    AwaitDiscount,
    AwaitNotesAndFinalize,
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Initial => "INITIAL",
            Stage::AwaitName => "AWAIT_NAME",
            Stage::AwaitInvoiceDate => "AWAIT_INVOICE_DATE",
            Stage::AwaitDueDate => "AWAIT_DUE_DATE",
            Stage::AwaitFirstItem => "AWAIT_FIRST_ITEM",
            Stage::AwaitMoreItems => "AWAIT_MORE_ITEMS",
            Stage::AwaitTax => "AWAIT_TAX",
            Stage::AwaitDiscount => "AWAIT_DISCOUNT",
            Stage::AwaitNotesAndFinalize => "AWAIT_NOTES_AND_FINALIZE",
            Stage::Complete => "COMPLETE",
        }
    }

    /// First stage whose field is still unset, in the order
    /// name → invoice date → due date → line items.
    ///
    /// With all four present the conversation continues at `AwaitMoreItems`.
    pub fn first_missing(data: &CollectedData) -> Stage {
        if data.customer_name.is_none() {
            Stage::AwaitName
        } else if data.invoice_date.is_none() {
            Stage::AwaitInvoiceDate
        } else if data.due_date.is_none() {
            Stage::AwaitDueDate
        } else if data.line_items.is_empty() {
            Stage::AwaitFirstItem
        } else {
            Stage::AwaitMoreItems
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Stage::Complete)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
