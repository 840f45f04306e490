//! Per-conversation dialogue engine.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::invoice::rules::amounts::{resolve_discount, resolve_tax_rate};
use crate::invoice::rules::dates::{resolve_due_date, resolve_invoice_date};
use crate::invoice::rules::names::resolve_customer_name;
use crate::invoice::rules::{
    FieldExtractor, LineItemExtractor, Resolved, extract_customer_name, extract_dates,
    extract_line_items, format_amount, is_done_adding, is_negative_answer,
};
use crate::invoice::{InvoiceAssembler, generate_invoice_number};
use crate::models::config::DialogueConfig;
use crate::models::invoice::{CollectedData, InvoiceRecord, LineItem};
use crate::models::message::{ChatResponse, Turn};

use super::{Stage, prompts};

/// Days from invoice date to the default due date.
pub const DEFAULT_DUE_DAYS: u32 = 30;

/// Everything the engine knows about one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Assigned at creation, never changed.
    pub conversation_id: String,
    pub stage: Stage,
    pub collected: CollectedData,
    /// User and assistant turns in order.
    pub transcript: Vec<Turn>,
    /// Set once the conversation reaches [`Stage::Complete`].
    pub invoice: Option<InvoiceRecord>,
}

impl ConversationState {
    /// Fresh state with a new random identifier.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            stage: Stage::Initial,
            collected: CollectedData::default(),
            transcript: Vec::new(),
            invoice: None,
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of handling one message at one stage.
struct Outcome {
    next: Stage,
    message: String,
    invoice: Option<InvoiceRecord>,
}

impl Outcome {
    fn to(next: Stage, message: impl Into<String>) -> Self {
        Self {
            next,
            message: message.into(),
            invoice: None,
        }
    }
}

/// Drives one slot-filling conversation.
///
/// Each call to [`process_message`](Self::process_message) runs to completion
/// and mutates the state; callers serialize access per conversation.
#[derive(Clone)]
pub struct DialogueEngine {
    state: ConversationState,
    clock: Arc<dyn Clock>,
    default_due_days: u32,
}

impl DialogueEngine {
    /// Engine reading dates from the local system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: ConversationState::new(),
            clock,
            default_due_days: DEFAULT_DUE_DAYS,
        }
    }

    pub fn from_config(config: &DialogueConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(clock).with_default_due_days(config.default_due_days)
    }

    /// Replace the state with a fresh conversation under `conversation_id`.
    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.state = ConversationState::with_id(conversation_id);
        self
    }

    pub fn with_default_due_days(mut self, days: u32) -> Self {
        self.default_due_days = days;
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn conversation_id(&self) -> &str {
        &self.state.conversation_id
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.state.transcript
    }

    /// Discard all state and start a new conversation. Returns the new id.
    pub fn reset(&mut self) -> &str {
        let previous = std::mem::take(&mut self.state);
        info!(
            previous = %previous.conversation_id,
            conversation_id = %self.state.conversation_id,
            "conversation reset"
        );
        &self.state.conversation_id
    }

    /// Handle one user message and produce the reply.
    ///
    /// Unparseable answers never fail: they either re-prompt without changing
    /// anything or fall back to a default value.
    pub fn process_message(&mut self, text: &str) -> ChatResponse {
        let current = self.state.stage;
        self.state.transcript.push(Turn::user(text));

        let outcome = if text.trim().is_empty() && !current.is_complete() {
            Outcome::to(
                current,
                format!("{} {}", prompts::EMPTY_MESSAGE, prompts::ask(current)),
            )
        } else {
            match current {
                Stage::Initial => self.on_opening(text),
                Stage::AwaitName => self.on_name(text),
                Stage::AwaitInvoiceDate => self.on_invoice_date(text),
                Stage::AwaitDueDate => self.on_due_date(text),
                Stage::AwaitFirstItem => self.on_first_item(text),
                Stage::AwaitMoreItems => self.on_more_items(text),
                Stage::AwaitTax => self.on_tax(text),
                Stage::AwaitDiscount => self.on_discount(text),
                Stage::AwaitNotesAndFinalize => self.on_notes(text),
                Stage::Complete => Outcome::to(Stage::Complete, prompts::ask(Stage::Complete)),
            }
        };

        if outcome.next != current {
            info!(
                conversation_id = %self.state.conversation_id,
                from = %current,
                to = %outcome.next,
                "stage transition"
            );
        }

        self.state.stage = outcome.next;
        self.state.transcript.push(Turn::assistant(outcome.message.clone()));

        let invoice_data = outcome.invoice.as_ref().map(InvoiceRecord::to_payload);
        if outcome.invoice.is_some() {
            self.state.invoice = outcome.invoice;
        }

        ChatResponse {
            conversation_id: self.state.conversation_id.clone(),
            message: outcome.message,
            invoice_ready: invoice_data.is_some(),
            invoice_data,
        }
    }

    /// Free-form first message: pull out whatever fields it carries.
    fn on_opening(&mut self, text: &str) -> Outcome {
        let data = &mut self.state.collected;

        data.customer_name = extract_customer_name(text).map(|found| found.value);
        let dates = extract_dates(text);
        data.invoice_date = dates.invoice_date.map(|found| found.value);
        data.due_date = dates.due_date.map(|found| found.value);
        data.line_items.clear();
        for item in extract_line_items(text) {
            let description = item.description.clone();
            if !data.push_item(item) {
                debug!(%description, "opening item dropped: subtotal overflow");
            }
        }

        debug!(
            customer = ?data.customer_name,
            invoice_date = ?data.invoice_date,
            due_date = ?data.due_date,
            items = data.line_items.len(),
            "opening message extracted"
        );

        let next = Stage::first_missing(data);
        let message = match prompts::recap(data) {
            Some(recap) => format!("{}\n\n{}", recap, prompts::ask(next)),
            None => format!("{} {}", prompts::NOTHING_EXTRACTED, prompts::ask(next)),
        };
        Outcome::to(next, message)
    }

    fn on_name(&mut self, text: &str) -> Outcome {
        let name = resolve_customer_name(text).into_value();
        let ack = format!("Got it, this invoice is for {}.", name);
        self.state.collected.customer_name = Some(name);
        Self::advance_to(Stage::AwaitInvoiceDate, ack)
    }

    fn on_invoice_date(&mut self, text: &str) -> Outcome {
        let resolved = resolve_invoice_date(text, self.clock.today());
        let ack = date_ack("invoice date", &resolved);
        self.state.collected.invoice_date = Some(resolved.into_value());
        Self::advance_to(Stage::AwaitDueDate, ack)
    }

    fn on_due_date(&mut self, text: &str) -> Outcome {
        let resolved = resolve_due_date(
            text,
            self.clock.today(),
            self.state.collected.invoice_date,
            self.default_due_days,
        );
        let ack = date_ack("due date", &resolved);
        self.state.collected.due_date = Some(resolved.into_value());
        self.state.collected.line_items.clear();
        Self::advance_to(Stage::AwaitFirstItem, ack)
    }

    fn on_first_item(&mut self, text: &str) -> Outcome {
        match LineItemExtractor::new().extract(text) {
            Some(found) => self.add_item(found.value, Stage::AwaitFirstItem),
            None => Outcome::to(Stage::AwaitFirstItem, prompts::ITEM_RETRY),
        }
    }

    fn on_more_items(&mut self, text: &str) -> Outcome {
        if is_done_adding(text) {
            let count = self.state.collected.line_items.len();
            let message = format!(
                "Great, {} item{} on the invoice. {}",
                count,
                if count == 1 { "" } else { "s" },
                prompts::ask(Stage::AwaitTax)
            );
            return Outcome::to(Stage::AwaitTax, message);
        }

        match LineItemExtractor::new().extract(text) {
            Some(found) => self.add_item(found.value, Stage::AwaitMoreItems),
            None => Outcome::to(Stage::AwaitMoreItems, prompts::MORE_ITEMS_RETRY),
        }
    }

    /// Append an extracted item, or stay at `current` if the subtotal would
    /// overflow.
    fn add_item(&mut self, item: LineItem, current: Stage) -> Outcome {
        let added = prompts::item_added(&item);
        if !self.state.collected.push_item(item) {
            return Outcome::to(
                current,
                format!("{} {}", prompts::AMOUNT_TOO_LARGE, prompts::ask(current)),
            );
        }
        Outcome::to(
            Stage::AwaitMoreItems,
            format!("{} {}", added, prompts::ask(Stage::AwaitMoreItems)),
        )
    }

    fn on_tax(&mut self, text: &str) -> Outcome {
        let resolved = resolve_tax_rate(text);
        if self.state.collected.totals(*resolved.value(), Decimal::ZERO).is_none() {
            return Outcome::to(
                Stage::AwaitTax,
                format!("{} {}", prompts::AMOUNT_TOO_LARGE, prompts::ask(Stage::AwaitTax)),
            );
        }
        let ack = if resolved.is_default() {
            "No tax rate found, so no tax will be applied.".to_string()
        } else {
            format!("Tax rate set to {}.", format_amount(*resolved.value()))
        };
        self.state.collected.tax_rate = Some(resolved.into_value());
        Outcome::to(
            Stage::AwaitDiscount,
            format!("{} {}", ack, prompts::ask(Stage::AwaitDiscount)),
        )
    }

    fn on_discount(&mut self, text: &str) -> Outcome {
        let discount = resolve_discount(text).into_value();
        let tax_rate = self.state.collected.tax_rate.unwrap_or(Decimal::ZERO);
        if self.state.collected.totals(tax_rate, discount).is_none() {
            return Outcome::to(
                Stage::AwaitDiscount,
                format!("{} {}", prompts::AMOUNT_TOO_LARGE, prompts::ask(Stage::AwaitDiscount)),
            );
        }
        let ack = if discount == Decimal::ZERO {
            "No discount.".to_string()
        } else {
            format!("Discount of {} applied.", prompts::money(discount))
        };
        self.state.collected.discount = Some(discount);
        Outcome::to(
            Stage::AwaitNotesAndFinalize,
            format!("{} {}", ack, prompts::ask(Stage::AwaitNotesAndFinalize)),
        )
    }

    fn on_notes(&mut self, text: &str) -> Outcome {
        if !is_negative_answer(text) {
            self.state.collected.notes = Some(text.trim().to_string());
        }

        let invoice_number = generate_invoice_number(&mut rand::thread_rng());
        let Some(record) = InvoiceAssembler::new(self.clock.today(), self.default_due_days)
            .assemble(&self.state.collected, invoice_number)
        else {
            return Outcome::to(Stage::AwaitNotesAndFinalize, prompts::TOTALS_TOO_LARGE);
        };

        info!(
            conversation_id = %self.state.conversation_id,
            invoice_number = %record.invoice_number,
            "invoice finalized"
        );

        Outcome {
            next: Stage::Complete,
            message: prompts::confirmation(&record),
            invoice: Some(record),
        }
    }

    /// Acknowledge a single-field answer and ask for the field at `next`.
    fn advance_to(next: Stage, ack: String) -> Outcome {
        Outcome::to(next, format!("{} {}", ack, prompts::ask(next)))
    }
}

impl Default for DialogueEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DialogueEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueEngine")
            .field("state", &self.state)
            .field("default_due_days", &self.default_due_days)
            .finish_non_exhaustive()
    }
}

fn date_ack(field: &str, resolved: &Resolved<chrono::NaiveDate>) -> String {
    let date = prompts::date(*resolved.value());
    if resolved.is_default() {
        format!("I couldn't find a date there, so the {} will be {}.", field, date)
    } else {
        format!("The {} is {}.", field, date)
    }
}
