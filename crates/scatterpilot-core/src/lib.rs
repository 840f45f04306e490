//! Core library for ScatterPilot conversational invoice drafting.
//!
//! This crate provides:
//! - Rule-based extraction of invoice fields from chat messages
//!   (customer name, dates, line items, tax rate, discount)
//! - A stage-based slot-filling dialogue engine
//! - Invoice assembly with exact decimal totals
//! - An in-memory conversation store keyed by conversation id

pub mod clock;
pub mod dialogue;
pub mod error;
pub mod invoice;
pub mod models;
pub mod session;

pub use clock::{Clock, FixedClock, SystemClock};
pub use dialogue::{ConversationState, DelayPolicy, DialogueEngine, Stage};
pub use error::{RequestError, Result, ScatterError};
pub use invoice::{InvoiceAssembler, generate_invoice_number};
pub use models::config::ScatterConfig;
pub use models::invoice::{
    CollectedData, InvoiceData, InvoicePayload, InvoiceRecord, LineItem, LineItemData,
};
pub use models::message::{ChatRequest, ChatResponse, Role, Turn};
pub use session::{ConversationStore, validate_message};
