//! Data models for conversations, invoices, and configuration.

pub mod config;
pub mod invoice;
pub mod message;
