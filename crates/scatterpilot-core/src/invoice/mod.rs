//! Invoice field extraction and assembly.

mod assembler;
pub mod rules;

pub use assembler::{InvoiceAssembler, generate_invoice_number};
