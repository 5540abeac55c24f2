//! Billing summaries and the two PDF layouts built from week buckets.
//!
//! Everything in here is pure: the builders take already-fetched entries and
//! return data or drawing instructions, leaving I/O to the handlers.

pub mod billing;
pub mod hours_log;
pub mod invoice;
pub mod layout;

pub use billing::{build_billing_summary, BillingLineItem, BillingSummary};
pub use hours_log::build_hours_log_instructions;
pub use invoice::build_invoice_instructions;
pub use layout::{wrap_text, DrawInstruction, Font, StandardFonts, TextMeasurer};
