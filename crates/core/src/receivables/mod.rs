//! Accounts receivable.
//!
//! Invoices are settled by append-only payments. Invoice status is derived
//! from the paid amount, except for the explicit `void` override. Aging and
//! summary projections are computed from outstanding balances.

pub mod aging;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use aging::{AgingBand, AgingBucket, AgingReport, InvoiceSummary};
pub use error::{LedgerPostingError, ReceivableError};
pub use service::{DEFAULT_PAYMENT_TOLERANCE, ReceivableService};
pub use types::{
    Invoice, InvoiceFilter, InvoiceStatus, NewInvoice, NewPayment, Payment, PaymentMethod,
};
