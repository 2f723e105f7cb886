//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::ar_invoices::Entity as ArInvoices;
pub use super::ar_payments::Entity as ArPayments;
pub use super::journal_entries::Entity as JournalEntries;
pub use super::journal_lines::Entity as JournalLines;
