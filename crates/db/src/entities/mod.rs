//! `SeaORM` entities.
//!
//! Status and method columns are stored as lowercase strings and parsed
//! into the core enums at the store boundary.

pub mod prelude;

pub mod accounts;
pub mod ar_invoices;
pub mod ar_payments;
pub mod journal_entries;
pub mod journal_lines;
