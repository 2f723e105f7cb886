//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `accounts` - Chart-of-accounts reference data
//! - `ledger` - Double-entry journal entries, posting, and reversal
//! - `receivables` - AR invoices, payments, aging, and summaries

pub mod accounts;
pub mod ledger;
pub mod receivables;
