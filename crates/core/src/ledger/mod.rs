//! Double-entry journal logic.
//!
//! - Domain types for journal entries and lines
//! - Line set validation and status transitions
//! - Error types for ledger operations
//! - Ledger service for lifecycle checks
//! - Reversal derivation

pub mod error;
pub mod reversal;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod reversal_props;
#[cfg(test)]
mod validation_props;

pub use error::LedgerError;
pub use reversal::{
    DEFAULT_REVERSAL_SUFFIX, REVERSAL_REFERENCE_SUFFIX, ReversalPlan, ReversalService,
};
pub use service::LedgerService;
pub use types::{
    JournalEntry, JournalEntryDetail, JournalEntryWithLines, JournalFilter, JournalHeaderPatch,
    JournalLine, JournalLineDetail, JournalLineInput, JournalStatus, JournalSummary, LineAmounts,
    LineTotals, NewJournalEntry, REFERENCE_AR_PAYMENT,
};
pub use validation::{
    DEFAULT_BALANCE_TOLERANCE, MAX_AMOUNT_SCALE, MIN_LINES, ValidationError, can_transition,
    exceeds_amount_scale, is_balanced, validate_line_set,
};
