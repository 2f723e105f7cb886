//! Ledger error types for journal entry operations.
//!
//! This module defines all errors that can occur while creating, editing,
//! posting, deleting, and reversing journal entries.

use rust_decimal::Decimal;
use tally_shared::error::{AppError, ErrorKind};
use tally_shared::types::{AccountId, JournalEntryId};
use thiserror::Error;

use super::types::JournalStatus;
use super::validation::ValidationError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// The submitted line set or header is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A line references an inactive account.
    #[error("Account {code} ({account_id}) is inactive")]
    AccountInactive {
        /// The account ID.
        account_id: AccountId,
        /// The account code.
        code: String,
    },

    // ========== Not Found Errors ==========
    /// Journal entry not found in the caller's tenant.
    #[error("Journal entry not found: {0}")]
    NotFound(JournalEntryId),

    /// A line references an account that is not in the tenant's chart.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    // ========== Conflict Errors ==========
    /// The journal number is already used in the tenant.
    #[error("Journal number {0} is already in use")]
    DuplicateNumber(String),

    /// The entry already has a reversal.
    #[error("Journal entry {0} has already been reversed")]
    AlreadyReversed(JournalEntryId),

    /// The entry changed underneath a version-guarded write too many times.
    #[error("Concurrent modification detected for journal entry {0}, please retry")]
    ConcurrentModification(JournalEntryId),

    // ========== Business Rule Errors ==========
    /// Debits and credits differ at post time.
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debits.
        debit: Decimal,
        /// Total credits.
        credit: Decimal,
    },

    /// The operation requires a draft entry.
    #[error("Journal entry {id} is {status}, only draft entries can be changed")]
    NotDraft {
        /// The entry.
        id: JournalEntryId,
        /// Its current status.
        status: JournalStatus,
    },

    /// The operation requires a posted entry.
    #[error("Journal entry {id} is {status}, only posted entries can be reversed")]
    NotPosted {
        /// The entry.
        id: JournalEntryId,
        /// Its current status.
        status: JournalStatus,
    },

    // ========== Dependency Errors ==========
    /// The operation exceeded its deadline. Nothing was committed.
    #[error("Operation timed out after {0} ms")]
    Timeout(u128),

    /// The data store failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::AccountInactive { .. } => ErrorKind::Validation,
            Self::NotFound(_) | Self::AccountNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateNumber(_)
            | Self::AlreadyReversed(_)
            | Self::ConcurrentModification(_) => ErrorKind::Conflict,
            Self::Unbalanced { .. } | Self::NotDraft { .. } | Self::NotPosted { .. } => {
                ErrorKind::BusinessRule
            }
            Self::Timeout(_) | Self::Store(_) => ErrorKind::Dependency,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(inner) => inner.error_code(),
            Self::AccountInactive { .. } => "ACCOUNT_INACTIVE",
            Self::NotFound(_) => "JOURNAL_ENTRY_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::DuplicateNumber(_) => "DUPLICATE_NUMBER",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::NotDraft { .. } => "NOT_DRAFT",
            Self::NotPosted { .. } => "NOT_POSTED",
            Self::Timeout(_) => "TIMEOUT",
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_) | Self::Timeout(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}
