//! Receivables error types.

use rust_decimal::Decimal;
use tally_shared::error::{AppError, ErrorKind};
use tally_shared::types::InvoiceId;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::ledger::validation::MAX_AMOUNT_SCALE;

/// Errors from invoice and payment operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceivableError {
    // ========== Validation Errors ==========
    /// Payment amount is zero or negative.
    #[error("Payment amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// The invoice number is blank.
    #[error("Invoice number is required")]
    MissingInvoiceNumber,

    /// Invoice total is zero or negative.
    #[error("Invoice total must be positive, got {0}")]
    NonPositiveTotal(Decimal),

    /// An amount has more decimal places than can be stored.
    #[error("Amount {0} has more than {max} decimal places", max = MAX_AMOUNT_SCALE)]
    ScaleTooLarge(Decimal),

    /// Due date precedes issue date.
    #[error("Due date {due_date} is before issue date {date_issued}")]
    DueBeforeIssue {
        /// Issue date.
        date_issued: chrono::NaiveDate,
        /// Due date.
        due_date: chrono::NaiveDate,
    },

    // ========== Not Found Errors ==========
    /// Invoice not found in the caller's tenant.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    // ========== Conflict Errors ==========
    /// The invoice number is already used in the tenant.
    #[error("Invoice number {0} is already in use")]
    DuplicateNumber(String),

    /// The invoice is fully paid.
    #[error("Invoice {0} is already paid")]
    AlreadyPaid(InvoiceId),

    /// The invoice is void and cannot take payments.
    #[error("Invoice {0} is void")]
    Void(InvoiceId),

    /// The invoice is already void.
    #[error("Invoice {0} is already void")]
    AlreadyVoid(InvoiceId),

    /// The invoice kept changing underneath the write.
    #[error("Concurrent modification detected for invoice {0}, please retry")]
    ConcurrentModification(InvoiceId),

    // ========== Business Rule Errors ==========
    /// Payment is larger than what is still owed.
    #[error("Payment of {amount} exceeds balance due of {balance_due}")]
    ExceedsBalance {
        /// Requested amount.
        amount: Decimal,
        /// Remaining balance.
        balance_due: Decimal,
    },

    /// Invoices with payments cannot be voided.
    #[error("Invoice {invoice_id} has {count} payment(s) and cannot be voided")]
    HasPayments {
        /// The invoice.
        invoice_id: InvoiceId,
        /// Number of recorded payments.
        count: usize,
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

impl ReceivableError {
    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_)
            | Self::MissingInvoiceNumber
            | Self::NonPositiveTotal(_)
            | Self::ScaleTooLarge(_)
            | Self::DueBeforeIssue { .. } => ErrorKind::Validation,
            Self::InvoiceNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateNumber(_)
            | Self::AlreadyPaid(_)
            | Self::Void(_)
            | Self::AlreadyVoid(_)
            | Self::ConcurrentModification(_) => ErrorKind::Conflict,
            Self::ExceedsBalance { .. } | Self::HasPayments { .. } => ErrorKind::BusinessRule,
            Self::Timeout(_) | Self::Store(_) => ErrorKind::Dependency,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::MissingInvoiceNumber => "MISSING_INVOICE_NUMBER",
            Self::NonPositiveTotal(_) => "NON_POSITIVE_TOTAL",
            Self::ScaleTooLarge(_) => "SCALE_TOO_LARGE",
            Self::DueBeforeIssue { .. } => "DUE_BEFORE_ISSUE",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::DuplicateNumber(_) => "DUPLICATE_NUMBER",
            Self::AlreadyPaid(_) => "ALREADY_PAID",
            Self::Void(_) => "INVOICE_VOID",
            Self::AlreadyVoid(_) => "ALREADY_VOID",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::ExceedsBalance { .. } => "EXCEEDS_BALANCE",
            Self::HasPayments { .. } => "HAS_PAYMENTS",
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

impl From<ReceivableError> for AppError {
    fn from(err: ReceivableError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}

/// Why the cash-receipt entry for a payment could not be posted.
///
/// Never fails the payment itself; it is carried in the payment outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerPostingError {
    /// A posting account code is not in the tenant's chart.
    #[error("Posting account {code} not found")]
    AccountMissing {
        /// The configured account code.
        code: String,
    },

    /// A posting account is inactive.
    #[error("Posting account {code} is inactive")]
    AccountInactive {
        /// The configured account code.
        code: String,
    },

    /// Creating or posting the entry failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl LedgerPostingError {
    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountMissing { .. } | Self::AccountInactive { .. } => ErrorKind::Dependency,
            Self::Ledger(inner) => inner.kind(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountMissing { .. } => "POSTING_ACCOUNT_MISSING",
            Self::AccountInactive { .. } => "POSTING_ACCOUNT_INACTIVE",
            Self::Ledger(inner) => inner.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_kinds() {
        let id = InvoiceId::new();
        assert_eq!(ReceivableError::InvalidAmount(dec!(0)).kind(), ErrorKind::Validation);
        assert_eq!(ReceivableError::InvoiceNotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(ReceivableError::Void(id).kind(), ErrorKind::Conflict);
        assert_eq!(ReceivableError::AlreadyPaid(id).kind(), ErrorKind::Conflict);
        assert_eq!(
            ReceivableError::ExceedsBalance {
                amount: dec!(600),
                balance_due: dec!(400)
            }
            .kind(),
            ErrorKind::BusinessRule
        );
        assert_eq!(
            ReceivableError::HasPayments {
                invoice_id: id,
                count: 1
            }
            .http_status_code(),
            422
        );
    }

    #[test]
    fn test_display() {
        let err = ReceivableError::ExceedsBalance {
            amount: dec!(600.00),
            balance_due: dec!(400.00),
        };
        assert_eq!(
            err.to_string(),
            "Payment of 600.00 exceeds balance due of 400.00"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(ReceivableError::ConcurrentModification(InvoiceId::new()).is_retryable());
        assert!(!ReceivableError::AlreadyVoid(InvoiceId::new()).is_retryable());
    }

    #[test]
    fn test_posting_error_kinds() {
        let missing = LedgerPostingError::AccountMissing {
            code: "1000".into(),
        };
        assert_eq!(missing.kind(), ErrorKind::Dependency);
        assert_eq!(missing.error_code(), "POSTING_ACCOUNT_MISSING");

        let ledger = LedgerPostingError::from(LedgerError::DuplicateNumber("PMT-1".into()));
        assert_eq!(ledger.kind(), ErrorKind::Conflict);
        assert_eq!(ledger.error_code(), "DUPLICATE_NUMBER");
    }
}
