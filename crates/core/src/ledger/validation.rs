//! Business rule validation for journal line sets and status transitions.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{JournalStatus, LineAmounts, LineTotals};

/// Minimum number of lines in a journal entry.
pub const MIN_LINES: usize = 2;

/// Default tolerance when comparing total debits with total credits.
pub const DEFAULT_BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Most decimal places a stored money amount may carry (`NUMERIC(19, 4)`).
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// Returns true if `amount` has more significant decimal places than can be stored.
///
/// Trailing zeros do not count: `1.50000` fits, `1.00005` does not.
#[must_use]
pub fn exceeds_amount_scale(amount: Decimal) -> bool {
    amount.normalize().scale() > MAX_AMOUNT_SCALE
}

/// Validation errors for journal line sets. Lines are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Fewer than two lines.
    #[error("Journal entry must have at least {MIN_LINES} lines, got {count}")]
    TooFewLines {
        /// Number of lines submitted.
        count: usize,
    },

    /// A debit or credit amount is negative.
    #[error("Line {line} has a negative amount")]
    NegativeAmount {
        /// Offending line.
        line: usize,
    },

    /// A line carries both a debit and a credit.
    #[error("Line {line} has both a debit and a credit amount")]
    MixedLine {
        /// Offending line.
        line: usize,
    },

    /// A line carries neither a debit nor a credit.
    #[error("Line {line} has neither a debit nor a credit amount")]
    EmptyLine {
        /// Offending line.
        line: usize,
    },

    /// An amount has more decimal places than can be stored.
    #[error("Line {line} has more than {} decimal places", MAX_AMOUNT_SCALE)]
    ScaleTooLarge {
        /// Offending line.
        line: usize,
    },

    /// The journal number is blank.
    #[error("Journal number is required")]
    MissingJournalNumber,
}

impl ValidationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::TooFewLines { .. } => "TOO_FEW_LINES",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::MixedLine { .. } => "MIXED_LINE",
            Self::EmptyLine { .. } => "EMPTY_LINE",
            Self::ScaleTooLarge { .. } => "SCALE_TOO_LARGE",
            Self::MissingJournalNumber => "MISSING_JOURNAL_NUMBER",
        }
    }
}

/// Validates the shape of a line set.
///
/// Every line must be exactly one of a debit line or a credit line with a
/// non-negative amount, and there must be at least two lines. Balance is not
/// checked here; see [`is_balanced`].
///
/// # Errors
///
/// Returns the first violation found, scanning lines in order.
pub fn validate_line_set<L: LineAmounts>(lines: &[L]) -> Result<(), ValidationError> {
    if lines.len() < MIN_LINES {
        return Err(ValidationError::TooFewLines { count: lines.len() });
    }

    for (index, line) in lines.iter().enumerate() {
        let line_no = index + 1;
        let debit = line.debit_amount();
        let credit = line.credit_amount();

        if debit < Decimal::ZERO || credit < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount { line: line_no });
        }
        if debit > Decimal::ZERO && credit > Decimal::ZERO {
            return Err(ValidationError::MixedLine { line: line_no });
        }
        if debit.is_zero() && credit.is_zero() {
            return Err(ValidationError::EmptyLine { line: line_no });
        }
        if exceeds_amount_scale(debit) || exceeds_amount_scale(credit) {
            return Err(ValidationError::ScaleTooLarge { line: line_no });
        }
    }

    Ok(())
}

/// Validates a journal number.
///
/// # Errors
///
/// Returns an error if the number is blank.
pub fn validate_journal_number(number: &str) -> Result<(), ValidationError> {
    if number.trim().is_empty() {
        return Err(ValidationError::MissingJournalNumber);
    }
    Ok(())
}

/// Returns true if total debits and total credits differ by less than `epsilon`.
#[must_use]
pub fn is_balanced<L: LineAmounts>(lines: &[L], epsilon: Decimal) -> bool {
    LineTotals::of(lines).difference().abs() < epsilon
}

/// Returns true if `current -> target` is a legal status transition.
///
/// `draft -> draft` covers in-place edits. `posted -> reversed` is legal only as the
/// side effect of creating a reversal entry; callers never set it directly.
#[must_use]
pub const fn can_transition(current: JournalStatus, target: JournalStatus) -> bool {
    matches!(
        (current, target),
        (JournalStatus::Draft, JournalStatus::Draft | JournalStatus::Posted)
            | (JournalStatus::Posted, JournalStatus::Reversed)
    )
}
