//! Ledger service for journal entry rules.
//!
//! Pure checks run before anything is persisted: draft shape, account
//! eligibility, lifecycle preconditions, and the balance check at post time.

use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::error::LedgerError;
use super::types::{
    JournalEntry, JournalLineInput, JournalStatus, LineAmounts, LineTotals, NewJournalEntry,
};
use super::validation::{can_transition, is_balanced, validate_journal_number, validate_line_set};
use crate::accounts::Account;

/// Stateless journal entry rules.
pub struct LedgerService;

impl LedgerService {
    /// Validates a new draft before it is persisted.
    ///
    /// 1. Validates the journal number
    /// 2. Validates the line set shape
    /// 3. Validates every referenced account (exists, active)
    ///
    /// `account_lookup` resolves an account in the caller's tenant.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if validation fails.
    pub fn validate_draft<A>(input: &NewJournalEntry, account_lookup: A) -> Result<(), LedgerError>
    where
        A: Fn(AccountId) -> Option<Account>,
    {
        validate_journal_number(&input.journal_number)?;
        Self::validate_lines(&input.lines, account_lookup)
    }

    /// Validates a replacement line set.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the shape is invalid or an account is unusable.
    pub fn validate_lines<A>(lines: &[JournalLineInput], account_lookup: A) -> Result<(), LedgerError>
    where
        A: Fn(AccountId) -> Option<Account>,
    {
        validate_line_set(lines)?;
        for line in lines {
            let account =
                account_lookup(line.account_id).ok_or(LedgerError::AccountNotFound(line.account_id))?;
            Self::validate_account(&account)?;
        }
        Ok(())
    }

    /// Validates that an account can receive new lines.
    ///
    /// # Errors
    ///
    /// Returns error if the account is inactive.
    pub fn validate_account(account: &Account) -> Result<(), LedgerError> {
        if !account.is_active {
            return Err(LedgerError::AccountInactive {
                account_id: account.id,
                code: account.code.clone(),
            });
        }
        Ok(())
    }

    /// Validate that an entry can be modified or deleted.
    ///
    /// # Errors
    ///
    /// Returns error if the entry is not a draft.
    pub fn validate_can_modify(entry: &JournalEntry) -> Result<(), LedgerError> {
        if !can_transition(entry.status, JournalStatus::Draft) {
            return Err(LedgerError::NotDraft {
                id: entry.id,
                status: entry.status,
            });
        }
        Ok(())
    }

    /// Validate that an entry can be posted with the given lines.
    ///
    /// The balance is recomputed from the stored lines on every post.
    ///
    /// # Errors
    ///
    /// Returns error if the entry is not a draft or its lines do not balance.
    pub fn validate_can_post<L: LineAmounts>(
        entry: &JournalEntry,
        lines: &[L],
        tolerance: Decimal,
    ) -> Result<LineTotals, LedgerError> {
        if !can_transition(entry.status, JournalStatus::Posted) {
            return Err(LedgerError::NotDraft {
                id: entry.id,
                status: entry.status,
            });
        }
        validate_line_set(lines)?;

        let totals = LineTotals::of(lines);
        if !is_balanced(lines, tolerance) {
            return Err(LedgerError::Unbalanced {
                debit: totals.debit,
                credit: totals.credit,
            });
        }
        Ok(totals)
    }

    /// Validate that an entry can be reversed.
    ///
    /// `existing_reversal` is the result of looking up an entry whose
    /// `reversed_from` points at `entry`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyReversed` if the entry is reversed or a reversal exists,
    /// `NotPosted` if the entry is still a draft.
    pub fn validate_can_reverse(
        entry: &JournalEntry,
        existing_reversal: Option<&JournalEntry>,
    ) -> Result<(), LedgerError> {
        if existing_reversal.is_some() || entry.status == JournalStatus::Reversed {
            return Err(LedgerError::AlreadyReversed(entry.id));
        }
        if !can_transition(entry.status, JournalStatus::Reversed) {
            return Err(LedgerError::NotPosted {
                id: entry.id,
                status: entry.status,
            });
        }
        Ok(())
    }
}
