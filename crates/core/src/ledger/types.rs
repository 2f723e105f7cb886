//! Ledger domain types for journal entries and their lines.
//!
//! This module defines the journal entry header, its exclusively owned lines,
//! the inputs used to create and edit drafts, and the list/detail projections.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{
    AccountId, DepartmentId, JournalEntryId, JournalLineId, TenantId, UserId,
};
use uuid::Uuid;

use crate::accounts::Account;

/// Journal entry lifecycle status.
///
/// `draft --post--> posted --reverse--> reversed`. There is no way back to `draft`
/// and nothing leaves `reversed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalStatus {
    /// Being drafted; header and lines may be replaced.
    Draft,
    /// Permanently recorded in the ledger.
    Posted,
    /// Negated by a posted reversal entry.
    Reversed,
}

impl JournalStatus {
    /// Returns the lowercase storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Posted => "posted",
            Self::Reversed => "reversed",
        }
    }

    /// Returns true if the entry can be modified or deleted.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the entry is immutable.
    #[must_use]
    pub const fn is_immutable(self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }
}

impl std::fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JournalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "posted" => Ok(Self::Posted),
            "reversed" => Ok(Self::Reversed),
            _ => Err(format!("Unknown journal status: {s}")),
        }
    }
}

/// Reference type stamped on lines generated from an AR payment.
pub const REFERENCE_AR_PAYMENT: &str = "ar_payment";

/// Input for a single journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineInput {
    /// The account to post to.
    pub account_id: AccountId,
    /// Optional line description.
    pub description: Option<String>,
    /// Debit amount (zero on a credit line).
    pub debit: Decimal,
    /// Credit amount (zero on a debit line).
    pub credit: Decimal,
    /// Optional department tag.
    pub department_id: Option<DepartmentId>,
    /// Kind of record this line traces back to (e.g. `ar_payment`).
    pub reference_type: Option<String>,
    /// Id of the record this line traces back to.
    pub reference_id: Option<Uuid>,
}

impl JournalLineInput {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            description: None,
            debit: amount,
            credit: Decimal::ZERO,
            department_id: None,
            reference_type: None,
            reference_id: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            description: None,
            debit: Decimal::ZERO,
            credit: amount,
            department_id: None,
            reference_type: None,
            reference_id: None,
        }
    }

    /// Sets the line description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Tags the line with a department.
    #[must_use]
    pub fn with_department(mut self, department_id: DepartmentId) -> Self {
        self.department_id = Some(department_id);
        self
    }

    /// Links the line to the record it was generated from.
    #[must_use]
    pub fn with_reference(mut self, reference_type: impl Into<String>, reference_id: Uuid) -> Self {
        self.reference_type = Some(reference_type.into());
        self.reference_id = Some(reference_id);
        self
    }
}

/// A persisted journal line, exclusively owned by its entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// Owning entry.
    pub journal_id: JournalEntryId,
    /// Account posted to.
    pub account_id: AccountId,
    /// Optional line description.
    pub description: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Optional department tag.
    pub department_id: Option<DepartmentId>,
    /// Kind of record this line traces back to.
    pub reference_type: Option<String>,
    /// Id of the record this line traces back to.
    pub reference_id: Option<Uuid>,
    /// Position within the entry, starting at 0.
    pub sort_order: i32,
}

impl JournalLine {
    /// Materializes an input line for `journal_id` at position `sort_order`.
    #[must_use]
    pub fn from_input(journal_id: JournalEntryId, sort_order: i32, input: JournalLineInput) -> Self {
        Self {
            id: JournalLineId::new(),
            journal_id,
            account_id: input.account_id,
            description: input.description,
            debit: input.debit,
            credit: input.credit,
            department_id: input.department_id,
            reference_type: input.reference_type,
            reference_id: input.reference_id,
            sort_order,
        }
    }

    /// Materializes a full ordered line set.
    #[must_use]
    pub fn from_inputs(journal_id: JournalEntryId, inputs: Vec<JournalLineInput>) -> Vec<Self> {
        inputs
            .into_iter()
            .zip(0_i32..)
            .map(|(input, sort_order)| Self::from_input(journal_id, sort_order, input))
            .collect()
    }

    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// A journal entry header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Journal number, unique per tenant for the lifetime of the tenant.
    pub journal_number: String,
    /// Accounting date.
    pub date: NaiveDate,
    /// Optional memo.
    pub memo: Option<String>,
    /// Lifecycle status.
    pub status: JournalStatus,
    /// When the entry was posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// The entry this one reverses.
    pub reversed_from: Option<JournalEntryId>,
    /// User who created the entry.
    pub created_by: UserId,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last updated.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency counter, bumped by every write.
    pub version: i64,
}

impl JournalEntry {
    /// Returns true if the entry is a reversal of another entry.
    #[must_use]
    pub fn is_reversal(&self) -> bool {
        self.reversed_from.is_some()
    }
}

/// A journal entry with its ordered lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryWithLines {
    /// The header.
    pub entry: JournalEntry,
    /// Lines ordered by `sort_order`.
    pub lines: Vec<JournalLine>,
}

impl JournalEntryWithLines {
    /// Returns the debit/credit totals of the lines.
    #[must_use]
    pub fn totals(&self) -> LineTotals {
        LineTotals::of(&self.lines)
    }
}

/// Input for creating a draft journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalEntry {
    /// Journal number, unique per tenant.
    pub journal_number: String,
    /// Accounting date.
    pub date: NaiveDate,
    /// Optional memo.
    pub memo: Option<String>,
    /// The lines (at least 2).
    pub lines: Vec<JournalLineInput>,
}

/// Partial header update for a draft entry. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalHeaderPatch {
    /// New journal number.
    pub journal_number: Option<String>,
    /// New accounting date.
    pub date: Option<NaiveDate>,
    /// New memo; `Some(None)` clears it.
    pub memo: Option<Option<String>>,
}

impl JournalHeaderPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.journal_number.is_none() && self.date.is_none() && self.memo.is_none()
    }

    /// Applies the patch to a header.
    pub fn apply_to(&self, entry: &mut JournalEntry) {
        if let Some(number) = &self.journal_number {
            entry.journal_number.clone_from(number);
        }
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(memo) = &self.memo {
            entry.memo.clone_from(memo);
        }
    }
}

/// Filters for listing journal entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalFilter {
    /// Case-insensitive substring of `journal_number` or `memo`.
    pub search: Option<String>,
    /// Filter by status.
    pub status: Option<JournalStatus>,
    /// Filter by date range start (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Filter by date range end (inclusive).
    pub date_to: Option<NaiveDate>,
}

impl JournalFilter {
    /// Returns true if `entry` passes every filter.
    #[must_use]
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if let Some(status) = self.status
            && entry.status != status
        {
            return false;
        }
        if let Some(from) = self.date_from
            && entry.date < from
        {
            return false;
        }
        if let Some(to) = self.date_to
            && entry.date > to
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                entry.journal_number.to_lowercase().contains(&needle)
                    || entry
                        .memo
                        .as_deref()
                        .is_some_and(|memo| memo.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

/// Sum of debits and credits over a line set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineTotals {
    /// Total debits.
    pub debit: Decimal,
    /// Total credits.
    pub credit: Decimal,
}

impl LineTotals {
    /// Sums the debit and credit columns.
    #[must_use]
    pub fn of<L: LineAmounts>(lines: &[L]) -> Self {
        lines.iter().fold(Self::default(), |acc, line| Self {
            debit: acc.debit + line.debit_amount(),
            credit: acc.credit + line.credit_amount(),
        })
    }

    /// Returns debits minus credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// One row of a journal list: the header plus derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalSummary {
    /// The header.
    pub entry: JournalEntry,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// Number of lines.
    pub line_count: usize,
}

impl JournalSummary {
    /// Builds a summary from a header and its lines.
    #[must_use]
    pub fn new(entry: JournalEntry, lines: &[JournalLine]) -> Self {
        let totals = LineTotals::of(lines);
        Self {
            entry,
            total_debit: totals.debit,
            total_credit: totals.credit,
            line_count: lines.len(),
        }
    }
}

/// A journal line joined with the account it posts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineDetail {
    /// The line.
    pub line: JournalLine,
    /// The account, if it still exists in the chart.
    pub account: Option<Account>,
}

/// A journal entry prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryDetail {
    /// The header.
    pub entry: JournalEntry,
    /// Ordered lines with account joins.
    pub lines: Vec<JournalLineDetail>,
    /// Derived totals.
    pub totals: LineTotals,
}

/// Read access to the debit and credit columns of a line, whatever its representation.
pub trait LineAmounts {
    /// Debit amount.
    fn debit_amount(&self) -> Decimal;
    /// Credit amount.
    fn credit_amount(&self) -> Decimal;
}

impl LineAmounts for JournalLineInput {
    fn debit_amount(&self) -> Decimal {
        self.debit
    }

    fn credit_amount(&self) -> Decimal {
        self.credit
    }
}

impl LineAmounts for JournalLine {
    fn debit_amount(&self) -> Decimal {
        self.debit
    }

    fn credit_amount(&self) -> Decimal {
        self.credit
    }
}
