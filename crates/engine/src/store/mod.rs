//! Persistence seams.
//!
//! Every write that must be atomic is a single trait call. Version-guarded
//! writes take the version the caller read and fail with
//! [`StoreError::StaleVersion`] when the row moved on. Unique constraints are
//! enforced by the store and surfaced as [`StoreError::UniqueViolation`].

pub mod memory;

use async_trait::async_trait;
use tally_core::accounts::Account;
use tally_core::ledger::{JournalEntry, JournalEntryWithLines, JournalFilter, JournalLine, JournalSummary};
use tally_core::receivables::{Invoice, InvoiceFilter, Payment};
use tally_shared::types::{AccountId, InvoiceId, JournalEntryId, PageRequest, TenantId};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;

/// Unique index on `(tenant_id, journal_number)`.
pub const UQ_JOURNAL_NUMBER: &str = "uq_journal_entries_tenant_number";
/// Unique index on `reversed_from`.
pub const UQ_REVERSED_FROM: &str = "uq_journal_entries_reversed_from";
/// Unique index on `(tenant_id, invoice_number)`.
pub const UQ_INVOICE_NUMBER: &str = "uq_ar_invoices_tenant_number";

/// Store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The row changed (or vanished) since it was read.
    #[error("Stale version")]
    StaleVersion,

    /// The backend failed.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if this is a violation of `constraint`.
    #[must_use]
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, Self::UniqueViolation(name) if name == constraint)
    }
}

/// Result alias for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only chart-of-accounts lookups.
#[async_trait]
pub trait AccountRegistry: Send + Sync {
    /// Finds an account by id within a tenant.
    async fn get_account(&self, tenant_id: TenantId, id: AccountId) -> StoreResult<Option<Account>>;

    /// Finds an account by code within a tenant.
    async fn find_account_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> StoreResult<Option<Account>>;

    /// Loads several accounts at once. Unknown ids are skipped.
    async fn get_accounts(&self, tenant_id: TenantId, ids: &[AccountId]) -> StoreResult<Vec<Account>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(account) = self.get_account(tenant_id, *id).await? {
                found.push(account);
            }
        }
        Ok(found)
    }
}

/// Journal entry persistence.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Inserts a header with its lines.
    async fn insert_entry(&self, entry: &JournalEntry, lines: &[JournalLine]) -> StoreResult<()>;

    /// Loads a header with its ordered lines.
    async fn get_entry(
        &self,
        tenant_id: TenantId,
        id: JournalEntryId,
    ) -> StoreResult<Option<JournalEntryWithLines>>;

    /// Returns true if the journal number is taken in the tenant.
    async fn journal_number_exists(&self, tenant_id: TenantId, number: &str) -> StoreResult<bool>;

    /// Overwrites a header, optionally replacing its full line set.
    ///
    /// `entry.version` must already be bumped; the write applies only if the
    /// stored version equals `expected_version`.
    async fn update_entry(
        &self,
        entry: &JournalEntry,
        expected_version: i64,
        lines: Option<&[JournalLine]>,
    ) -> StoreResult<()>;

    /// Deletes an entry and its lines if the stored version equals `expected_version`.
    async fn delete_entry(
        &self,
        tenant_id: TenantId,
        id: JournalEntryId,
        expected_version: i64,
    ) -> StoreResult<()>;

    /// Inserts a reversal and flips the original in one write.
    ///
    /// `original` carries its new status and bumped version; the write applies
    /// only if the stored original is still at `expected_version`.
    async fn insert_reversal(
        &self,
        reversal: &JournalEntry,
        lines: &[JournalLine],
        original: &JournalEntry,
        expected_version: i64,
    ) -> StoreResult<()>;

    /// Finds the entry whose `reversed_from` is `original_id`.
    async fn find_reversal_of(
        &self,
        tenant_id: TenantId,
        original_id: JournalEntryId,
    ) -> StoreResult<Option<JournalEntry>>;

    /// Lists entries ordered by `date desc, created_at desc`, with totals.
    ///
    /// Returns the page and the total number of matching entries.
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        filter: &JournalFilter,
        page: &PageRequest,
    ) -> StoreResult<(Vec<JournalSummary>, u64)>;

    /// Entries with at least one line referencing `(reference_type, reference_id)`.
    async fn entries_for_reference(
        &self,
        tenant_id: TenantId,
        reference_type: &str,
        reference_id: Uuid,
    ) -> StoreResult<Vec<JournalEntry>>;
}

/// Invoice and payment persistence.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Inserts a new invoice.
    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()>;

    /// Loads an invoice.
    async fn get_invoice(&self, tenant_id: TenantId, id: InvoiceId) -> StoreResult<Option<Invoice>>;

    /// Overwrites an invoice if the stored version equals `expected_version`.
    async fn update_invoice(&self, invoice: &Invoice, expected_version: i64) -> StoreResult<()>;

    /// Appends a payment and overwrites the invoice in one write, guarded by
    /// `expected_version`.
    async fn record_payment(
        &self,
        invoice: &Invoice,
        expected_version: i64,
        payment: &Payment,
    ) -> StoreResult<()>;

    /// Payments for an invoice, oldest first.
    async fn list_payments(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> StoreResult<Vec<Payment>>;

    /// Number of payments recorded against an invoice.
    async fn count_payments(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> StoreResult<usize>;

    /// Lists invoices ordered by `date_issued desc, created_at desc`.
    ///
    /// Returns the page and the total number of matching invoices.
    async fn list_invoices(
        &self,
        tenant_id: TenantId,
        filter: &InvoiceFilter,
        page: &PageRequest,
    ) -> StoreResult<(Vec<Invoice>, u64)>;

    /// Open and partial invoices matching every filter except status.
    async fn outstanding_invoices(
        &self,
        tenant_id: TenantId,
        filter: &InvoiceFilter,
    ) -> StoreResult<Vec<Invoice>>;
}
