//! In-memory store.
//!
//! Holds every table behind one `RwLock`, so each trait call is atomic. Unique
//! indexes and version guards are checked under the write lock before any
//! mutation, mirroring what the database does.

use std::collections::HashMap;

use async_trait::async_trait;
use tally_core::accounts::Account;
use tally_core::ledger::{JournalEntry, JournalEntryWithLines, JournalFilter, JournalLine, JournalSummary};
use tally_core::receivables::{Invoice, InvoiceFilter, Payment};
use tally_shared::types::{AccountId, InvoiceId, JournalEntryId, PageRequest, TenantId};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AccountRegistry, InvoiceStore, JournalStore, StoreError, StoreResult, UQ_INVOICE_NUMBER,
    UQ_JOURNAL_NUMBER, UQ_REVERSED_FROM,
};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    entries: HashMap<JournalEntryId, JournalEntry>,
    lines: HashMap<JournalEntryId, Vec<JournalLine>>,
    invoices: HashMap<InvoiceId, Invoice>,
    payments: HashMap<InvoiceId, Vec<Payment>>,
}

impl Tables {
    fn entry_number_taken(&self, tenant_id: TenantId, number: &str, except: Option<JournalEntryId>) -> bool {
        self.entries.values().any(|e| {
            e.tenant_id == tenant_id && e.journal_number == number && Some(e.id) != except
        })
    }

    fn check_new_entry(&self, entry: &JournalEntry) -> StoreResult<()> {
        if self.entry_number_taken(entry.tenant_id, &entry.journal_number, None) {
            return Err(StoreError::UniqueViolation(UQ_JOURNAL_NUMBER.to_string()));
        }
        if let Some(original) = entry.reversed_from
            && self.entries.values().any(|e| e.reversed_from == Some(original))
        {
            return Err(StoreError::UniqueViolation(UQ_REVERSED_FROM.to_string()));
        }
        Ok(())
    }

    fn check_version(&self, tenant_id: TenantId, id: JournalEntryId, expected: i64) -> StoreResult<()> {
        match self.entries.get(&id) {
            Some(current) if current.tenant_id == tenant_id && current.version == expected => Ok(()),
            _ => Err(StoreError::StaleVersion),
        }
    }

    fn check_invoice_version(&self, invoice: &Invoice, expected: i64) -> StoreResult<()> {
        match self.invoices.get(&invoice.id) {
            Some(current) if current.tenant_id == invoice.tenant_id && current.version == expected => Ok(()),
            _ => Err(StoreError::StaleVersion),
        }
    }

    fn put_entry(&mut self, entry: &JournalEntry, lines: &[JournalLine]) {
        self.entries.insert(entry.id, entry.clone());
        self.lines.insert(entry.id, lines.to_vec());
    }
}

/// Thread-safe in-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a chart-of-accounts entry.
    pub async fn put_account(&self, account: Account) {
        self.tables.write().await.accounts.insert(account.id, account);
    }
}

#[async_trait]
impl AccountRegistry for MemoryStore {
    async fn get_account(&self, tenant_id: TenantId, id: AccountId) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .get(&id)
            .filter(|a| a.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_account_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.tenant_id == tenant_id && a.code == code)
            .cloned())
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    async fn insert_entry(&self, entry: &JournalEntry, lines: &[JournalLine]) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_new_entry(entry)?;
        tables.put_entry(entry, lines);
        Ok(())
    }

    async fn get_entry(
        &self,
        tenant_id: TenantId,
        id: JournalEntryId,
    ) -> StoreResult<Option<JournalEntryWithLines>> {
        let tables = self.tables.read().await;
        let Some(entry) = tables.entries.get(&id).filter(|e| e.tenant_id == tenant_id) else {
            return Ok(None);
        };
        let mut lines = tables.lines.get(&id).cloned().unwrap_or_default();
        lines.sort_by_key(|l| l.sort_order);
        Ok(Some(JournalEntryWithLines {
            entry: entry.clone(),
            lines,
        }))
    }

    async fn journal_number_exists(&self, tenant_id: TenantId, number: &str) -> StoreResult<bool> {
        Ok(self.tables.read().await.entry_number_taken(tenant_id, number, None))
    }

    async fn update_entry(
        &self,
        entry: &JournalEntry,
        expected_version: i64,
        lines: Option<&[JournalLine]>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_version(entry.tenant_id, entry.id, expected_version)?;
        if tables.entry_number_taken(entry.tenant_id, &entry.journal_number, Some(entry.id)) {
            return Err(StoreError::UniqueViolation(UQ_JOURNAL_NUMBER.to_string()));
        }
        tables.entries.insert(entry.id, entry.clone());
        if let Some(lines) = lines {
            tables.lines.insert(entry.id, lines.to_vec());
        }
        Ok(())
    }

    async fn delete_entry(
        &self,
        tenant_id: TenantId,
        id: JournalEntryId,
        expected_version: i64,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_version(tenant_id, id, expected_version)?;
        tables.entries.remove(&id);
        tables.lines.remove(&id);
        Ok(())
    }

    async fn insert_reversal(
        &self,
        reversal: &JournalEntry,
        lines: &[JournalLine],
        original: &JournalEntry,
        expected_version: i64,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_version(original.tenant_id, original.id, expected_version)?;
        tables.check_new_entry(reversal)?;
        tables.put_entry(reversal, lines);
        tables.entries.insert(original.id, original.clone());
        Ok(())
    }

    async fn find_reversal_of(
        &self,
        tenant_id: TenantId,
        original_id: JournalEntryId,
    ) -> StoreResult<Option<JournalEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .entries
            .values()
            .find(|e| e.tenant_id == tenant_id && e.reversed_from == Some(original_id))
            .cloned())
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        filter: &JournalFilter,
        page: &PageRequest,
    ) -> StoreResult<(Vec<JournalSummary>, u64)> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&JournalEntry> = tables
            .entries
            .values()
            .filter(|e| e.tenant_id == tenant_id && filter.matches(e))
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));

        let total = matching.len() as u64;
        let summaries = page
            .slice(matching)
            .into_iter()
            .map(|entry| {
                let lines = tables.lines.get(&entry.id).map_or(&[][..], Vec::as_slice);
                JournalSummary::new(entry.clone(), lines)
            })
            .collect();
        Ok((summaries, total))
    }

    async fn entries_for_reference(
        &self,
        tenant_id: TenantId,
        reference_type: &str,
        reference_id: Uuid,
    ) -> StoreResult<Vec<JournalEntry>> {
        let tables = self.tables.read().await;
        let mut found: Vec<JournalEntry> = tables
            .entries
            .values()
            .filter(|e| e.tenant_id == tenant_id)
            .filter(|e| {
                tables.lines.get(&e.id).is_some_and(|lines| {
                    lines.iter().any(|l| {
                        l.reference_type.as_deref() == Some(reference_type)
                            && l.reference_id == Some(reference_id)
                    })
                })
            })
            .cloned()
            .collect();
        found.sort_by_key(|e| e.created_at);
        Ok(found)
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let taken = tables.invoices.values().any(|i| {
            i.tenant_id == invoice.tenant_id && i.invoice_number == invoice.invoice_number
        });
        if taken {
            return Err(StoreError::UniqueViolation(UQ_INVOICE_NUMBER.to_string()));
        }
        tables.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn get_invoice(&self, tenant_id: TenantId, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .invoices
            .get(&id)
            .filter(|i| i.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_invoice(&self, invoice: &Invoice, expected_version: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_invoice_version(invoice, expected_version)?;
        tables.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn record_payment(
        &self,
        invoice: &Invoice,
        expected_version: i64,
        payment: &Payment,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_invoice_version(invoice, expected_version)?;
        tables.invoices.insert(invoice.id, invoice.clone());
        tables
            .payments
            .entry(invoice.id)
            .or_default()
            .push(payment.clone());
        Ok(())
    }

    async fn list_payments(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> StoreResult<Vec<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .get(&invoice_id)
            .map(|payments| {
                payments
                    .iter()
                    .filter(|p| p.tenant_id == tenant_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count_payments(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> StoreResult<usize> {
        Ok(self.list_payments(tenant_id, invoice_id).await?.len())
    }

    async fn list_invoices(
        &self,
        tenant_id: TenantId,
        filter: &InvoiceFilter,
        page: &PageRequest,
    ) -> StoreResult<(Vec<Invoice>, u64)> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Invoice> = tables
            .invoices
            .values()
            .filter(|i| i.tenant_id == tenant_id && filter.matches(i))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.date_issued
                .cmp(&a.date_issued)
                .then(b.created_at.cmp(&a.created_at))
        });
        let total = matching.len() as u64;
        Ok((page.slice(matching), total))
    }

    async fn outstanding_invoices(
        &self,
        tenant_id: TenantId,
        filter: &InvoiceFilter,
    ) -> StoreResult<Vec<Invoice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .invoices
            .values()
            .filter(|i| {
                i.tenant_id == tenant_id
                    && i.status.is_outstanding()
                    && filter.matches_ignoring_status(i)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use tally_core::accounts::AccountType;
    use tally_core::ledger::{JournalLineInput, JournalStatus};
    use tally_shared::types::UserId;

    fn entry(tenant_id: TenantId, number: &str) -> JournalEntry {
        let now = Utc::now();
        JournalEntry {
            id: JournalEntryId::new(),
            tenant_id,
            journal_number: number.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            memo: None,
            status: JournalStatus::Draft,
            posted_at: None,
            reversed_from: None,
            created_by: UserId::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    fn lines(journal_id: JournalEntryId) -> Vec<JournalLine> {
        let account = AccountId::new();
        JournalLine::from_inputs(
            journal_id,
            vec![
                JournalLineInput::debit(account, dec!(10)),
                JournalLineInput::credit(account, dec!(10)),
            ],
        )
    }

    #[tokio::test]
    async fn test_journal_number_unique_per_tenant() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let first = entry(tenant, "JE-1");
        store.insert_entry(&first, &lines(first.id)).await.unwrap();

        let dup = entry(tenant, "JE-1");
        let err = store.insert_entry(&dup, &lines(dup.id)).await.unwrap_err();
        assert!(err.violates(UQ_JOURNAL_NUMBER));

        let other_tenant = entry(TenantId::new(), "JE-1");
        assert!(store.insert_entry(&other_tenant, &lines(other_tenant.id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_requires_expected_version() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let original = entry(tenant, "JE-1");
        store.insert_entry(&original, &lines(original.id)).await.unwrap();

        let mut next = original.clone();
        next.version = 2;
        next.memo = Some("edited".into());
        store.update_entry(&next, 1, None).await.unwrap();

        let mut stale = original.clone();
        stale.version = 2;
        assert_eq!(store.update_entry(&stale, 1, None).await, Err(StoreError::StaleVersion));

        let stored = store.get_entry(tenant, original.id).await.unwrap().unwrap();
        assert_eq!(stored.entry.memo.as_deref(), Some("edited"));
        assert_eq!(stored.lines.len(), 2);
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let e = entry(tenant, "JE-1");
        store.insert_entry(&e, &lines(e.id)).await.unwrap();
        assert!(store.get_entry(TenantId::new(), e.id).await.unwrap().is_none());
        assert_eq!(
            store.delete_entry(TenantId::new(), e.id, 1).await,
            Err(StoreError::StaleVersion)
        );

        let cash = Account::new(tenant, "1000", "Cash", AccountType::Asset);
        store.put_account(cash.clone()).await;
        assert!(store.get_account(TenantId::new(), cash.id).await.unwrap().is_none());
        assert_eq!(
            store.find_account_by_code(tenant, "1000").await.unwrap(),
            Some(cash)
        );
    }

    #[tokio::test]
    async fn test_reversal_unique_back_reference() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let mut original = entry(tenant, "JE-1");
        original.status = JournalStatus::Posted;
        store.insert_entry(&original, &lines(original.id)).await.unwrap();

        let mut flipped = original.clone();
        flipped.status = JournalStatus::Reversed;
        flipped.version = 2;

        let mut reversal = entry(tenant, "JE-1-REV");
        reversal.reversed_from = Some(original.id);
        store
            .insert_reversal(&reversal, &lines(reversal.id), &flipped, 1)
            .await
            .unwrap();

        let mut again = entry(tenant, "JE-1-REV-2");
        again.reversed_from = Some(original.id);
        let mut flipped_again = flipped.clone();
        flipped_again.version = 3;
        let err = store
            .insert_reversal(&again, &lines(again.id), &flipped_again, 2)
            .await
            .unwrap_err();
        assert!(err.violates(UQ_REVERSED_FROM));

        let found = store.find_reversal_of(tenant, original.id).await.unwrap();
        assert_eq!(found.map(|e| e.id), Some(reversal.id));
    }
}
