//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::accounts::{Account, AccountType};
use tally_core::ledger::{JournalLineInput, NewJournalEntry};
use tally_core::receivables::NewInvoice;
use tally_engine::{Engine, MemoryActivitySink, MemoryStore};
use tally_shared::types::{CustomerId, TenantId, UserId};
use tally_shared::{AppConfig, TenantContext};

/// One tenant with a small chart and an engine over a memory store.
pub struct Harness {
    pub engine: Engine,
    pub store: Arc<MemoryStore>,
    pub activity: Arc<MemoryActivitySink>,
    pub ctx: TenantContext,
    pub cash: Account,
    pub receivable: Account,
    pub revenue: Account,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let activity = Arc::new(MemoryActivitySink::new());
        let (engine, store) = Engine::in_memory(activity.clone(), &config);
        let ctx = TenantContext::new(TenantId::new(), UserId::new());

        let cash = Account::new(ctx.tenant_id, "1000", "Cash", AccountType::Asset);
        let receivable = Account::new(ctx.tenant_id, "1200", "Accounts Receivable", AccountType::Asset);
        let revenue = Account::new(ctx.tenant_id, "4000", "Revenue", AccountType::Revenue);
        for account in [&cash, &receivable, &revenue] {
            store.put_account(account.clone()).await;
        }

        Self {
            engine,
            store,
            activity,
            ctx,
            cash,
            receivable,
            revenue,
        }
    }

    /// A context for a different tenant.
    pub fn other_tenant(&self) -> TenantContext {
        TenantContext::new(TenantId::new(), self.ctx.actor_user_id)
    }

    /// `debit cash / credit revenue` for the given amounts.
    pub fn sale(&self, number: &str, debit: Decimal, credit: Decimal) -> NewJournalEntry {
        NewJournalEntry {
            journal_number: number.to_string(),
            date: date(3, 1),
            memo: Some("Cash sale".to_string()),
            lines: vec![
                JournalLineInput::debit(self.cash.id, debit),
                JournalLineInput::credit(self.revenue.id, credit),
            ],
        }
    }
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

pub fn invoice(number: &str, total: Decimal, due: NaiveDate) -> NewInvoice {
    NewInvoice {
        invoice_number: number.to_string(),
        customer_id: CustomerId::new(),
        date_issued: date(1, 1),
        due_date: due,
        amount_total: total,
        memo: None,
    }
}
