//! Async services for Tally.
//!
//! Wires the pure rules in `tally-core` to pluggable stores:
//! - `journal` - create, edit, post, delete, and query journal entries
//! - `reversal` - reverse posted entries
//! - `receivables` - invoices, payments, aging, and cash-receipt postings
//! - `store` - persistence traits and the in-memory store
//! - `registry` - cached chart-of-accounts lookups
//! - `activity` - the audit trail

pub mod activity;
pub mod deadline;
pub mod journal;
pub mod receivables;
pub mod registry;
pub mod reversal;
pub mod store;

use std::sync::Arc;

use tally_shared::AppConfig;

pub use activity::{
    ActivityAction, ActivityDiff, ActivityEntity, ActivityRecord, ActivitySink,
    MemoryActivitySink, TracingActivitySink,
};
pub use journal::JournalService;
pub use receivables::{InvoiceList, LedgerPosting, PaymentOutcome, ReceivablesService};
pub use registry::CachedAccountRegistry;
pub use reversal::ReversalEngine;
pub use store::{
    AccountRegistry, InvoiceStore, JournalStore, MemoryStore, StoreError, StoreResult,
};

/// The three services sharing one store, one account cache, and one activity sink.
#[derive(Clone)]
pub struct Engine {
    /// Journal entry operations.
    pub journals: JournalService,
    /// Reversals.
    pub reversals: ReversalEngine,
    /// Invoices and payments.
    pub receivables: ReceivablesService,
}

impl Engine {
    /// Builds the services over `store`.
    #[must_use]
    pub fn new<S>(store: Arc<S>, activity: Arc<dyn ActivitySink>, config: &AppConfig) -> Self
    where
        S: JournalStore + InvoiceStore + AccountRegistry + 'static,
    {
        let accounts: Arc<dyn AccountRegistry> = Arc::new(CachedAccountRegistry::from_config(
            store.clone(),
            &config.accounts_cache,
        ));
        let journals = JournalService::new(
            store.clone(),
            accounts.clone(),
            activity.clone(),
            config.ledger.clone(),
        );
        let reversals = ReversalEngine::new(store.clone(), activity.clone(), config.ledger.clone());
        let receivables = ReceivablesService::new(
            store,
            accounts,
            journals.clone(),
            activity,
            config.receivables.clone(),
            config.ledger.clone(),
        );
        Self {
            journals,
            reversals,
            receivables,
        }
    }

    /// Builds the services over a fresh [`MemoryStore`], returning the store too.
    #[must_use]
    pub fn in_memory(activity: Arc<dyn ActivitySink>, config: &AppConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Self::new(store.clone(), activity, config), store)
    }
}
