//! Reversal engine: negates a posted entry with a new posted entry.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tally_core::ledger::{
    JournalEntry, JournalLine, JournalStatus, LedgerError, LedgerService, ReversalService,
};
use tally_shared::TenantContext;
use tally_shared::config::LedgerConfig;
use tally_shared::types::{JournalEntryId, TenantId};
use tracing::{debug, info, instrument};

use crate::activity::{ActivityAction, ActivityDiff, ActivityEntity, ActivityRecord, ActivitySink};
use crate::deadline::within;
use crate::journal::store_failure;
use crate::store::{JournalStore, StoreError, UQ_JOURNAL_NUMBER, UQ_REVERSED_FROM};

/// How many numbers are tried before giving up on a free reversal number.
const MAX_NUMBER_ATTEMPTS: u32 = 20;

/// Creates reversal entries.
#[derive(Clone)]
pub struct ReversalEngine {
    store: Arc<dyn JournalStore>,
    activity: Arc<dyn ActivitySink>,
    config: LedgerConfig,
}

impl ReversalEngine {
    /// Creates the engine.
    #[must_use]
    pub fn new(store: Arc<dyn JournalStore>, activity: Arc<dyn ActivitySink>, config: LedgerConfig) -> Self {
        Self {
            store,
            activity,
            config,
        }
    }

    /// Reverses a posted entry.
    ///
    /// The reversal is posted immediately, numbered `{original}-REV` (or the
    /// first free `-REV-n`), and links back through `reversed_from`. Inserting
    /// it and flipping the original to `reversed` is one write.
    ///
    /// # Errors
    ///
    /// - `NotFound`
    /// - `AlreadyReversed` if the original is reversed or a reversal exists
    /// - `NotPosted` if the original is a draft
    /// - `ConcurrentModification` after exhausting retries
    #[instrument(skip(self, memo), fields(tenant_id = %ctx.tenant_id, journal_id = %original_id))]
    pub async fn reverse(
        &self,
        ctx: &TenantContext,
        original_id: JournalEntryId,
        date: NaiveDate,
        memo: Option<String>,
    ) -> Result<JournalEntry, LedgerError> {
        within(
            ctx.timeout_or(self.config.operation_timeout()),
            self.reverse_inner(ctx, original_id, date, memo),
            LedgerError::Timeout,
        )
        .await
    }

    async fn reverse_inner(
        &self,
        ctx: &TenantContext,
        original_id: JournalEntryId,
        date: NaiveDate,
        memo: Option<String>,
    ) -> Result<JournalEntry, LedgerError> {
        for attempt in 0..=self.config.max_write_retries {
            let original = self
                .store
                .get_entry(ctx.tenant_id, original_id)
                .await
                .map_err(store_failure)?
                .ok_or(LedgerError::NotFound(original_id))?;
            let existing = self
                .store
                .find_reversal_of(ctx.tenant_id, original_id)
                .await
                .map_err(store_failure)?;
            LedgerService::validate_can_reverse(&original.entry, existing.as_ref())?;

            let mut plan = ReversalService::plan(
                &original.entry.journal_number,
                &original.lines,
                &self.config.reversal_suffix,
                date,
                memo.clone(),
            );
            plan.journal_number = self
                .free_number(ctx.tenant_id, &original.entry.journal_number)
                .await?;

            let now = Utc::now();
            let reversal = JournalEntry {
                id: JournalEntryId::new(),
                tenant_id: ctx.tenant_id,
                journal_number: plan.journal_number,
                date: plan.date,
                memo: Some(plan.memo),
                status: JournalStatus::Posted,
                posted_at: Some(now),
                reversed_from: Some(original_id),
                created_by: ctx.actor_user_id,
                created_at: now,
                updated_at: now,
                version: 1,
            };
            let lines = JournalLine::from_inputs(reversal.id, plan.lines);

            let mut flipped = original.entry.clone();
            flipped.status = JournalStatus::Reversed;
            flipped.updated_at = now;
            flipped.version += 1;

            match self
                .store
                .insert_reversal(&reversal, &lines, &flipped, original.entry.version)
                .await
            {
                Ok(()) => {
                    info!(
                        reversal_id = %reversal.id,
                        journal_number = %reversal.journal_number,
                        "journal entry reversed"
                    );
                    self.record(ctx, &reversal, ActivityAction::Created, ActivityDiff::created(&reversal));
                    self.record(
                        ctx,
                        &flipped,
                        ActivityAction::Reversed,
                        ActivityDiff::between(Some(&original.entry), Some(&flipped)),
                    );
                    return Ok(reversal);
                }
                Err(err) if err.violates(UQ_REVERSED_FROM) => {
                    return Err(LedgerError::AlreadyReversed(original_id));
                }
                Err(StoreError::StaleVersion) => {
                    debug!(attempt, "original changed during reversal, retrying");
                }
                Err(err) if err.violates(UQ_JOURNAL_NUMBER) => {
                    debug!(attempt, "reversal number taken concurrently, retrying");
                }
                Err(err) => return Err(store_failure(err)),
            }
        }

        Err(LedgerError::ConcurrentModification(original_id))
    }

    async fn free_number(&self, tenant_id: TenantId, original_number: &str) -> Result<String, LedgerError> {
        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let candidate =
                ReversalService::reversal_number(original_number, &self.config.reversal_suffix, attempt);
            if !self
                .store
                .journal_number_exists(tenant_id, &candidate)
                .await
                .map_err(store_failure)?
            {
                return Ok(candidate);
            }
        }
        Err(LedgerError::DuplicateNumber(ReversalService::reversal_number(
            original_number,
            &self.config.reversal_suffix,
            MAX_NUMBER_ATTEMPTS,
        )))
    }

    fn record(&self, ctx: &TenantContext, entry: &JournalEntry, action: ActivityAction, diff: ActivityDiff) {
        self.activity.record(ActivityRecord::new(
            ctx,
            ActivityEntity::JournalEntry,
            entry.id.into_inner(),
            action,
            diff,
        ));
    }
}
