//! Journal entry store operations: create, edit, post, delete, and queries.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tally_core::accounts::Account;
use tally_core::ledger::validation::validate_journal_number;
use tally_core::ledger::{
    JournalEntry, JournalEntryDetail, JournalFilter, JournalHeaderPatch, JournalLine,
    JournalLineDetail, JournalLineInput, JournalStatus, JournalSummary, LedgerError, LedgerService,
    NewJournalEntry, validate_line_set,
};
use tally_shared::TenantContext;
use tally_shared::config::LedgerConfig;
use tally_shared::types::{AccountId, JournalEntryId, PageRequest, PageResponse, TenantId};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::activity::{ActivityAction, ActivityDiff, ActivityEntity, ActivityRecord, ActivitySink};
use crate::deadline::within;
use crate::store::{AccountRegistry, JournalStore, StoreError, UQ_JOURNAL_NUMBER};

pub(crate) fn store_failure(err: StoreError) -> LedgerError {
    LedgerError::Store(err.to_string())
}

/// Journal entry operations over a [`JournalStore`].
#[derive(Clone)]
pub struct JournalService {
    store: Arc<dyn JournalStore>,
    accounts: Arc<dyn AccountRegistry>,
    activity: Arc<dyn ActivitySink>,
    config: LedgerConfig,
}

impl JournalService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        store: Arc<dyn JournalStore>,
        accounts: Arc<dyn AccountRegistry>,
        activity: Arc<dyn ActivitySink>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            accounts,
            activity,
            config,
        }
    }

    fn deadline(&self, ctx: &TenantContext) -> Duration {
        ctx.timeout_or(self.config.operation_timeout())
    }

    /// Creates a draft entry.
    ///
    /// # Errors
    ///
    /// - `Validation` if the number or the line set is malformed
    /// - `AccountNotFound` / `AccountInactive` for unusable accounts
    /// - `DuplicateNumber` if the number is taken in the tenant
    #[instrument(skip(self, input), fields(tenant_id = %ctx.tenant_id, journal_number = %input.journal_number))]
    pub async fn create(
        &self,
        ctx: &TenantContext,
        input: NewJournalEntry,
    ) -> Result<JournalEntry, LedgerError> {
        within(
            self.deadline(ctx),
            self.insert_new(ctx, input, JournalStatus::Draft),
            LedgerError::Timeout,
        )
        .await
    }

    /// Creates an entry directly in `posted`, in one write.
    ///
    /// Only for entries the engine generates itself, such as payment cash
    /// receipts. Callers go through draft and [`Self::post`].
    ///
    /// # Errors
    ///
    /// As [`Self::create`], plus `Unbalanced`.
    #[instrument(skip(self, input), fields(tenant_id = %ctx.tenant_id, journal_number = %input.journal_number))]
    pub(crate) async fn create_posted(
        &self,
        ctx: &TenantContext,
        input: NewJournalEntry,
    ) -> Result<JournalEntry, LedgerError> {
        within(
            self.deadline(ctx),
            self.insert_new(ctx, input, JournalStatus::Posted),
            LedgerError::Timeout,
        )
        .await
    }

    async fn insert_new(
        &self,
        ctx: &TenantContext,
        input: NewJournalEntry,
        status: JournalStatus,
    ) -> Result<JournalEntry, LedgerError> {
        validate_journal_number(&input.journal_number)?;
        validate_line_set(&input.lines)?;
        let accounts = self.resolve_accounts(ctx.tenant_id, &input.lines).await?;
        LedgerService::validate_draft(&input, |id| accounts.get(&id).cloned())?;

        if self
            .store
            .journal_number_exists(ctx.tenant_id, &input.journal_number)
            .await
            .map_err(store_failure)?
        {
            return Err(LedgerError::DuplicateNumber(input.journal_number));
        }

        let now = Utc::now();
        let mut entry = JournalEntry {
            id: JournalEntryId::new(),
            tenant_id: ctx.tenant_id,
            journal_number: input.journal_number,
            date: input.date,
            memo: input.memo,
            status: JournalStatus::Draft,
            posted_at: None,
            reversed_from: None,
            created_by: ctx.actor_user_id,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        let lines = JournalLine::from_inputs(entry.id, input.lines);

        if status == JournalStatus::Posted {
            LedgerService::validate_can_post(&entry, &lines, self.config.balance_tolerance)?;
            entry.status = JournalStatus::Posted;
            entry.posted_at = Some(now);
        }

        self.store
            .insert_entry(&entry, &lines)
            .await
            .map_err(|err| {
                if err.violates(UQ_JOURNAL_NUMBER) {
                    LedgerError::DuplicateNumber(entry.journal_number.clone())
                } else {
                    store_failure(err)
                }
            })?;

        debug!(journal_id = %entry.id, status = %entry.status, "journal entry created");
        self.record(ctx, &entry, ActivityAction::Created, ActivityDiff::created(&entry));
        Ok(entry)
    }

    /// Edits a draft: header fields and/or a full replacement of the lines.
    ///
    /// # Errors
    ///
    /// - `NotFound`, `NotDraft`
    /// - `Validation`, `AccountNotFound`, `AccountInactive` for replacement lines
    /// - `DuplicateNumber` if the new number is taken
    /// - `ConcurrentModification` after exhausting retries
    #[instrument(skip(self, patch, lines), fields(tenant_id = %ctx.tenant_id, journal_id = %id))]
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: JournalEntryId,
        patch: JournalHeaderPatch,
        lines: Option<Vec<JournalLineInput>>,
    ) -> Result<JournalEntry, LedgerError> {
        within(
            self.deadline(ctx),
            self.update_inner(ctx, id, patch, lines),
            LedgerError::Timeout,
        )
        .await
    }

    async fn update_inner(
        &self,
        ctx: &TenantContext,
        id: JournalEntryId,
        patch: JournalHeaderPatch,
        lines: Option<Vec<JournalLineInput>>,
    ) -> Result<JournalEntry, LedgerError> {
        if let Some(number) = &patch.journal_number {
            validate_journal_number(number)?;
        }
        if let Some(lines) = &lines {
            let accounts = self.resolve_accounts(ctx.tenant_id, lines).await?;
            LedgerService::validate_lines(lines, |account_id| accounts.get(&account_id).cloned())?;
        }

        for attempt in 0..=self.config.max_write_retries {
            let current = self
                .store
                .get_entry(ctx.tenant_id, id)
                .await
                .map_err(store_failure)?
                .ok_or(LedgerError::NotFound(id))?;
            LedgerService::validate_can_modify(&current.entry)?;

            if let Some(number) = &patch.journal_number
                && *number != current.entry.journal_number
                && self
                    .store
                    .journal_number_exists(ctx.tenant_id, number)
                    .await
                    .map_err(store_failure)?
            {
                return Err(LedgerError::DuplicateNumber(number.clone()));
            }

            let mut next = current.entry.clone();
            patch.apply_to(&mut next);
            next.updated_at = Utc::now();
            next.version += 1;
            let replacement = lines
                .as_ref()
                .map(|inputs| JournalLine::from_inputs(id, inputs.clone()));

            match self
                .store
                .update_entry(&next, current.entry.version, replacement.as_deref())
                .await
            {
                Ok(()) => {
                    self.record(
                        ctx,
                        &next,
                        ActivityAction::Updated,
                        ActivityDiff::between(Some(&current.entry), Some(&next)),
                    );
                    return Ok(next);
                }
                Err(StoreError::StaleVersion) => {
                    debug!(attempt, "journal entry changed during update, retrying");
                }
                Err(err) if err.violates(UQ_JOURNAL_NUMBER) => {
                    return Err(LedgerError::DuplicateNumber(next.journal_number));
                }
                Err(err) => return Err(store_failure(err)),
            }
        }

        Err(LedgerError::ConcurrentModification(id))
    }

    /// Posts a draft after recomputing its balance from the stored lines.
    ///
    /// # Errors
    ///
    /// - `NotFound`, `NotDraft`
    /// - `Unbalanced` if debits and credits differ by the tolerance or more
    /// - `ConcurrentModification` after exhausting retries
    #[instrument(skip(self), fields(tenant_id = %ctx.tenant_id, journal_id = %id))]
    pub async fn post(&self, ctx: &TenantContext, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        within(self.deadline(ctx), self.post_inner(ctx, id), LedgerError::Timeout).await
    }

    async fn post_inner(&self, ctx: &TenantContext, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        for attempt in 0..=self.config.max_write_retries {
            let current = self
                .store
                .get_entry(ctx.tenant_id, id)
                .await
                .map_err(store_failure)?
                .ok_or(LedgerError::NotFound(id))?;

            let totals = LedgerService::validate_can_post(
                &current.entry,
                &current.lines,
                self.config.balance_tolerance,
            )?;

            let now = Utc::now();
            let mut next = current.entry.clone();
            next.status = JournalStatus::Posted;
            next.posted_at = Some(now);
            next.updated_at = now;
            next.version += 1;

            match self.store.update_entry(&next, current.entry.version, None).await {
                Ok(()) => {
                    debug!(total = %totals.debit, "journal entry posted");
                    self.record(
                        ctx,
                        &next,
                        ActivityAction::Posted,
                        ActivityDiff::between(Some(&current.entry), Some(&next)),
                    );
                    return Ok(next);
                }
                Err(StoreError::StaleVersion) => {
                    debug!(attempt, "journal entry changed during post, retrying");
                }
                Err(err) => return Err(store_failure(err)),
            }
        }

        Err(LedgerError::ConcurrentModification(id))
    }

    /// Deletes a draft and its lines.
    ///
    /// # Errors
    ///
    /// - `NotFound`, `NotDraft`
    /// - `ConcurrentModification` after exhausting retries
    #[instrument(skip(self), fields(tenant_id = %ctx.tenant_id, journal_id = %id))]
    pub async fn delete(&self, ctx: &TenantContext, id: JournalEntryId) -> Result<(), LedgerError> {
        within(self.deadline(ctx), self.delete_inner(ctx, id), LedgerError::Timeout).await
    }

    async fn delete_inner(&self, ctx: &TenantContext, id: JournalEntryId) -> Result<(), LedgerError> {
        for attempt in 0..=self.config.max_write_retries {
            let current = self
                .store
                .get_entry(ctx.tenant_id, id)
                .await
                .map_err(store_failure)?
                .ok_or(LedgerError::NotFound(id))?;
            LedgerService::validate_can_modify(&current.entry)?;

            match self
                .store
                .delete_entry(ctx.tenant_id, id, current.entry.version)
                .await
            {
                Ok(()) => {
                    self.record(
                        ctx,
                        &current.entry,
                        ActivityAction::Deleted,
                        ActivityDiff::between::<_, JournalEntry>(Some(&current), None),
                    );
                    return Ok(());
                }
                Err(StoreError::StaleVersion) => {
                    debug!(attempt, "journal entry changed during delete, retrying");
                }
                Err(err) => return Err(store_failure(err)),
            }
        }

        Err(LedgerError::ConcurrentModification(id))
    }

    /// Lists entries with derived totals, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Store` or `Timeout`.
    #[instrument(skip(self, filter), fields(tenant_id = %ctx.tenant_id))]
    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: &JournalFilter,
        page: PageRequest,
    ) -> Result<PageResponse<JournalSummary>, LedgerError> {
        within(
            self.deadline(ctx),
            async {
                let (rows, total) = self
                    .store
                    .list_entries(ctx.tenant_id, filter, &page)
                    .await
                    .map_err(store_failure)?;
                Ok(PageResponse::for_request(rows, &page, total))
            },
            LedgerError::Timeout,
        )
        .await
    }

    /// Loads an entry with its ordered lines joined to their accounts.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the entry is not in the tenant.
    #[instrument(skip(self), fields(tenant_id = %ctx.tenant_id, journal_id = %id))]
    pub async fn get(&self, ctx: &TenantContext, id: JournalEntryId) -> Result<JournalEntryDetail, LedgerError> {
        within(
            self.deadline(ctx),
            async {
                let found = self
                    .store
                    .get_entry(ctx.tenant_id, id)
                    .await
                    .map_err(store_failure)?
                    .ok_or(LedgerError::NotFound(id))?;
                let totals = found.totals();

                let ids: Vec<AccountId> = found.lines.iter().map(|l| l.account_id).collect();
                let accounts = self.load_accounts(ctx.tenant_id, &ids).await?;
                let lines = found
                    .lines
                    .into_iter()
                    .map(|line| JournalLineDetail {
                        account: accounts.get(&line.account_id).cloned(),
                        line,
                    })
                    .collect();

                Ok(JournalEntryDetail {
                    entry: found.entry,
                    lines,
                    totals,
                })
            },
            LedgerError::Timeout,
        )
        .await
    }

    /// Entries with a line referencing `(reference_type, reference_id)`.
    ///
    /// # Errors
    ///
    /// Returns `Store` or `Timeout`.
    #[instrument(skip(self), fields(tenant_id = %ctx.tenant_id))]
    pub async fn entries_for_reference(
        &self,
        ctx: &TenantContext,
        reference_type: &str,
        reference_id: Uuid,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        within(
            self.deadline(ctx),
            async {
                self.store
                    .entries_for_reference(ctx.tenant_id, reference_type, reference_id)
                    .await
                    .map_err(store_failure)
            },
            LedgerError::Timeout,
        )
        .await
    }

    async fn resolve_accounts(
        &self,
        tenant_id: TenantId,
        lines: &[JournalLineInput],
    ) -> Result<HashMap<AccountId, Account>, LedgerError> {
        let ids: Vec<AccountId> = lines.iter().map(|l| l.account_id).collect();
        self.load_accounts(tenant_id, &ids).await
    }

    async fn load_accounts(
        &self,
        tenant_id: TenantId,
        ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Account>, LedgerError> {
        let unique: Vec<AccountId> = ids
            .iter()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let accounts = self
            .accounts
            .get_accounts(tenant_id, &unique)
            .await
            .map_err(store_failure)?;
        Ok(accounts.into_iter().map(|a| (a.id, a)).collect())
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
