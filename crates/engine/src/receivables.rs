//! Invoices, payments, and their optional cash-receipt postings.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tally_core::accounts::Account;
use tally_core::ledger::LedgerError;
use tally_core::receivables::{
    AgingReport, Invoice, InvoiceFilter, InvoiceSummary, LedgerPostingError, NewInvoice,
    NewPayment, Payment, ReceivableError, ReceivableService,
};
use tally_shared::TenantContext;
use tally_shared::config::{LedgerConfig, ReceivablesConfig};
use tally_shared::types::{InvoiceId, JournalEntryId, PageRequest, PageResponse, TenantId};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::activity::{ActivityAction, ActivityDiff, ActivityEntity, ActivityRecord, ActivitySink};
use crate::deadline::within;
use crate::journal::{JournalService, store_failure as journal_store_failure};
use crate::store::{AccountRegistry, InvoiceStore, StoreError, UQ_INVOICE_NUMBER};

fn store_failure(err: StoreError) -> ReceivableError {
    ReceivableError::Store(err.to_string())
}

/// What happened to the ledger side of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LedgerPosting {
    /// No journal entry was requested.
    NotRequested,
    /// The cash-receipt entry was created posted.
    Posted {
        /// The posted entry.
        journal_entry_id: JournalEntryId,
    },
    /// The payment stands but the entry could not be posted.
    Failed {
        /// Why.
        #[serde(serialize_with = "serialize_display")]
        error: LedgerPostingError,
    },
}

fn serialize_display<S: serde::Serializer>(err: &LedgerPostingError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

impl LedgerPosting {
    /// Returns the posted entry id, if any.
    #[must_use]
    pub const fn journal_entry_id(&self) -> Option<JournalEntryId> {
        match self {
            Self::Posted { journal_entry_id } => Some(*journal_entry_id),
            Self::NotRequested | Self::Failed { .. } => None,
        }
    }
}

/// Result of applying a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentOutcome {
    /// The recorded payment.
    pub payment: Payment,
    /// The invoice after the payment.
    pub invoice: Invoice,
    /// Ledger side of the payment.
    pub ledger: LedgerPosting,
}

/// A page of invoices with totals over all outstanding matches.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceList {
    /// The requested page.
    pub page: PageResponse<Invoice>,
    /// Totals across every open or partial invoice matching the filter, ignoring status.
    pub summary: InvoiceSummary,
}

/// Accounts-receivable operations.
#[derive(Clone)]
pub struct ReceivablesService {
    invoices: Arc<dyn InvoiceStore>,
    accounts: Arc<dyn AccountRegistry>,
    journals: JournalService,
    activity: Arc<dyn ActivitySink>,
    config: ReceivablesConfig,
    ledger: LedgerConfig,
}

impl ReceivablesService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        accounts: Arc<dyn AccountRegistry>,
        journals: JournalService,
        activity: Arc<dyn ActivitySink>,
        config: ReceivablesConfig,
        ledger: LedgerConfig,
    ) -> Self {
        Self {
            invoices,
            accounts,
            journals,
            activity,
            config,
            ledger,
        }
    }

    fn deadline(&self, ctx: &TenantContext) -> std::time::Duration {
        ctx.timeout_or(self.ledger.operation_timeout())
    }

    /// Creates an open invoice.
    ///
    /// # Errors
    ///
    /// - `MissingInvoiceNumber`, `NonPositiveTotal`, `DueBeforeIssue`
    /// - `DuplicateNumber` if the number is taken in the tenant
    #[instrument(skip(self, input), fields(tenant_id = %ctx.tenant_id, invoice_number = %input.invoice_number))]
    pub async fn create_invoice(
        &self,
        ctx: &TenantContext,
        input: NewInvoice,
    ) -> Result<Invoice, ReceivableError> {
        within(
            self.deadline(ctx),
            async {
                ReceivableService::validate_new_invoice(&input)?;
                let invoice =
                    ReceivableService::open_invoice(ctx.tenant_id, ctx.actor_user_id, input, Utc::now());
                match self.invoices.insert_invoice(&invoice).await {
                    Ok(()) => {}
                    Err(err) if err.violates(UQ_INVOICE_NUMBER) => {
                        return Err(ReceivableError::DuplicateNumber(invoice.invoice_number));
                    }
                    Err(err) => return Err(store_failure(err)),
                }
                info!(invoice_id = %invoice.id, "invoice created");
                self.record(
                    ctx,
                    ActivityEntity::Invoice,
                    invoice.id.into_inner(),
                    ActivityAction::Created,
                    ActivityDiff::created(&invoice),
                );
                Ok(invoice)
            },
            ReceivableError::Timeout,
        )
        .await
    }

    /// Loads an invoice.
    ///
    /// # Errors
    ///
    /// `InvoiceNotFound` if it does not exist in the tenant.
    #[instrument(skip(self), fields(tenant_id = %ctx.tenant_id))]
    pub async fn get_invoice(&self, ctx: &TenantContext, id: InvoiceId) -> Result<Invoice, ReceivableError> {
        within(self.deadline(ctx), self.load(ctx.tenant_id, id), ReceivableError::Timeout).await
    }

    /// Applies a payment and optionally posts its cash-receipt entry.
    ///
    /// The payment and the invoice update commit together. The journal entry
    /// is a second step: if it fails the payment still stands and the
    /// failure is reported in [`PaymentOutcome::ledger`].
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound`
    /// - `Void`, `AlreadyPaid`, `InvalidAmount`, `ExceedsBalance`
    /// - `ConcurrentModification` after exhausting retries
    #[instrument(skip(self, input), fields(tenant_id = %ctx.tenant_id, invoice_id = %invoice_id, amount = %input.amount))]
    pub async fn apply_payment(
        &self,
        ctx: &TenantContext,
        invoice_id: InvoiceId,
        input: NewPayment,
    ) -> Result<PaymentOutcome, ReceivableError> {
        let (invoice, payment) = within(
            self.deadline(ctx),
            self.record_payment(ctx, invoice_id, &input),
            ReceivableError::Timeout,
        )
        .await?;

        let ledger = if input.post_journal_entry.unwrap_or(self.config.post_payments_by_default) {
            let posting = within(
                self.deadline(ctx),
                self.post_cash_receipt(ctx, &invoice, &payment),
                |ms| LedgerPostingError::Ledger(LedgerError::Timeout(ms)),
            );
            match posting.await {
                Ok(entry_id) => LedgerPosting::Posted {
                    journal_entry_id: entry_id,
                },
                Err(error) => {
                    warn!(payment_id = %payment.id, error = %error, "payment recorded but cash receipt not posted");
                    LedgerPosting::Failed { error }
                }
            }
        } else {
            LedgerPosting::NotRequested
        };

        Ok(PaymentOutcome {
            payment,
            invoice,
            ledger,
        })
    }

    async fn record_payment(
        &self,
        ctx: &TenantContext,
        invoice_id: InvoiceId,
        input: &NewPayment,
    ) -> Result<(Invoice, Payment), ReceivableError> {
        for attempt in 0..=self.ledger.max_write_retries {
            let current = self.load(ctx.tenant_id, invoice_id).await?;
            let (updated, payment) = ReceivableService::apply_payment(
                &current,
                input,
                ctx.actor_user_id,
                self.config.payment_tolerance,
                Utc::now(),
            )?;

            match self
                .invoices
                .record_payment(&updated, current.version, &payment)
                .await
            {
                Ok(()) => {
                    info!(
                        payment_id = %payment.id,
                        status = %updated.status,
                        balance_due = %updated.balance_due,
                        "payment applied"
                    );
                    self.record(
                        ctx,
                        ActivityEntity::Payment,
                        payment.id.into_inner(),
                        ActivityAction::Created,
                        ActivityDiff::created(&payment),
                    );
                    self.record(
                        ctx,
                        ActivityEntity::Invoice,
                        updated.id.into_inner(),
                        ActivityAction::Updated,
                        ActivityDiff::between(Some(&current), Some(&updated)),
                    );
                    return Ok((updated, payment));
                }
                Err(StoreError::StaleVersion) => {
                    debug!(attempt, "invoice changed during payment, retrying");
                }
                Err(err) => return Err(store_failure(err)),
            }
        }

        Err(ReceivableError::ConcurrentModification(invoice_id))
    }

    async fn post_cash_receipt(
        &self,
        ctx: &TenantContext,
        invoice: &Invoice,
        payment: &Payment,
    ) -> Result<JournalEntryId, LedgerPostingError> {
        let cash = self
            .posting_account(ctx.tenant_id, &self.config.cash_account_code)
            .await?;
        let ar = self
            .posting_account(ctx.tenant_id, &self.config.ar_account_code)
            .await?;
        let entry = ReceivableService::cash_receipt_entry(invoice, payment, cash.id, ar.id);
        let posted = self.journals.create_posted(ctx, entry).await?;
        Ok(posted.id)
    }

    async fn posting_account(&self, tenant_id: TenantId, code: &str) -> Result<Account, LedgerPostingError> {
        let account = self
            .accounts
            .find_account_by_code(tenant_id, code)
            .await
            .map_err(|err| LedgerPostingError::Ledger(journal_store_failure(err)))?
            .ok_or_else(|| LedgerPostingError::AccountMissing {
                code: code.to_string(),
            })?;
        if !account.is_active {
            return Err(LedgerPostingError::AccountInactive {
                code: code.to_string(),
            });
        }
        Ok(account)
    }

    /// Payments recorded against an invoice, oldest first.
    ///
    /// # Errors
    ///
    /// `InvoiceNotFound` if the invoice does not exist in the tenant.
    #[instrument(skip(self), fields(tenant_id = %ctx.tenant_id))]
    pub async fn list_payments(
        &self,
        ctx: &TenantContext,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, ReceivableError> {
        within(
            self.deadline(ctx),
            async {
                self.load(ctx.tenant_id, invoice_id).await?;
                self.invoices
                    .list_payments(ctx.tenant_id, invoice_id)
                    .await
                    .map_err(store_failure)
            },
            ReceivableError::Timeout,
        )
        .await
    }

    /// Voids an invoice that has no payments.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound`
    /// - `HasPayments`, then `AlreadyVoid`
    /// - `ConcurrentModification` after exhausting retries
    #[instrument(skip(self), fields(tenant_id = %ctx.tenant_id))]
    pub async fn void_invoice(&self, ctx: &TenantContext, id: InvoiceId) -> Result<Invoice, ReceivableError> {
        within(self.deadline(ctx), self.void_inner(ctx, id), ReceivableError::Timeout).await
    }

    async fn void_inner(&self, ctx: &TenantContext, id: InvoiceId) -> Result<Invoice, ReceivableError> {
        for attempt in 0..=self.ledger.max_write_retries {
            let current = self.load(ctx.tenant_id, id).await?;
            let count = self
                .invoices
                .count_payments(ctx.tenant_id, id)
                .await
                .map_err(store_failure)?;
            ReceivableService::check_void(&current, count)?;

            let voided = ReceivableService::voided(&current, Utc::now());
            match self.invoices.update_invoice(&voided, current.version).await {
                Ok(()) => {
                    info!(invoice_id = %id, "invoice voided");
                    self.record(
                        ctx,
                        ActivityEntity::Invoice,
                        id.into_inner(),
                        ActivityAction::Voided,
                        ActivityDiff::between(Some(&current), Some(&voided)),
                    );
                    return Ok(voided);
                }
                Err(StoreError::StaleVersion) => {
                    debug!(attempt, "invoice changed during void, retrying");
                }
                Err(err) => return Err(store_failure(err)),
            }
        }

        Err(ReceivableError::ConcurrentModification(id))
    }

    /// Lists invoices with outstanding totals computed as of today (UTC).
    ///
    /// # Errors
    ///
    /// Returns `Store` or `Timeout`.
    pub async fn list_invoices(
        &self,
        ctx: &TenantContext,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> Result<InvoiceList, ReceivableError> {
        self.list_invoices_as_of(ctx, filter, page, Utc::now().date_naive())
            .await
    }

    /// Lists invoices with outstanding totals computed as of `today`.
    ///
    /// # Errors
    ///
    /// Returns `Store` or `Timeout`.
    #[instrument(skip(self, filter), fields(tenant_id = %ctx.tenant_id))]
    pub async fn list_invoices_as_of(
        &self,
        ctx: &TenantContext,
        filter: &InvoiceFilter,
        page: PageRequest,
        today: NaiveDate,
    ) -> Result<InvoiceList, ReceivableError> {
        within(
            self.deadline(ctx),
            async {
                let (rows, total) = self
                    .invoices
                    .list_invoices(ctx.tenant_id, filter, &page)
                    .await
                    .map_err(store_failure)?;
                let outstanding = self
                    .invoices
                    .outstanding_invoices(ctx.tenant_id, filter)
                    .await
                    .map_err(store_failure)?;
                Ok(InvoiceList {
                    page: PageResponse::for_request(rows, &page, total),
                    summary: InvoiceSummary::build(&outstanding, today),
                })
            },
            ReceivableError::Timeout,
        )
        .await
    }

    /// Aging of outstanding balances as of today (UTC).
    ///
    /// # Errors
    ///
    /// Returns `Store` or `Timeout`.
    pub async fn get_aging(&self, ctx: &TenantContext) -> Result<AgingReport, ReceivableError> {
        self.get_aging_as_of(ctx, Utc::now().date_naive()).await
    }

    /// Aging of outstanding balances as of `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `Store` or `Timeout`.
    #[instrument(skip(self), fields(tenant_id = %ctx.tenant_id))]
    pub async fn get_aging_as_of(
        &self,
        ctx: &TenantContext,
        as_of: NaiveDate,
    ) -> Result<AgingReport, ReceivableError> {
        within(
            self.deadline(ctx),
            async {
                let outstanding = self
                    .invoices
                    .outstanding_invoices(ctx.tenant_id, &InvoiceFilter::default())
                    .await
                    .map_err(store_failure)?;
                Ok(AgingReport::build(&outstanding, as_of))
            },
            ReceivableError::Timeout,
        )
        .await
    }

    async fn load(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Invoice, ReceivableError> {
        self.invoices
            .get_invoice(tenant_id, id)
            .await
            .map_err(store_failure)?
            .ok_or(ReceivableError::InvoiceNotFound(id))
    }

    fn record(
        &self,
        ctx: &TenantContext,
        entity: ActivityEntity,
        entity_id: Uuid,
        action: ActivityAction,
        diff: ActivityDiff,
    ) {
        self.activity
            .record(ActivityRecord::new(ctx, entity, entity_id, action, diff));
    }
}
