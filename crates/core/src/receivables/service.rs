//! Receivable rules: invoice validation, payment application, voiding, and
//! the cash-receipt entry a payment produces.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, InvoiceId, PaymentId, TenantId, UserId};

use super::error::ReceivableError;
use super::types::{Invoice, InvoiceStatus, NewInvoice, NewPayment, Payment};
use crate::ledger::types::{JournalLineInput, NewJournalEntry, REFERENCE_AR_PAYMENT};
use crate::ledger::validation::exceeds_amount_scale;

/// Default tolerance under which a remaining balance counts as settled.
pub const DEFAULT_PAYMENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Stateless receivable rules.
pub struct ReceivableService;

impl ReceivableService {
    /// Derives the status of a non-void invoice from its amounts.
    ///
    /// - `paid` if the remaining balance is within `tolerance`
    /// - `partial` if anything has been paid
    /// - `open` otherwise
    #[must_use]
    pub fn derive_status(amount_total: Decimal, amount_paid: Decimal, tolerance: Decimal) -> InvoiceStatus {
        if amount_total - amount_paid <= tolerance {
            InvoiceStatus::Paid
        } else if amount_paid > Decimal::ZERO {
            InvoiceStatus::Partial
        } else {
            InvoiceStatus::Open
        }
    }

    /// Validates invoice input.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank number, a non-positive total, a
    /// total with more than four decimal places, or a due date before the issue date.
    pub fn validate_new_invoice(input: &NewInvoice) -> Result<(), ReceivableError> {
        if input.invoice_number.trim().is_empty() {
            return Err(ReceivableError::MissingInvoiceNumber);
        }
        if input.amount_total <= Decimal::ZERO {
            return Err(ReceivableError::NonPositiveTotal(input.amount_total));
        }
        if exceeds_amount_scale(input.amount_total) {
            return Err(ReceivableError::ScaleTooLarge(input.amount_total));
        }
        if input.due_date < input.date_issued {
            return Err(ReceivableError::DueBeforeIssue {
                date_issued: input.date_issued,
                due_date: input.due_date,
            });
        }
        Ok(())
    }

    /// Builds a new open invoice from validated input.
    #[must_use]
    pub fn open_invoice(
        tenant_id: TenantId,
        created_by: UserId,
        input: NewInvoice,
        now: DateTime<Utc>,
    ) -> Invoice {
        Invoice {
            id: InvoiceId::new(),
            tenant_id,
            invoice_number: input.invoice_number,
            customer_id: input.customer_id,
            date_issued: input.date_issued,
            due_date: input.due_date,
            amount_total: input.amount_total,
            amount_paid: Decimal::ZERO,
            balance_due: input.amount_total,
            status: InvoiceStatus::Open,
            memo: input.memo,
            created_by,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Checks that `amount` can be applied to `invoice`.
    ///
    /// # Errors
    ///
    /// In order: `Void`, `AlreadyPaid`, `InvalidAmount`, `ScaleTooLarge`, `ExceedsBalance`.
    pub fn check_payment(invoice: &Invoice, amount: Decimal) -> Result<(), ReceivableError> {
        match invoice.status {
            InvoiceStatus::Void => return Err(ReceivableError::Void(invoice.id)),
            InvoiceStatus::Paid => return Err(ReceivableError::AlreadyPaid(invoice.id)),
            InvoiceStatus::Open | InvoiceStatus::Partial => {}
        }
        if amount <= Decimal::ZERO {
            return Err(ReceivableError::InvalidAmount(amount));
        }
        if exceeds_amount_scale(amount) {
            return Err(ReceivableError::ScaleTooLarge(amount));
        }
        if amount > invoice.balance_due {
            return Err(ReceivableError::ExceedsBalance {
                amount,
                balance_due: invoice.balance_due,
            });
        }
        Ok(())
    }

    /// Applies a payment to an invoice snapshot.
    ///
    /// Returns the updated invoice (version bumped) and the payment record.
    ///
    /// # Errors
    ///
    /// See [`Self::check_payment`].
    pub fn apply_payment(
        invoice: &Invoice,
        input: &NewPayment,
        created_by: UserId,
        tolerance: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(Invoice, Payment), ReceivableError> {
        Self::check_payment(invoice, input.amount)?;

        let mut updated = invoice.clone();
        updated.amount_paid += input.amount;
        updated.balance_due = updated.amount_total - updated.amount_paid;
        updated.status = Self::derive_status(updated.amount_total, updated.amount_paid, tolerance);
        updated.updated_at = now;
        updated.version += 1;

        let payment = Payment {
            id: PaymentId::new(),
            tenant_id: invoice.tenant_id,
            invoice_id: invoice.id,
            customer_id: invoice.customer_id,
            payment_date: input.payment_date,
            amount: input.amount,
            method: input.method,
            reference: input.reference.clone(),
            notes: input.notes.clone(),
            created_by,
            created_at: now,
        };

        Ok((updated, payment))
    }

    /// Checks that an invoice can be voided.
    ///
    /// # Errors
    ///
    /// `HasPayments` if any payment exists, then `AlreadyVoid`.
    pub fn check_void(invoice: &Invoice, payment_count: usize) -> Result<(), ReceivableError> {
        if payment_count > 0 {
            return Err(ReceivableError::HasPayments {
                invoice_id: invoice.id,
                count: payment_count,
            });
        }
        if invoice.status == InvoiceStatus::Void {
            return Err(ReceivableError::AlreadyVoid(invoice.id));
        }
        Ok(())
    }

    /// Returns a voided copy of the invoice, version bumped.
    #[must_use]
    pub fn voided(invoice: &Invoice, now: DateTime<Utc>) -> Invoice {
        let mut updated = invoice.clone();
        updated.status = InvoiceStatus::Void;
        updated.updated_at = now;
        updated.version += 1;
        updated
    }

    /// Builds the cash-receipt entry for a payment: debit cash, credit AR.
    ///
    /// Both lines reference the payment.
    #[must_use]
    pub fn cash_receipt_entry(
        invoice: &Invoice,
        payment: &Payment,
        cash_account: AccountId,
        ar_account: AccountId,
    ) -> NewJournalEntry {
        let reference = payment.id.into_inner();
        let description = format!("Payment for invoice {}", invoice.invoice_number);
        NewJournalEntry {
            journal_number: format!("PMT-{}", payment.id),
            date: payment.payment_date,
            memo: Some(format!(
                "Payment received for invoice {} ({})",
                invoice.invoice_number, payment.method
            )),
            lines: vec![
                JournalLineInput::debit(cash_account, payment.amount)
                    .with_description(description.clone())
                    .with_reference(REFERENCE_AR_PAYMENT, reference),
                JournalLineInput::credit(ar_account, payment.amount)
                    .with_description(description)
                    .with_reference(REFERENCE_AR_PAYMENT, reference),
            ],
        }
    }
}
