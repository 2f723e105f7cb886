//! Accounts-receivable domain types: invoices, payments, and list filters.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{CustomerId, InvoiceId, PaymentId, TenantId, UserId};

/// Invoice status.
///
/// `open`, `partial` and `paid` are derived from the amounts; `void` is an
/// explicit terminal override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Nothing paid yet.
    Open,
    /// Partially paid.
    Partial,
    /// Fully settled.
    Paid,
    /// Cancelled before any payment.
    Void,
}

impl InvoiceStatus {
    /// Returns the lowercase storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Void => "void",
        }
    }

    /// Returns true if the invoice still has a balance to collect.
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::Open | Self::Partial)
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "partial" => Ok(Self::Partial),
            "paid" => Ok(Self::Paid),
            "void" => Ok(Self::Void),
            _ => Err(format!("Unknown invoice status: {s}")),
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Paper check.
    Check,
    /// Bank transfer.
    BankTransfer,
    /// Card payment.
    Card,
    /// Anything else.
    Other,
}

impl PaymentMethod {
    /// Returns the snake_case storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Check => "check",
            Self::BankTransfer => "bank_transfer",
            Self::Card => "card",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "check" => Ok(Self::Check),
            "bank_transfer" => Ok(Self::BankTransfer),
            "card" => Ok(Self::Card),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown payment method: {s}")),
        }
    }
}

/// An AR invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier.
    pub id: InvoiceId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Invoice number, unique per tenant.
    pub invoice_number: String,
    /// Billed customer.
    pub customer_id: CustomerId,
    /// Issue date.
    pub date_issued: NaiveDate,
    /// Due date, never before the issue date.
    pub due_date: NaiveDate,
    /// Invoiced amount, strictly positive.
    pub amount_total: Decimal,
    /// Sum of applied payments.
    pub amount_paid: Decimal,
    /// `amount_total - amount_paid`.
    pub balance_due: Decimal,
    /// Current status.
    pub status: InvoiceStatus,
    /// Optional memo.
    pub memo: Option<String>,
    /// User who created the invoice.
    pub created_by: UserId,
    /// When the invoice was created.
    pub created_at: DateTime<Utc>,
    /// When the invoice was last updated.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency counter.
    pub version: i64,
}

impl Invoice {
    /// Days past due as of `as_of`; zero or negative when not yet due.
    #[must_use]
    pub fn days_past_due(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.due_date).num_days()
    }

    /// Returns true if the invoice is outstanding and its due date has passed.
    #[must_use]
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.status.is_outstanding() && self.due_date < as_of
    }
}

/// An applied payment. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier.
    pub id: PaymentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Settled invoice.
    pub invoice_id: InvoiceId,
    /// Paying customer (copied from the invoice).
    pub customer_id: CustomerId,
    /// Date the payment was received.
    pub payment_date: NaiveDate,
    /// Amount, strictly positive.
    pub amount: Decimal,
    /// Payment method.
    pub method: PaymentMethod,
    /// External reference such as a check number.
    pub reference: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// User who recorded the payment.
    pub created_by: UserId,
    /// When the payment was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for creating an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    /// Invoice number, unique per tenant.
    pub invoice_number: String,
    /// Billed customer.
    pub customer_id: CustomerId,
    /// Issue date.
    pub date_issued: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Invoiced amount.
    pub amount_total: Decimal,
    /// Optional memo.
    pub memo: Option<String>,
}

/// Input for applying a payment to an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Amount to apply.
    pub amount: Decimal,
    /// Date the payment was received.
    pub payment_date: NaiveDate,
    /// Payment method.
    pub method: PaymentMethod,
    /// External reference.
    pub reference: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Whether to post a cash-receipt journal entry. `None` uses the configured default.
    pub post_journal_entry: Option<bool>,
}

impl NewPayment {
    /// Creates a payment input with no reference or notes.
    #[must_use]
    pub const fn new(amount: Decimal, payment_date: NaiveDate, method: PaymentMethod) -> Self {
        Self {
            amount,
            payment_date,
            method,
            reference: None,
            notes: None,
            post_journal_entry: None,
        }
    }

    /// Sets the external reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Requests (or suppresses) the cash-receipt journal entry.
    #[must_use]
    pub const fn posting(mut self, post: bool) -> Self {
        self.post_journal_entry = Some(post);
        self
    }
}

/// Filters for listing invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    /// Case-insensitive substring of `invoice_number` or `memo`.
    pub search: Option<String>,
    /// Filter by status.
    pub status: Option<InvoiceStatus>,
    /// Filter by customer.
    pub customer_id: Option<CustomerId>,
    /// Issue date range start (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Issue date range end (inclusive).
    pub date_to: Option<NaiveDate>,
}

impl InvoiceFilter {
    /// Returns true if `invoice` passes every filter.
    #[must_use]
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.status.is_none_or(|status| invoice.status == status)
            && self.matches_ignoring_status(invoice)
    }

    /// Returns true if `invoice` passes every filter except `status`.
    ///
    /// Used for summaries, which always aggregate over outstanding invoices.
    #[must_use]
    pub fn matches_ignoring_status(&self, invoice: &Invoice) -> bool {
        if self
            .customer_id
            .is_some_and(|customer| invoice.customer_id != customer)
        {
            return false;
        }
        if self.date_from.is_some_and(|from| invoice.date_issued < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| invoice.date_issued > to) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                invoice.invoice_number.to_lowercase().contains(&needle)
                    || invoice
                        .memo
                        .as_deref()
                        .is_some_and(|memo| memo.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}
