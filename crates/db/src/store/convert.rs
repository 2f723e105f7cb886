//! Row ↔ domain conversions.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::ActiveValue::Set;
use tally_core::accounts::Account;
use tally_core::ledger::{JournalEntry, JournalLine};
use tally_core::receivables::{Invoice, Payment};
use tally_engine::store::{StoreError, StoreResult};

use crate::entities::{accounts, ar_invoices, ar_payments, journal_entries, journal_lines};

type DateTimeWithTz = DateTime<FixedOffset>;

fn utc(at: DateTimeWithTz) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

fn parse<T: std::str::FromStr<Err = String>>(value: &str) -> StoreResult<T> {
    value.parse().map_err(StoreError::Backend)
}

pub(crate) fn account(row: accounts::Model) -> StoreResult<Account> {
    Ok(Account {
        id: row.id.into(),
        tenant_id: row.tenant_id.into(),
        code: row.code,
        name: row.name,
        account_type: parse(&row.account_type)?,
        is_active: row.is_active,
    })
}

pub(crate) fn entry(row: journal_entries::Model) -> StoreResult<JournalEntry> {
    Ok(JournalEntry {
        id: row.id.into(),
        tenant_id: row.tenant_id.into(),
        journal_number: row.journal_number,
        date: row.date,
        memo: row.memo,
        status: parse(&row.status)?,
        posted_at: row.posted_at.map(utc),
        reversed_from: row.reversed_from.map(Into::into),
        created_by: row.created_by.into(),
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
        version: row.version,
    })
}

pub(crate) fn entry_model(entry: &JournalEntry) -> journal_entries::ActiveModel {
    journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        tenant_id: Set(entry.tenant_id.into_inner()),
        journal_number: Set(entry.journal_number.clone()),
        date: Set(entry.date),
        memo: Set(entry.memo.clone()),
        status: Set(entry.status.as_str().to_string()),
        posted_at: Set(entry.posted_at.map(Into::into)),
        reversed_from: Set(entry.reversed_from.map(Into::into)),
        created_by: Set(entry.created_by.into_inner()),
        created_at: Set(entry.created_at.into()),
        updated_at: Set(entry.updated_at.into()),
        version: Set(entry.version),
    }
}

pub(crate) fn line(row: journal_lines::Model) -> JournalLine {
    JournalLine {
        id: row.id.into(),
        journal_id: row.journal_id.into(),
        account_id: row.account_id.into(),
        description: row.description,
        debit: row.debit,
        credit: row.credit,
        department_id: row.department_id.map(Into::into),
        reference_type: row.reference_type,
        reference_id: row.reference_id,
        sort_order: row.sort_order,
    }
}

pub(crate) fn line_model(line: &JournalLine) -> journal_lines::ActiveModel {
    journal_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        journal_id: Set(line.journal_id.into_inner()),
        account_id: Set(line.account_id.into_inner()),
        description: Set(line.description.clone()),
        debit: Set(line.debit),
        credit: Set(line.credit),
        department_id: Set(line.department_id.map(Into::into)),
        reference_type: Set(line.reference_type.clone()),
        reference_id: Set(line.reference_id),
        sort_order: Set(line.sort_order),
    }
}

pub(crate) fn invoice(row: ar_invoices::Model) -> StoreResult<Invoice> {
    Ok(Invoice {
        id: row.id.into(),
        tenant_id: row.tenant_id.into(),
        invoice_number: row.invoice_number,
        customer_id: row.customer_id.into(),
        date_issued: row.date_issued,
        due_date: row.due_date,
        amount_total: row.amount_total,
        amount_paid: row.amount_paid,
        balance_due: row.balance_due,
        status: parse(&row.status)?,
        memo: row.memo,
        created_by: row.created_by.into(),
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
        version: row.version,
    })
}

pub(crate) fn invoice_model(invoice: &Invoice) -> ar_invoices::ActiveModel {
    ar_invoices::ActiveModel {
        id: Set(invoice.id.into_inner()),
        tenant_id: Set(invoice.tenant_id.into_inner()),
        invoice_number: Set(invoice.invoice_number.clone()),
        customer_id: Set(invoice.customer_id.into_inner()),
        date_issued: Set(invoice.date_issued),
        due_date: Set(invoice.due_date),
        amount_total: Set(invoice.amount_total),
        amount_paid: Set(invoice.amount_paid),
        balance_due: Set(invoice.balance_due),
        status: Set(invoice.status.as_str().to_string()),
        memo: Set(invoice.memo.clone()),
        created_by: Set(invoice.created_by.into_inner()),
        created_at: Set(invoice.created_at.into()),
        updated_at: Set(invoice.updated_at.into()),
        version: Set(invoice.version),
    }
}

pub(crate) fn payment(row: ar_payments::Model) -> StoreResult<Payment> {
    Ok(Payment {
        id: row.id.into(),
        tenant_id: row.tenant_id.into(),
        invoice_id: row.invoice_id.into(),
        customer_id: row.customer_id.into(),
        payment_date: row.payment_date,
        amount: row.amount,
        method: parse(&row.method)?,
        reference: row.reference,
        notes: row.notes,
        created_by: row.created_by.into(),
        created_at: utc(row.created_at),
    })
}

pub(crate) fn payment_model(payment: &Payment) -> ar_payments::ActiveModel {
    ar_payments::ActiveModel {
        id: Set(payment.id.into_inner()),
        tenant_id: Set(payment.tenant_id.into_inner()),
        invoice_id: Set(payment.invoice_id.into_inner()),
        customer_id: Set(payment.customer_id.into_inner()),
        payment_date: Set(payment.payment_date),
        amount: Set(payment.amount),
        method: Set(payment.method.as_str().to_string()),
        reference: Set(payment.reference.clone()),
        notes: Set(payment.notes.clone()),
        created_by: Set(payment.created_by.into_inner()),
        created_at: Set(payment.created_at.into()),
    }
}
