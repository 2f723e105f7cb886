//! Accounts-receivable invoice and payment tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(AR_INVOICES_SQL).await?;
        db.execute_unprepared(AR_PAYMENTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS ar_payments CASCADE;
             DROP TABLE IF EXISTS ar_invoices CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const AR_INVOICES_SQL: &str = r"
CREATE TABLE ar_invoices (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    invoice_number VARCHAR(64) NOT NULL,
    customer_id UUID NOT NULL,
    date_issued DATE NOT NULL,
    due_date DATE NOT NULL,
    amount_total NUMERIC(19, 4) NOT NULL CHECK (amount_total > 0),
    amount_paid NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (amount_paid >= 0),
    balance_due NUMERIC(19, 4) NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'open'
        CHECK (status IN ('open', 'partial', 'paid', 'void')),
    memo TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    version BIGINT NOT NULL DEFAULT 1,
    CONSTRAINT uq_ar_invoices_tenant_number UNIQUE (tenant_id, invoice_number),
    CONSTRAINT chk_due_after_issue CHECK (due_date >= date_issued),
    CONSTRAINT chk_paid_within_total CHECK (amount_paid <= amount_total),
    CONSTRAINT chk_balance_identity CHECK (balance_due = amount_total - amount_paid)
);

CREATE INDEX idx_ar_invoices_tenant_issued
    ON ar_invoices(tenant_id, date_issued DESC, created_at DESC);

CREATE INDEX idx_ar_invoices_outstanding
    ON ar_invoices(tenant_id, due_date) WHERE status IN ('open', 'partial');
";

const AR_PAYMENTS_SQL: &str = r"
CREATE TABLE ar_payments (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    invoice_id UUID NOT NULL REFERENCES ar_invoices(id) ON DELETE CASCADE,
    customer_id UUID NOT NULL,
    payment_date DATE NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    method VARCHAR(16) NOT NULL
        CHECK (method IN ('cash', 'check', 'bank_transfer', 'card', 'other')),
    reference VARCHAR(255),
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_ar_payments_invoice ON ar_payments(invoice_id, created_at);
";
