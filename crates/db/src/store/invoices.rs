//! Invoice and payment persistence.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, TransactionTrait,
};
use tally_core::receivables::{Invoice, InvoiceFilter, InvoiceStatus, Payment};
use tally_engine::store::{InvoiceStore, StoreError, StoreResult};
use tally_shared::types::{InvoiceId, PageRequest, TenantId};

use super::{PgStore, contains_pattern, convert, db_err, search_term};
use crate::entities::{ar_invoices, ar_payments};

/// Overwrites an invoice only if the stored row is still at `expected_version`.
async fn guarded_update<C: ConnectionTrait>(
    conn: &C,
    invoice: &Invoice,
    expected_version: i64,
) -> StoreResult<()> {
    let result = ar_invoices::Entity::update_many()
        .set(convert::invoice_model(invoice))
        .filter(ar_invoices::Column::Id.eq(invoice.id.into_inner()))
        .filter(ar_invoices::Column::TenantId.eq(invoice.tenant_id.into_inner()))
        .filter(ar_invoices::Column::Version.eq(expected_version))
        .exec(conn)
        .await
        .map_err(db_err)?;
    if result.rows_affected == 0 {
        return Err(StoreError::StaleVersion);
    }
    Ok(())
}

/// Applies every filter except status.
fn filtered(tenant_id: TenantId, filter: &InvoiceFilter) -> Select<ar_invoices::Entity> {
    let mut query =
        ar_invoices::Entity::find().filter(ar_invoices::Column::TenantId.eq(tenant_id.into_inner()));
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(ar_invoices::Column::CustomerId.eq(customer_id.into_inner()));
    }
    if let Some(from) = filter.date_from {
        query = query.filter(ar_invoices::Column::DateIssued.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(ar_invoices::Column::DateIssued.lte(to));
    }
    if let Some(term) = search_term(filter.search.as_ref()) {
        let pattern = contains_pattern(term);
        query = query.filter(
            Condition::any()
                .add(Expr::col(ar_invoices::Column::InvoiceNumber).ilike(pattern.clone()))
                .add(Expr::col(ar_invoices::Column::Memo).ilike(pattern)),
        );
    }
    query
}

fn payments_of(tenant_id: TenantId, invoice_id: InvoiceId) -> Select<ar_payments::Entity> {
    ar_payments::Entity::find()
        .filter(ar_payments::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(ar_payments::Column::InvoiceId.eq(invoice_id.into_inner()))
}

#[async_trait]
impl InvoiceStore for PgStore {
    async fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()> {
        ar_invoices::Entity::insert(convert::invoice_model(invoice))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn get_invoice(&self, tenant_id: TenantId, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        ar_invoices::Entity::find_by_id(id.into_inner())
            .filter(ar_invoices::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::invoice)
            .transpose()
    }

    async fn update_invoice(&self, invoice: &Invoice, expected_version: i64) -> StoreResult<()> {
        guarded_update(&self.db, invoice, expected_version).await
    }

    async fn record_payment(
        &self,
        invoice: &Invoice,
        expected_version: i64,
        payment: &Payment,
    ) -> StoreResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        guarded_update(&txn, invoice, expected_version).await?;
        ar_payments::Entity::insert(convert::payment_model(payment))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)
    }

    async fn list_payments(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> StoreResult<Vec<Payment>> {
        payments_of(tenant_id, invoice_id)
            .order_by_asc(ar_payments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::payment)
            .collect()
    }

    async fn count_payments(&self, tenant_id: TenantId, invoice_id: InvoiceId) -> StoreResult<usize> {
        let count = payments_of(tenant_id, invoice_id)
            .count(&self.db)
            .await
            .map_err(db_err)?;
        usize::try_from(count).map_err(|err| StoreError::Backend(err.to_string()))
    }

    async fn list_invoices(
        &self,
        tenant_id: TenantId,
        filter: &InvoiceFilter,
        page: &PageRequest,
    ) -> StoreResult<(Vec<Invoice>, u64)> {
        let mut query = filtered(tenant_id, filter);
        if let Some(status) = filter.status {
            query = query.filter(ar_invoices::Column::Status.eq(status.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let invoices = query
            .order_by_desc(ar_invoices::Column::DateIssued)
            .order_by_desc(ar_invoices::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::invoice)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((invoices, total))
    }

    async fn outstanding_invoices(
        &self,
        tenant_id: TenantId,
        filter: &InvoiceFilter,
    ) -> StoreResult<Vec<Invoice>> {
        filtered(tenant_id, filter)
            .filter(ar_invoices::Column::Status.is_in([
                InvoiceStatus::Open.as_str(),
                InvoiceStatus::Partial.as_str(),
            ]))
            .order_by_asc(ar_invoices::Column::DueDate)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::invoice)
            .collect()
    }
}
