//! Journal entry persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tally_core::ledger::{
    JournalEntry, JournalEntryWithLines, JournalFilter, JournalLine, JournalSummary,
};
use tally_engine::store::{JournalStore, StoreError, StoreResult};
use tally_shared::types::{JournalEntryId, PageRequest, TenantId};
use uuid::Uuid;

use super::{PgStore, contains_pattern, convert, db_err, search_term};
use crate::entities::{journal_entries, journal_lines};

async fn insert_lines<C: ConnectionTrait>(conn: &C, lines: &[JournalLine]) -> StoreResult<()> {
    if lines.is_empty() {
        return Ok(());
    }
    journal_lines::Entity::insert_many(lines.iter().map(convert::line_model))
        .exec(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}

/// Overwrites a header only if the stored row is still at `expected_version`.
async fn guarded_update<C: ConnectionTrait>(
    conn: &C,
    entry: &JournalEntry,
    expected_version: i64,
) -> StoreResult<()> {
    let result = journal_entries::Entity::update_many()
        .set(convert::entry_model(entry))
        .filter(journal_entries::Column::Id.eq(entry.id.into_inner()))
        .filter(journal_entries::Column::TenantId.eq(entry.tenant_id.into_inner()))
        .filter(journal_entries::Column::Version.eq(expected_version))
        .exec(conn)
        .await
        .map_err(db_err)?;
    if result.rows_affected == 0 {
        return Err(StoreError::StaleVersion);
    }
    Ok(())
}

async fn lines_by_entry<C: ConnectionTrait>(
    conn: &C,
    journal_ids: Vec<Uuid>,
) -> StoreResult<HashMap<Uuid, Vec<JournalLine>>> {
    let rows = journal_lines::Entity::find()
        .filter(journal_lines::Column::JournalId.is_in(journal_ids))
        .order_by_asc(journal_lines::Column::SortOrder)
        .all(conn)
        .await
        .map_err(db_err)?;
    let mut grouped: HashMap<Uuid, Vec<JournalLine>> = HashMap::new();
    for row in rows {
        grouped.entry(row.journal_id).or_default().push(convert::line(row));
    }
    Ok(grouped)
}

#[async_trait]
impl JournalStore for PgStore {
    async fn insert_entry(&self, entry: &JournalEntry, lines: &[JournalLine]) -> StoreResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        journal_entries::Entity::insert(convert::entry_model(entry))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        insert_lines(&txn, lines).await?;
        txn.commit().await.map_err(db_err)
    }

    async fn get_entry(
        &self,
        tenant_id: TenantId,
        id: JournalEntryId,
    ) -> StoreResult<Option<JournalEntryWithLines>> {
        let Some(row) = journal_entries::Entity::find_by_id(id.into_inner())
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalId.eq(row.id))
            .order_by_asc(journal_lines::Column::SortOrder)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(Some(JournalEntryWithLines {
            entry: convert::entry(row)?,
            lines: lines.into_iter().map(convert::line).collect(),
        }))
    }

    async fn journal_number_exists(&self, tenant_id: TenantId, number: &str) -> StoreResult<bool> {
        let count = journal_entries::Entity::find()
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(journal_entries::Column::JournalNumber.eq(number))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn update_entry(
        &self,
        entry: &JournalEntry,
        expected_version: i64,
        lines: Option<&[JournalLine]>,
    ) -> StoreResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        guarded_update(&txn, entry, expected_version).await?;
        if let Some(lines) = lines {
            journal_lines::Entity::delete_many()
                .filter(journal_lines::Column::JournalId.eq(entry.id.into_inner()))
                .exec(&txn)
                .await
                .map_err(db_err)?;
            insert_lines(&txn, lines).await?;
        }
        txn.commit().await.map_err(db_err)
    }

    async fn delete_entry(
        &self,
        tenant_id: TenantId,
        id: JournalEntryId,
        expected_version: i64,
    ) -> StoreResult<()> {
        // Lines go with the header through ON DELETE CASCADE.
        let result = journal_entries::Entity::delete_many()
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(journal_entries::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(StoreError::StaleVersion);
        }
        Ok(())
    }

    async fn insert_reversal(
        &self,
        reversal: &JournalEntry,
        lines: &[JournalLine],
        original: &JournalEntry,
        expected_version: i64,
    ) -> StoreResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        guarded_update(&txn, original, expected_version).await?;
        journal_entries::Entity::insert(convert::entry_model(reversal))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        insert_lines(&txn, lines).await?;
        txn.commit().await.map_err(db_err)
    }

    async fn find_reversal_of(
        &self,
        tenant_id: TenantId,
        original_id: JournalEntryId,
    ) -> StoreResult<Option<JournalEntry>> {
        journal_entries::Entity::find()
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(journal_entries::Column::ReversedFrom.eq(original_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::entry)
            .transpose()
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        filter: &JournalFilter,
        page: &PageRequest,
    ) -> StoreResult<(Vec<JournalSummary>, u64)> {
        let mut query = journal_entries::Entity::find()
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()));
        if let Some(status) = filter.status {
            query = query.filter(journal_entries::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(journal_entries::Column::Date.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(journal_entries::Column::Date.lte(to));
        }
        if let Some(term) = search_term(filter.search.as_ref()) {
            let pattern = contains_pattern(term);
            query = query.filter(
                Condition::any()
                    .add(Expr::col(journal_entries::Column::JournalNumber).ilike(pattern.clone()))
                    .add(Expr::col(journal_entries::Column::Memo).ilike(pattern)),
            );
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(journal_entries::Column::Date)
            .order_by_desc(journal_entries::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut lines = lines_by_entry(&self.db, rows.iter().map(|r| r.id).collect()).await?;
        let summaries = rows
            .into_iter()
            .map(|row| {
                let entry_lines = lines.remove(&row.id).unwrap_or_default();
                Ok(JournalSummary::new(convert::entry(row)?, &entry_lines))
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((summaries, total))
    }

    async fn entries_for_reference(
        &self,
        tenant_id: TenantId,
        reference_type: &str,
        reference_id: Uuid,
    ) -> StoreResult<Vec<JournalEntry>> {
        journal_entries::Entity::find()
            .inner_join(journal_lines::Entity)
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(journal_lines::Column::ReferenceType.eq(reference_type))
            .filter(journal_lines::Column::ReferenceId.eq(reference_id))
            .distinct()
            .order_by_asc(journal_entries::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::entry)
            .collect()
    }
}
