//! Chart-of-accounts lookups.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter};
use tally_core::accounts::Account;
use tally_engine::store::{AccountRegistry, StoreResult};
use tally_shared::types::{AccountId, TenantId};

use super::{PgStore, convert, db_err};
use crate::entities::accounts;

impl PgStore {
    /// Inserts a chart-of-accounts entry.
    ///
    /// Returns `false` if the tenant already has an account with that code.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the insert fails.
    pub async fn insert_account(&self, account: &Account) -> StoreResult<bool> {
        let now = Utc::now().into();
        let model = accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            tenant_id: Set(account.tenant_id.into_inner()),
            code: Set(account.code.clone()),
            name: Set(account.name.clone()),
            account_type: Set(account.account_type.as_str().to_string()),
            is_active: Set(account.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let result = accounts::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([accounts::Column::TenantId, accounts::Column::Code])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(err) => Err(db_err(err)),
        }
    }
}

#[async_trait]
impl AccountRegistry for PgStore {
    async fn get_account(&self, tenant_id: TenantId, id: AccountId) -> StoreResult<Option<Account>> {
        accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::account)
            .transpose()
    }

    async fn find_account_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> StoreResult<Option<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::account)
            .transpose()
    }

    async fn get_accounts(&self, tenant_id: TenantId, ids: &[AccountId]) -> StoreResult<Vec<Account>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(accounts::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::account)
            .collect()
    }
}
