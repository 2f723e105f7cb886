//! Chart-of-accounts lookups cached with Moka.
//!
//! Accounts are reference data that change rarely; every journal write
//! resolves each line's account, so hits are common. Misses are not cached
//! so newly added accounts become visible immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tally_core::accounts::Account;
use tally_shared::config::AccountsCacheConfig;
use tally_shared::types::{AccountId, TenantId};

use crate::store::{AccountRegistry, StoreResult};

/// Default cache capacity (number of entries per index).
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Wraps an [`AccountRegistry`] with a TTL cache keyed by id and by code.
#[derive(Clone)]
pub struct CachedAccountRegistry {
    inner: Arc<dyn AccountRegistry>,
    by_id: Cache<(TenantId, AccountId), Account>,
    by_code: Cache<(TenantId, String), Account>,
}

impl CachedAccountRegistry {
    /// Creates a cache with default settings.
    ///
    /// Default: 10,000 entries, 5 minute TTL.
    #[must_use]
    pub fn new(inner: Arc<dyn AccountRegistry>) -> Self {
        Self::with_config(inner, DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache from configuration.
    #[must_use]
    pub fn from_config(inner: Arc<dyn AccountRegistry>, config: &AccountsCacheConfig) -> Self {
        Self::with_config(inner, config.max_capacity, config.ttl_secs)
    }

    /// Creates a cache with explicit capacity and TTL.
    #[must_use]
    pub fn with_config(inner: Arc<dyn AccountRegistry>, max_capacity: u64, ttl_secs: u64) -> Self {
        let ttl = Duration::from_secs(ttl_secs);
        Self {
            inner,
            by_id: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            by_code: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Drops one account from both indexes.
    pub async fn invalidate_account(&self, account: &Account) {
        self.by_id.invalidate(&(account.tenant_id, account.id)).await;
        self.by_code
            .invalidate(&(account.tenant_id, account.code.clone()))
            .await;
    }

    async fn remember(&self, account: &Account) {
        self.by_id
            .insert((account.tenant_id, account.id), account.clone())
            .await;
        self.by_code
            .insert((account.tenant_id, account.code.clone()), account.clone())
            .await;
    }
}

#[async_trait]
impl AccountRegistry for CachedAccountRegistry {
    async fn get_account(&self, tenant_id: TenantId, id: AccountId) -> StoreResult<Option<Account>> {
        if let Some(hit) = self.by_id.get(&(tenant_id, id)).await {
            return Ok(Some(hit));
        }
        let found = self.inner.get_account(tenant_id, id).await?;
        if let Some(account) = &found {
            self.remember(account).await;
        }
        Ok(found)
    }

    async fn find_account_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> StoreResult<Option<Account>> {
        if let Some(hit) = self.by_code.get(&(tenant_id, code.to_string())).await {
            return Ok(Some(hit));
        }
        let found = self.inner.find_account_by_code(tenant_id, code).await?;
        if let Some(account) = &found {
            self.remember(account).await;
        }
        Ok(found)
    }
}
