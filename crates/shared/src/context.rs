//! Explicit tenant/actor context threaded through every ledger operation.

use std::time::Duration;

use crate::types::{TenantId, UserId};

/// Who is calling, on behalf of which tenant, and how long they are willing to wait.
///
/// All lookups and uniqueness checks are scoped by `tenant_id`. The core never
/// authenticates; whoever builds the context has already done so.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    /// Bookkeeping scope.
    pub tenant_id: TenantId,
    /// Acting user, recorded as `created_by` and in the activity log.
    pub actor_user_id: UserId,
    /// Per-call deadline. Falls back to the configured operation timeout when `None`.
    pub timeout: Option<Duration>,
}

impl TenantContext {
    /// Creates a context without an explicit timeout.
    #[must_use]
    pub const fn new(tenant_id: TenantId, actor_user_id: UserId) -> Self {
        Self {
            tenant_id,
            actor_user_id,
            timeout: None,
        }
    }

    /// Returns a copy bounded by `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolves the effective timeout against a default.
    #[must_use]
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }
}
