//! Activity log.
//!
//! Services record one [`ActivityRecord`] after each committed mutation.
//! Recording is fire-and-forget: sinks never fail the operation.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tally_shared::TenantContext;
use tally_shared::types::{TenantId, UserId};
use uuid::Uuid;

/// Kind of record an activity refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEntity {
    /// A journal entry.
    JournalEntry,
    /// An AR invoice.
    Invoice,
    /// An AR payment.
    Payment,
}

impl ActivityEntity {
    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JournalEntry => "journal_entry",
            Self::Invoice => "invoice",
            Self::Payment => "payment",
        }
    }
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    /// Record created.
    Created,
    /// Record edited.
    Updated,
    /// Record deleted.
    Deleted,
    /// Journal entry posted.
    Posted,
    /// Journal entry reversed.
    Reversed,
    /// Invoice voided.
    Voided,
}

impl ActivityAction {
    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Posted => "posted",
            Self::Reversed => "reversed",
            Self::Voided => "voided",
        }
    }
}

/// Before/after snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityDiff {
    /// State before the change.
    pub before: Option<Value>,
    /// State after the change.
    pub after: Option<Value>,
}

impl ActivityDiff {
    /// Builds a diff by serializing both sides. Unserializable values are dropped.
    pub fn between<B: Serialize, A: Serialize>(before: Option<&B>, after: Option<&A>) -> Self {
        Self {
            before: before.and_then(|b| serde_json::to_value(b).ok()),
            after: after.and_then(|a| serde_json::to_value(a).ok()),
        }
    }

    /// A diff for a newly created record.
    pub fn created<A: Serialize>(after: &A) -> Self {
        Self::between::<A, A>(None, Some(after))
    }
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    /// Tenant the change belongs to.
    pub tenant_id: TenantId,
    /// User who made the change.
    pub actor_user_id: UserId,
    /// Kind of record.
    pub entity: ActivityEntity,
    /// Id of the record.
    pub entity_id: Uuid,
    /// What happened.
    pub action: ActivityAction,
    /// Snapshots.
    pub diff: ActivityDiff,
    /// When it was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Creates a record stamped with the context and the current time.
    #[must_use]
    pub fn new(
        ctx: &TenantContext,
        entity: ActivityEntity,
        entity_id: Uuid,
        action: ActivityAction,
        diff: ActivityDiff,
    ) -> Self {
        Self {
            tenant_id: ctx.tenant_id,
            actor_user_id: ctx.actor_user_id,
            entity,
            entity_id,
            action,
            diff,
            occurred_at: Utc::now(),
        }
    }
}

/// Destination for activity records.
pub trait ActivitySink: Send + Sync {
    /// Records an activity. Must not block for long and must not fail.
    fn record(&self, record: ActivityRecord);
}

/// Emits each record as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActivitySink;

impl ActivitySink for TracingActivitySink {
    fn record(&self, record: ActivityRecord) {
        let diff = serde_json::to_string(&record.diff).unwrap_or_default();
        tracing::info!(
            target: "tally::activity",
            tenant_id = %record.tenant_id,
            actor_user_id = %record.actor_user_id,
            entity = record.entity.as_str(),
            entity_id = %record.entity_id,
            action = record.action.as_str(),
            diff = %diff,
            "activity"
        );
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemoryActivitySink {
    records: Mutex<Vec<ActivityRecord>>,
}

impl MemoryActivitySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn records(&self) -> Vec<ActivityRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the actions recorded for one entity, in order.
    #[must_use]
    pub fn actions_for(&self, entity_id: Uuid) -> Vec<ActivityAction> {
        self.records()
            .into_iter()
            .filter(|r| r.entity_id == entity_id)
            .map(|r| r.action)
            .collect()
    }
}

impl ActivitySink for MemoryActivitySink {
    fn record(&self, record: ActivityRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemoryActivitySink::new();
        let ctx = TenantContext::new(TenantId::new(), UserId::new());
        let id = Uuid::now_v7();

        sink.record(ActivityRecord::new(
            &ctx,
            ActivityEntity::Invoice,
            id,
            ActivityAction::Created,
            ActivityDiff::created(&json!({"invoice_number": "INV-1"})),
        ));
        sink.record(ActivityRecord::new(
            &ctx,
            ActivityEntity::Invoice,
            id,
            ActivityAction::Voided,
            ActivityDiff::default(),
        ));

        assert_eq!(
            sink.actions_for(id),
            vec![ActivityAction::Created, ActivityAction::Voided]
        );
        let first = &sink.records()[0];
        assert_eq!(first.tenant_id, ctx.tenant_id);
        assert_eq!(first.diff.before, None);
        assert_eq!(first.diff.after, Some(json!({"invoice_number": "INV-1"})));
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        let ctx = TenantContext::new(TenantId::new(), UserId::new());
        TracingActivitySink.record(ActivityRecord::new(
            &ctx,
            ActivityEntity::JournalEntry,
            Uuid::now_v7(),
            ActivityAction::Posted,
            ActivityDiff::default(),
        ));
    }
}
