//! Journal lifecycle and reversal tests over the in-memory store.

mod common;

use common::{Harness, date};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::accounts::{Account, AccountType};
use tally_core::ledger::{
    JournalFilter, JournalHeaderPatch, JournalLineInput, JournalStatus, LedgerError, ValidationError,
};
use tally_engine::{ActivityAction, JournalStore};
use tally_shared::types::PageRequest;

#[tokio::test]
async fn test_posted_entry_rejects_update() {
    let h = Harness::new().await;
    let entry = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(500), dec!(500)))
        .await
        .unwrap();
    assert_eq!(entry.status, JournalStatus::Draft);

    let posted = h.engine.journals.post(&h.ctx, entry.id).await.unwrap();
    assert_eq!(posted.status, JournalStatus::Posted);
    assert!(posted.posted_at.is_some());
    assert_eq!(posted.version, entry.version + 1);

    let before = h.engine.journals.get(&h.ctx, entry.id).await.unwrap();
    let patch = JournalHeaderPatch {
        memo: Some(Some("changed".to_string())),
        ..JournalHeaderPatch::default()
    };
    let err = h
        .engine
        .journals
        .update(&h.ctx, entry.id, patch, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotDraft { status: JournalStatus::Posted, .. }));

    let relines = vec![
        JournalLineInput::debit(h.receivable.id, dec!(900)),
        JournalLineInput::credit(h.revenue.id, dec!(900)),
    ];
    let err = h
        .engine
        .journals
        .update(&h.ctx, entry.id, JournalHeaderPatch::default(), Some(relines))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotDraft { .. }));

    let after = h.engine.journals.get(&h.ctx, entry.id).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_unbalanced_post_leaves_draft() {
    let h = Harness::new().await;
    let entry = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(500), dec!(300)))
        .await
        .unwrap();

    let err = h.engine.journals.post(&h.ctx, entry.id).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::Unbalanced {
            debit: dec!(500),
            credit: dec!(300)
        }
    );

    let detail = h.engine.journals.get(&h.ctx, entry.id).await.unwrap();
    assert_eq!(detail.entry.status, JournalStatus::Draft);
    assert_eq!(detail.entry.version, entry.version);
}

#[tokio::test]
async fn test_duplicate_number_rejected() {
    let h = Harness::new().await;
    h.engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(10), dec!(10)))
        .await
        .unwrap();
    let err = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(20), dec!(20)))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::DuplicateNumber("JE-1".to_string()));
}

#[tokio::test]
async fn test_single_line_entry_rejected() {
    let h = Harness::new().await;
    let mut input = h.sale("JE-1", dec!(10), dec!(10));
    input.lines.truncate(1);
    let err = h.engine.journals.create(&h.ctx, input).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::TooFewLines { count: 1 })
    ));
}

#[tokio::test]
async fn test_sub_unit_amount_rejected() {
    let h = Harness::new().await;
    let err = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(0.00001), dec!(0.00001)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Validation(ValidationError::ScaleTooLarge { line: 1 })
    );
    assert!(!h.store.journal_number_exists(h.ctx.tenant_id, "JE-1").await.unwrap());
}

#[tokio::test]
async fn test_inactive_account_rejected() {
    let h = Harness::new().await;
    let closed = Account::new(h.ctx.tenant_id, "1900", "Old Bank", AccountType::Asset).deactivated();
    h.store.put_account(closed.clone()).await;

    let mut input = h.sale("JE-1", dec!(10), dec!(10));
    input.lines[0] = JournalLineInput::debit(closed.id, dec!(10));
    let err = h.engine.journals.create(&h.ctx, input).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountInactive { account_id, .. } if account_id == closed.id));
}

#[tokio::test]
async fn test_entries_are_tenant_scoped() {
    let h = Harness::new().await;
    let entry = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(10), dec!(10)))
        .await
        .unwrap();

    let other = h.other_tenant();
    let err = h.engine.journals.get(&other, entry.id).await.unwrap_err();
    assert_eq!(err, LedgerError::NotFound(entry.id));

    // Same number is free in another tenant's namespace.
    let foreign_account = Account::new(other.tenant_id, "1000", "Cash", AccountType::Asset);
    let foreign_revenue = Account::new(other.tenant_id, "4000", "Revenue", AccountType::Revenue);
    h.store.put_account(foreign_account.clone()).await;
    h.store.put_account(foreign_revenue.clone()).await;
    let mut input = h.sale("JE-1", dec!(10), dec!(10));
    input.lines = vec![
        JournalLineInput::debit(foreign_account.id, dec!(10)),
        JournalLineInput::credit(foreign_revenue.id, dec!(10)),
    ];
    assert!(h.engine.journals.create(&other, input).await.is_ok());
}

#[tokio::test]
async fn test_update_replaces_lines_and_number() {
    let h = Harness::new().await;
    let entry = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(10), dec!(5)))
        .await
        .unwrap();

    let patch = JournalHeaderPatch {
        journal_number: Some("JE-1A".to_string()),
        date: Some(date(3, 2)),
        memo: None,
    };
    let lines = vec![
        JournalLineInput::debit(h.cash.id, dec!(10)),
        JournalLineInput::credit(h.revenue.id, dec!(4)),
        JournalLineInput::credit(h.receivable.id, dec!(6)),
    ];
    let updated = h
        .engine
        .journals
        .update(&h.ctx, entry.id, patch, Some(lines))
        .await
        .unwrap();
    assert_eq!(updated.journal_number, "JE-1A");
    assert_eq!(updated.version, entry.version + 1);

    let detail = h.engine.journals.get(&h.ctx, entry.id).await.unwrap();
    assert_eq!(detail.lines.len(), 3);
    assert_eq!(detail.totals.debit, detail.totals.credit);
    assert_eq!(
        detail.lines[2].account.as_ref().map(|a| a.code.as_str()),
        Some("1200")
    );
    assert!(h.engine.journals.post(&h.ctx, entry.id).await.is_ok());
}

#[tokio::test]
async fn test_delete_only_drafts() {
    let h = Harness::new().await;
    let draft = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(10), dec!(10)))
        .await
        .unwrap();
    let posted = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-2", dec!(10), dec!(10)))
        .await
        .unwrap();
    h.engine.journals.post(&h.ctx, posted.id).await.unwrap();

    h.engine.journals.delete(&h.ctx, draft.id).await.unwrap();
    assert_eq!(
        h.engine.journals.get(&h.ctx, draft.id).await.unwrap_err(),
        LedgerError::NotFound(draft.id)
    );

    let before = h.engine.journals.get(&h.ctx, posted.id).await.unwrap();
    let err = h.engine.journals.delete(&h.ctx, posted.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotDraft { .. }));
    assert_eq!(h.engine.journals.get(&h.ctx, posted.id).await.unwrap(), before);
}

#[tokio::test]
async fn test_reversed_entry_is_frozen() {
    let h = Harness::new().await;
    let entry = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(75), dec!(75)))
        .await
        .unwrap();
    h.engine.journals.post(&h.ctx, entry.id).await.unwrap();
    h.engine
        .reversals
        .reverse(&h.ctx, entry.id, date(3, 31), None)
        .await
        .unwrap();

    let before = h.engine.journals.get(&h.ctx, entry.id).await.unwrap();
    assert_eq!(before.entry.status, JournalStatus::Reversed);

    let patch = JournalHeaderPatch {
        journal_number: Some("JE-1-B".to_string()),
        memo: Some(None),
        ..JournalHeaderPatch::default()
    };
    let relines = vec![
        JournalLineInput::debit(h.cash.id, dec!(1)),
        JournalLineInput::credit(h.revenue.id, dec!(1)),
    ];
    let err = h
        .engine
        .journals
        .update(&h.ctx, entry.id, patch, Some(relines))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotDraft { status: JournalStatus::Reversed, .. }));

    let err = h.engine.journals.delete(&h.ctx, entry.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotDraft { status: JournalStatus::Reversed, .. }));

    let after = h.engine.journals.get(&h.ctx, entry.id).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(after.entry.version, before.entry.version);
    assert_eq!(after.entry.updated_at, before.entry.updated_at);
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let h = Harness::new().await;
    for number in ["JE-1", "JE-2", "JE-3"] {
        h.engine
            .journals
            .create(&h.ctx, h.sale(number, dec!(10), dec!(10)))
            .await
            .unwrap();
    }
    let page = h
        .engine
        .journals
        .list(&h.ctx, &JournalFilter::default(), PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.meta.total, 3);
    assert_eq!(page.meta.total_pages, 2);

    let first = &page.data[0];
    h.engine.journals.post(&h.ctx, first.entry.id).await.unwrap();

    let filter = JournalFilter {
        status: Some(JournalStatus::Posted),
        ..JournalFilter::default()
    };
    let posted = h
        .engine
        .journals
        .list(&h.ctx, &filter, PageRequest::new(1, 50))
        .await
        .unwrap();
    assert_eq!(posted.meta.total, 1);
    assert_eq!(posted.data[0].total_debit, dec!(10));
    assert_eq!(posted.data[0].line_count, 2);
}

#[tokio::test]
async fn test_reverse_posted_entry() {
    let h = Harness::new().await;
    let entry = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(250), dec!(250)))
        .await
        .unwrap();
    h.engine.journals.post(&h.ctx, entry.id).await.unwrap();

    let reversal = h
        .engine
        .reversals
        .reverse(&h.ctx, entry.id, date(3, 31), None)
        .await
        .unwrap();
    assert_eq!(reversal.journal_number, "JE-1-REV");
    assert_eq!(reversal.status, JournalStatus::Posted);
    assert_eq!(reversal.reversed_from, Some(entry.id));
    assert_eq!(reversal.memo.as_deref(), Some("Reversal of JE-1"));
    assert_eq!(reversal.date, date(3, 31));

    let original = h.engine.journals.get(&h.ctx, entry.id).await.unwrap();
    assert_eq!(original.entry.status, JournalStatus::Reversed);

    let detail = h.engine.journals.get(&h.ctx, reversal.id).await.unwrap();
    assert_eq!(detail.lines[0].line.account_id, h.cash.id);
    assert_eq!(detail.lines[0].line.credit, dec!(250));
    assert_eq!(detail.lines[0].line.debit, Decimal::ZERO);
    assert_eq!(detail.lines[1].line.debit, dec!(250));

    let err = h
        .engine
        .reversals
        .reverse(&h.ctx, entry.id, date(4, 1), None)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::AlreadyReversed(entry.id));
}

#[tokio::test]
async fn test_reverse_requires_posted() {
    let h = Harness::new().await;
    let entry = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(10), dec!(10)))
        .await
        .unwrap();
    let err = h
        .engine
        .reversals
        .reverse(&h.ctx, entry.id, date(3, 31), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotPosted { status: JournalStatus::Draft, .. }));
}

#[tokio::test]
async fn test_reversal_number_skips_taken_numbers() {
    let h = Harness::new().await;
    h.engine
        .journals
        .create(&h.ctx, h.sale("JE-7-REV", dec!(1), dec!(1)))
        .await
        .unwrap();
    let entry = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-7", dec!(10), dec!(10)))
        .await
        .unwrap();
    h.engine.journals.post(&h.ctx, entry.id).await.unwrap();

    let reversal = h
        .engine
        .reversals
        .reverse(&h.ctx, entry.id, date(3, 31), Some("Wrong customer".to_string()))
        .await
        .unwrap();
    assert_eq!(reversal.journal_number, "JE-7-REV-2");
    assert_eq!(reversal.memo.as_deref(), Some("Wrong customer"));
}

#[tokio::test]
async fn test_lifecycle_is_recorded() {
    let h = Harness::new().await;
    let entry = h
        .engine
        .journals
        .create(&h.ctx, h.sale("JE-1", dec!(10), dec!(10)))
        .await
        .unwrap();
    h.engine.journals.post(&h.ctx, entry.id).await.unwrap();
    let reversal = h
        .engine
        .reversals
        .reverse(&h.ctx, entry.id, date(3, 31), None)
        .await
        .unwrap();

    assert_eq!(
        h.activity.actions_for(entry.id.into_inner()),
        vec![ActivityAction::Created, ActivityAction::Posted, ActivityAction::Reversed]
    );
    assert_eq!(
        h.activity.actions_for(reversal.id.into_inner()),
        vec![ActivityAction::Created]
    );
    assert!(
        h.activity
            .records()
            .iter()
            .all(|r| r.tenant_id == h.ctx.tenant_id && r.actor_user_id == h.ctx.actor_user_id)
    );
}
