//! Property-based tests for payment application.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::UserId;

use super::error::ReceivableError;
use super::service::{DEFAULT_PAYMENT_TOLERANCE, ReceivableService};
use super::types::fixtures::invoice;
use super::types::{InvoiceStatus, NewPayment, PaymentMethod};

fn arb_cents() -> impl Strategy<Value = i64> {
    1i64..10_000_000i64
}

fn due() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
}

fn pay(amount: Decimal) -> NewPayment {
    NewPayment::new(amount, due(), PaymentMethod::Cash)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// After any sequence of accepted payments, the balance identity and the
    /// status function hold.
    #[test]
    fn prop_balance_identity_holds(
        total in arb_cents(),
        parts in prop::collection::vec(arb_cents(), 1..8),
    ) {
        let mut current = invoice(Decimal::new(total, 2), Decimal::ZERO, InvoiceStatus::Open, due());
        for cents in parts {
            let amount = Decimal::new(cents, 2);
            match ReceivableService::apply_payment(
                &current,
                &pay(amount),
                UserId::new(),
                DEFAULT_PAYMENT_TOLERANCE,
                Utc::now(),
            ) {
                Ok((next, payment)) => {
                    prop_assert_eq!(payment.amount, amount);
                    prop_assert_eq!(next.version, current.version + 1);
                    current = next;
                }
                Err(ReceivableError::ExceedsBalance { amount: rejected, balance_due }) => {
                    prop_assert!(rejected > balance_due);
                    prop_assert_eq!(balance_due, current.balance_due);
                }
                Err(ReceivableError::AlreadyPaid(_)) => {
                    prop_assert_eq!(current.status, InvoiceStatus::Paid);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }

            prop_assert_eq!(current.balance_due, current.amount_total - current.amount_paid);
            prop_assert!(current.amount_paid <= current.amount_total);
            prop_assert_eq!(
                current.status,
                ReceivableService::derive_status(
                    current.amount_total,
                    current.amount_paid,
                    DEFAULT_PAYMENT_TOLERANCE
                )
            );
        }
    }

    /// Any amount above the remaining balance is rejected.
    #[test]
    fn prop_overpayment_rejected(total in arb_cents(), excess in arb_cents()) {
        let inv = invoice(Decimal::new(total, 2), Decimal::ZERO, InvoiceStatus::Open, due());
        let amount = inv.balance_due + Decimal::new(excess, 2);
        let is_exceeds = matches!(
            ReceivableService::check_payment(&inv, amount),
            Err(ReceivableError::ExceedsBalance { .. })
        );
        prop_assert!(is_exceeds);
    }

    /// Non-positive amounts are rejected on outstanding invoices.
    #[test]
    fn prop_non_positive_rejected(total in arb_cents(), cents in 0i64..1_000_000i64) {
        let inv = invoice(Decimal::new(total, 2), Decimal::ZERO, InvoiceStatus::Open, due());
        let amount = Decimal::new(-cents, 2);
        prop_assert_eq!(
            ReceivableService::check_payment(&inv, amount),
            Err(ReceivableError::InvalidAmount(amount))
        );
    }

    /// Paying the exact balance always settles the invoice.
    #[test]
    fn prop_exact_payment_settles(total in arb_cents(), paid_part in 0u32..100) {
        let total = Decimal::new(total, 2);
        let paid = (total * Decimal::new(i64::from(paid_part), 2)).round_dp(2);
        let status = ReceivableService::derive_status(total, paid, DEFAULT_PAYMENT_TOLERANCE);
        prop_assume!(status != InvoiceStatus::Paid);

        let inv = invoice(total, paid, status, due());
        let (settled, _) = ReceivableService::apply_payment(
            &inv,
            &pay(inv.balance_due),
            UserId::new(),
            DEFAULT_PAYMENT_TOLERANCE,
            Utc::now(),
        )
        .unwrap();
        prop_assert_eq!(settled.status, InvoiceStatus::Paid);
        prop_assert_eq!(settled.balance_due, Decimal::ZERO);
    }
}
