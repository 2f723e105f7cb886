//! Property-based tests for journal line validation and balance checks.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::types::JournalLineInput;
use super::validation::{
    DEFAULT_BALANCE_TOLERANCE, ValidationError, can_transition, is_balanced, validate_line_set,
};

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn negative_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

/// A balanced set: one debit per amount, one credit carrying the total.
fn balanced_lines() -> impl Strategy<Value = Vec<JournalLineInput>> {
    prop::collection::vec(positive_amount(), 1..6).prop_map(|amounts| {
        let total: Decimal = amounts.iter().copied().sum();
        let mut lines: Vec<JournalLineInput> = amounts
            .into_iter()
            .map(|amount| JournalLineInput::debit(AccountId::new(), amount))
            .collect();
        lines.push(JournalLineInput::credit(AccountId::new(), total));
        lines
    })
}

fn status_strategy() -> impl Strategy<Value = super::types::JournalStatus> {
    use super::types::JournalStatus;
    prop_oneof![
        Just(JournalStatus::Draft),
        Just(JournalStatus::Posted),
        Just(JournalStatus::Reversed),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A balanced set of well-formed lines passes shape validation and balances.
    #[test]
    fn prop_balanced_sets_validate(lines in balanced_lines()) {
        prop_assert!(validate_line_set(&lines).is_ok());
        prop_assert!(is_balanced(&lines, DEFAULT_BALANCE_TOLERANCE));
    }

    /// Shifting one credit by at least a cent makes the set unbalanced.
    #[test]
    fn prop_offset_breaks_balance(
        mut lines in balanced_lines(),
        offset in positive_amount(),
    ) {
        let last = lines.len() - 1;
        lines[last].credit += offset;
        prop_assert!(validate_line_set(&lines).is_ok());
        prop_assert!(!is_balanced(&lines, DEFAULT_BALANCE_TOLERANCE));
    }

    /// Any negative amount is rejected with the offending 1-based line.
    #[test]
    fn prop_negative_amount_rejected(
        mut lines in balanced_lines(),
        negative in negative_amount(),
        index in any::<prop::sample::Index>(),
    ) {
        let at = index.index(lines.len());
        lines[at].debit = negative;
        lines[at].credit = Decimal::ZERO;
        prop_assert_eq!(
            validate_line_set(&lines),
            Err(ValidationError::NegativeAmount { line: at + 1 })
        );
    }

    /// A line carrying both sides is rejected.
    #[test]
    fn prop_mixed_line_rejected(
        mut lines in balanced_lines(),
        extra in positive_amount(),
        index in any::<prop::sample::Index>(),
    ) {
        let at = index.index(lines.len());
        if lines[at].debit.is_zero() {
            lines[at].debit = extra;
        } else {
            lines[at].credit = extra;
        }
        prop_assert_eq!(
            validate_line_set(&lines),
            Err(ValidationError::MixedLine { line: at + 1 })
        );
    }

    /// A single line is never enough.
    #[test]
    fn prop_single_line_rejected(amount in positive_amount()) {
        let lines = vec![JournalLineInput::debit(AccountId::new(), amount)];
        prop_assert_eq!(
            validate_line_set(&lines),
            Err(ValidationError::TooFewLines { count: 1 })
        );
    }

    /// Nothing leaves `reversed`, and nothing returns to `draft` once posted.
    #[test]
    fn prop_terminal_transitions(target in status_strategy()) {
        use super::types::JournalStatus;
        prop_assert!(!can_transition(JournalStatus::Reversed, target));
        prop_assert!(!can_transition(JournalStatus::Posted, JournalStatus::Draft));
    }
}
