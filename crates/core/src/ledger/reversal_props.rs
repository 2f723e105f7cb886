//! Property-based tests for reversing entry derivation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, JournalEntryId};

use super::reversal::ReversalService;
use super::types::{JournalLine, JournalLineInput, LineTotals};
use super::validation::{DEFAULT_BALANCE_TOLERANCE, is_balanced, validate_line_set};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Balanced posted lines: debit/credit pairs of equal amounts.
fn arb_posted_lines() -> impl Strategy<Value = Vec<JournalLine>> {
    prop::collection::vec((arb_amount(), prop::option::of("[a-zA-Z ]{0,20}")), 1..4).prop_map(
        |pairs| {
            let inputs = pairs
                .into_iter()
                .flat_map(|(amount, description)| {
                    let mut debit = JournalLineInput::debit(AccountId::new(), amount);
                    debit.description = description;
                    [debit, JournalLineInput::credit(AccountId::new(), amount)]
                })
                .collect();
            JournalLine::from_inputs(JournalEntryId::new(), inputs)
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The reversal of a balanced entry is itself a valid balanced entry.
    #[test]
    fn prop_reversal_is_balanced(lines in arb_posted_lines()) {
        let reversing = ReversalService::reversing_lines(&lines);
        prop_assert!(validate_line_set(&reversing).is_ok());
        prop_assert!(is_balanced(&reversing, DEFAULT_BALANCE_TOLERANCE));
    }

    /// Per line, account is preserved and sides are swapped.
    #[test]
    fn prop_reversal_mirrors_lines(lines in arb_posted_lines()) {
        let reversing = ReversalService::reversing_lines(&lines);
        prop_assert_eq!(reversing.len(), lines.len());
        for (original, reversed) in lines.iter().zip(reversing.iter()) {
            prop_assert_eq!(original.account_id, reversed.account_id);
            prop_assert_eq!(original.debit, reversed.credit);
            prop_assert_eq!(original.credit, reversed.debit);
            let description = reversed.description.as_deref().unwrap_or_default();
            match original.description.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => {
                    prop_assert_eq!(description, format!("Reversal: {text}"));
                }
                _ => prop_assert_eq!(description, "Reversal"),
            }
        }
    }

    /// Original plus reversal nets to zero on every account.
    #[test]
    fn prop_reversal_nets_to_zero(lines in arb_posted_lines()) {
        let reversing = ReversalService::reversing_lines(&lines);
        prop_assert!(ReversalService::negates(&lines, &reversing));
        for (original, reversed) in lines.iter().zip(reversing.iter()) {
            let mirrored = LineTotals::of(std::slice::from_ref(reversed));
            prop_assert_eq!(original.signed_amount() + mirrored.difference(), Decimal::ZERO);
        }
    }

    /// Fallback numbers never collide with the primary candidate.
    #[test]
    fn prop_reversal_numbers_distinct(number in "[A-Z]{2}-[0-9]{1,6}", attempt in 2u32..50) {
        let first = ReversalService::reversal_number(&number, "-REV", 1);
        let later = ReversalService::reversal_number(&number, "-REV", attempt);
        prop_assert_ne!(&first, &later);
        prop_assert!(later.starts_with(&first));
    }

    /// The plan always carries a memo and the requested date.
    #[test]
    fn prop_plan_has_memo(lines in arb_posted_lines(), day in 1u32..28) {
        let date = NaiveDate::from_ymd_opt(2026, 4, day).unwrap();
        let plan = ReversalService::plan("JE-1", &lines, "-REV", date, None);
        prop_assert_eq!(plan.date, date);
        prop_assert_eq!(plan.memo, "Reversal of JE-1");
        prop_assert_eq!(plan.lines.len(), lines.len());
    }
}
