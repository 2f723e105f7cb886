//! Reversal service for negating posted journal entries.
//!
//! A reversal is a new posted entry whose lines mirror the original with
//! debits and credits swapped. The original is never edited beyond its status.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::types::{JournalLine, JournalLineInput, LineTotals};

/// Default suffix appended to the original journal number.
pub const DEFAULT_REVERSAL_SUFFIX: &str = "-REV";

/// Description of a reversing line whose original had none.
pub const REVERSAL_LINE_DESCRIPTION: &str = "Reversal";

/// Appended to a line's reference type on its reversing line, so a reference
/// lookup tells the original posting apart from its reversal.
pub const REVERSAL_REFERENCE_SUFFIX: &str = "_reversal";

/// A fully derived reversal, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalPlan {
    /// Candidate journal number.
    pub journal_number: String,
    /// Accounting date of the reversal.
    pub date: NaiveDate,
    /// Memo of the reversal.
    pub memo: String,
    /// Reversing lines in the original order.
    pub lines: Vec<JournalLineInput>,
}

/// Stateless service for deriving reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Returns the journal number to try on `attempt` (starting at 1).
    ///
    /// The first attempt is `{original}{suffix}`; later attempts append `-{attempt}`.
    #[must_use]
    pub fn reversal_number(original: &str, suffix: &str, attempt: u32) -> String {
        if attempt <= 1 {
            format!("{original}{suffix}")
        } else {
            format!("{original}{suffix}-{attempt}")
        }
    }

    /// Returns the memo used when the caller supplies none.
    #[must_use]
    pub fn default_memo(original_number: &str) -> String {
        format!("Reversal of {original_number}")
    }

    /// Creates reversing lines by swapping debits and credits.
    ///
    /// Account, department and reference id are preserved. Descriptions become
    /// `"Reversal: {original}"`, or `"Reversal"` when the original had none,
    /// and reference types gain [`REVERSAL_REFERENCE_SUFFIX`].
    #[must_use]
    pub fn reversing_lines(original: &[JournalLine]) -> Vec<JournalLineInput> {
        original
            .iter()
            .map(|line| JournalLineInput {
                account_id: line.account_id,
                description: Some(Self::reversal_description(line.description.as_deref())),
                debit: line.credit,
                credit: line.debit,
                department_id: line.department_id,
                reference_type: line
                    .reference_type
                    .as_deref()
                    .map(Self::reversal_reference_type),
                reference_id: line.reference_id,
            })
            .collect()
    }

    /// Description of the line reversing one described as `original`.
    #[must_use]
    pub fn reversal_description(original: Option<&str>) -> String {
        match original.map(str::trim) {
            Some(text) if !text.is_empty() => format!("{REVERSAL_LINE_DESCRIPTION}: {text}"),
            _ => REVERSAL_LINE_DESCRIPTION.to_string(),
        }
    }

    /// Reference type carried by the line reversing one tagged `original`.
    #[must_use]
    pub fn reversal_reference_type(original: &str) -> String {
        format!("{original}{REVERSAL_REFERENCE_SUFFIX}")
    }

    /// Derives the full reversal for an original entry.
    #[must_use]
    pub fn plan(
        original_number: &str,
        original_lines: &[JournalLine],
        suffix: &str,
        date: NaiveDate,
        memo: Option<String>,
    ) -> ReversalPlan {
        ReversalPlan {
            journal_number: Self::reversal_number(original_number, suffix, 1),
            date,
            memo: memo
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| Self::default_memo(original_number)),
            lines: Self::reversing_lines(original_lines),
        }
    }

    /// Returns true if the reversing lines exactly negate the original lines.
    #[must_use]
    pub fn negates(original: &[JournalLine], reversing: &[JournalLineInput]) -> bool {
        let before = LineTotals::of(original);
        let after = LineTotals::of(reversing);
        original.len() == reversing.len()
            && before.debit == after.credit
            && before.credit == after.debit
            && before.difference() + after.difference() == Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::{AccountId, DepartmentId, JournalEntryId};

    fn original_lines() -> Vec<JournalLine> {
        let journal_id = JournalEntryId::new();
        JournalLine::from_inputs(
            journal_id,
            vec![
                JournalLineInput::debit(AccountId::new(), dec!(100.00))
                    .with_description("Office supplies")
                    .with_department(DepartmentId::new()),
                JournalLineInput::credit(AccountId::new(), dec!(100.00)),
            ],
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    #[test]
    fn test_reversal_number() {
        assert_eq!(ReversalService::reversal_number("JE-7", "-REV", 1), "JE-7-REV");
        assert_eq!(ReversalService::reversal_number("JE-7", "-REV", 2), "JE-7-REV-2");
        assert_eq!(ReversalService::reversal_number("JE-7", "/R", 3), "JE-7/R-3");
    }

    #[test]
    fn test_reversing_lines_swap_amounts() {
        let original = original_lines();
        let reversing = ReversalService::reversing_lines(&original);

        assert_eq!(reversing.len(), 2);
        assert_eq!(reversing[0].account_id, original[0].account_id);
        assert_eq!(reversing[0].debit, Decimal::ZERO);
        assert_eq!(reversing[0].credit, dec!(100.00));
        assert_eq!(reversing[1].debit, dec!(100.00));
        assert_eq!(reversing[1].credit, Decimal::ZERO);
        assert_eq!(reversing[0].department_id, original[0].department_id);
    }

    #[test]
    fn test_reversing_lines_prefix_description() {
        let reversing = ReversalService::reversing_lines(&original_lines());
        assert_eq!(
            reversing[0].description.as_deref(),
            Some("Reversal: Office supplies")
        );
        assert_eq!(reversing[1].description.as_deref(), Some("Reversal"));
        assert_eq!(ReversalService::reversal_description(Some("  ")), "Reversal");
    }

    #[test]
    fn test_reversing_lines_retag_reference() {
        let payment = uuid::Uuid::now_v7();
        let original = JournalLine::from_inputs(
            JournalEntryId::new(),
            vec![
                JournalLineInput::debit(AccountId::new(), dec!(40)).with_reference("ar_payment", payment),
                JournalLineInput::credit(AccountId::new(), dec!(40)),
            ],
        );
        let reversing = ReversalService::reversing_lines(&original);
        assert_eq!(reversing[0].reference_type.as_deref(), Some("ar_payment_reversal"));
        assert_eq!(reversing[0].reference_id, Some(payment));
        assert_eq!(reversing[1].reference_type, None);
    }

    #[test]
    fn test_plan_default_memo() {
        let plan = ReversalService::plan("JE-7", &original_lines(), "-REV", date(), None);
        assert_eq!(plan.journal_number, "JE-7-REV");
        assert_eq!(plan.memo, "Reversal of JE-7");
        assert_eq!(plan.date, date());

        let blank = ReversalService::plan("JE-7", &original_lines(), "-REV", date(), Some("  ".into()));
        assert_eq!(blank.memo, "Reversal of JE-7");
    }

    #[test]
    fn test_plan_custom_memo() {
        let plan = ReversalService::plan(
            "JE-7",
            &original_lines(),
            "-REV",
            date(),
            Some("Wrong vendor".into()),
        );
        assert_eq!(plan.memo, "Wrong vendor");
    }

    #[test]
    fn test_negates() {
        let original = original_lines();
        let reversing = ReversalService::reversing_lines(&original);
        assert!(ReversalService::negates(&original, &reversing));

        let mut tampered = reversing;
        tampered[0].credit = dec!(99);
        assert!(!ReversalService::negates(&original, &tampered));
    }
}
