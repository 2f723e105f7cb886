//! Aging report and outstanding-balance summary over AR invoices.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::Invoice;

/// Window used for "due soon" in the invoice summary.
pub const DUE_SOON_DAYS: u64 = 30;

/// Aging band by days past due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBand {
    /// Not yet past due.
    Current,
    /// 1 to 30 days past due.
    Days1To30,
    /// 31 to 60 days past due.
    Days31To60,
    /// 61 to 90 days past due.
    Days61To90,
    /// More than 90 days past due.
    Over90,
}

impl AgingBand {
    /// All bands, youngest first.
    pub const ALL: [Self; 5] = [
        Self::Current,
        Self::Days1To30,
        Self::Days31To60,
        Self::Days61To90,
        Self::Over90,
    ];

    /// Classifies a days-past-due figure.
    #[must_use]
    pub const fn for_days_past_due(days: i64) -> Self {
        match days {
            i64::MIN..=0 => Self::Current,
            1..=30 => Self::Days1To30,
            31..=60 => Self::Days31To60,
            61..=90 => Self::Days61To90,
            _ => Self::Over90,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Days1To30 => "1-30",
            Self::Days31To60 => "31-60",
            Self::Days61To90 => "61-90",
            Self::Over90 => "90+",
        }
    }
}

impl std::fmt::Display for AgingBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Totals for one aging band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingBucket {
    /// The band.
    pub band: AgingBand,
    /// Sum of outstanding balances.
    pub amount: Decimal,
    /// Number of invoices.
    pub invoice_count: usize,
}

/// Outstanding balances bucketed by days past due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingReport {
    /// Evaluation date.
    pub as_of: NaiveDate,
    /// One bucket per band, youngest first.
    pub buckets: Vec<AgingBucket>,
    /// Sum across all buckets.
    pub total: Decimal,
}

impl AgingReport {
    /// Builds the report over the open and partial invoices in `invoices`.
    #[must_use]
    pub fn build<'a, I>(invoices: I, as_of: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Invoice>,
    {
        let mut buckets = AgingBand::ALL.map(|band| AgingBucket {
            band,
            amount: Decimal::ZERO,
            invoice_count: 0,
        });

        for invoice in invoices.into_iter().filter(|i| i.status.is_outstanding()) {
            let band = AgingBand::for_days_past_due(invoice.days_past_due(as_of));
            if let Some(bucket) = buckets.iter_mut().find(|b| b.band == band) {
                bucket.amount += invoice.balance_due;
                bucket.invoice_count += 1;
            }
        }

        let total = buckets.iter().map(|b| b.amount).sum();
        Self {
            as_of,
            buckets: buckets.to_vec(),
            total,
        }
    }

    /// Returns the bucket for a band.
    #[must_use]
    pub fn bucket(&self, band: AgingBand) -> Option<&AgingBucket> {
        self.buckets.iter().find(|b| b.band == band)
    }
}

/// Aggregates over outstanding invoices for the invoice list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvoiceSummary {
    /// Sum of balances due.
    pub total_open: Decimal,
    /// Sum of balances due past their due date.
    pub total_overdue: Decimal,
    /// Sum of balances due from today through the next 30 days.
    pub due_next_30_days: Decimal,
    /// Number of outstanding invoices.
    pub open_count: usize,
    /// Number of overdue invoices.
    pub overdue_count: usize,
}

impl InvoiceSummary {
    /// Builds the summary over the open and partial invoices in `invoices`.
    #[must_use]
    pub fn build<'a, I>(invoices: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Invoice>,
    {
        let horizon = today
            .checked_add_days(Days::new(DUE_SOON_DAYS))
            .unwrap_or(NaiveDate::MAX);

        invoices
            .into_iter()
            .filter(|i| i.status.is_outstanding())
            .fold(Self::default(), |mut acc, invoice| {
                acc.total_open += invoice.balance_due;
                acc.open_count += 1;
                if invoice.is_overdue(today) {
                    acc.total_overdue += invoice.balance_due;
                    acc.overdue_count += 1;
                } else if invoice.due_date <= horizon {
                    acc.due_next_30_days += invoice.balance_due;
                }
                acc
            })
    }
}
