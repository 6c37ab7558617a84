//! Monthly totals, the month-over-month trend, and whole-ledger totals.

use crate::engine::months::MonthKey;
use crate::model::{Amount, TransactionRow};
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How many calendar months, ending with the current one, are charted.
pub const CHART_MONTHS: u32 = 3;

/// Credit and debit sums for one calendar month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthlyTotals {
    /// Full month name, e.g. `March`.
    pub month: String,
    pub credit: Amount,
    pub debit: Amount,
}

impl MonthlyTotals {
    pub fn net(&self) -> Amount {
        self.credit - self.debit
    }
}

/// The change in net (credit minus debit) from the previous month to the current month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Trend {
    /// `|(net(current) - net(previous)) / net(previous)| * 100`, rounded to one decimal. `None`
    /// when the previous month's net is zero and the percentage is undefined.
    pub percentage: Option<Amount>,
    /// True when the current month's net is greater than the previous month's.
    pub is_up: bool,
}

impl Trend {
    pub fn between(previous: Amount, current: Amount) -> Self {
        let percentage = if previous.is_zero() {
            None
        } else {
            let ratio = (current.value() - previous.value()) / previous.value();
            Some(Amount::new((ratio * Decimal::ONE_HUNDRED).abs()).round_dp(1))
        };
        Self {
            percentage,
            is_up: current > previous,
        }
    }

    /// A sentence like `Up by 50% this month`. An undefined percentage reads as `n/a`.
    pub fn describe(&self) -> String {
        let direction = if self.is_up { "Up" } else { "Down" };
        match &self.percentage {
            Some(p) => format!("{direction} by {p}% this month"),
            None => format!("{direction} by n/a this month"),
        }
    }
}

/// The three charted months, oldest first, and the trend between the last two.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthlyReport {
    pub months: Vec<MonthlyTotals>,
    pub trend: Trend,
}

/// Sums credits and debits for the current month of `today` and the two months before it. The
/// result is ordered oldest to newest.
pub fn monthly_totals(rows: &[TransactionRow], today: NaiveDate) -> Vec<MonthlyTotals> {
    let mut months: Vec<MonthlyTotals> = (0..CHART_MONTHS)
        .filter_map(|i| today.checked_sub_months(Months::new(i)))
        .map(|date| month_totals(rows, date))
        .collect();
    months.reverse();
    months
}

/// Builds the chart data and the trend between the two most recent months.
pub fn monthly_report(rows: &[TransactionRow], today: NaiveDate) -> MonthlyReport {
    let months = monthly_totals(rows, today);
    let net = |ix: usize| months.get(ix).map(MonthlyTotals::net).unwrap_or_default();
    let len = months.len();
    let trend = Trend::between(net(len.saturating_sub(2)), net(len.saturating_sub(1)));
    MonthlyReport { months, trend }
}

fn month_totals(rows: &[TransactionRow], date: NaiveDate) -> MonthlyTotals {
    let key = MonthKey::from(date);
    let in_month: Vec<&TransactionRow> = rows
        .iter()
        .filter(|row| row.parsed_date().is_some_and(|d| key.contains(d)))
        .collect();
    MonthlyTotals {
        month: date.format("%B").to_string(),
        credit: in_month.iter().map(|row| row.credit_amount()).sum(),
        debit: in_month.iter().map(|row| row.debit_amount()).sum(),
    }
}

/// Totals over every row of the ledger.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerTotals {
    pub total_credit: Amount,
    pub total_debit: Amount,
    /// `total_credit - total_debit`
    pub balance: Amount,
    /// The row with the largest debit. Ties go to the earliest row. `None` when no row has a
    /// positive debit.
    pub highest_expense: Option<TransactionRow>,
    pub count: usize,
}

pub fn ledger_totals(rows: &[TransactionRow]) -> LedgerTotals {
    let mut totals = LedgerTotals {
        count: rows.len(),
        ..Default::default()
    };
    let mut highest = Amount::ZERO;
    for row in rows {
        let debit = row.debit_amount();
        totals.total_credit = totals.total_credit + row.credit_amount();
        totals.total_debit = totals.total_debit + debit;
        if debit > highest {
            highest = debit;
            totals.highest_expense = Some(row.clone());
        }
    }
    totals.balance = totals.total_credit - totals.total_debit;
    totals
}
