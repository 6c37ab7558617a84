//! The `summary` command: the three-month chart data, the trend, the ledger totals and the summary
//! cells kept in the sheet.

use crate::commands::{open_ledger, read_rows, Out};
use crate::engine::{ledger_totals, monthly_report, LedgerTotals, MonthlyReport};
use crate::model::TransactionRow;
use crate::{Config, Mode, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Summary {
    pub report: MonthlyReport,
    pub totals: LedgerTotals,
    /// The summary range of the sheet, verbatim.
    pub summary_cells: Vec<Vec<String>>,
}

pub async fn summary(config: Config, mode: Mode) -> Result<Out<Summary>> {
    let mut ledger = open_ledger(&config, mode).await?;
    let rows = read_rows(ledger.as_mut()).await;
    let summary_cells = match ledger.read_totals().await {
        Ok(cells) => cells,
        Err(e) => {
            warn!("Unable to read the summary cells: {e:#}");
            Vec::new()
        }
    };
    let summary = summarize(&rows, summary_cells, Local::now().date_naive());
    Ok(Out::new(render(&summary), summary))
}

fn summarize(rows: &[TransactionRow], summary_cells: Vec<Vec<String>>, today: NaiveDate) -> Summary {
    Summary {
        report: monthly_report(rows, today),
        totals: ledger_totals(rows),
        summary_cells,
    }
}

fn render(summary: &Summary) -> String {
    let mut lines: Vec<String> = summary
        .summary_cells
        .iter()
        .map(|cells| cells.join(": "))
        .collect();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.extend(summary.report.months.iter().map(|month| {
        format!(
            "{}: credit {}, debit {}",
            month.month,
            month.credit.rupees(),
            month.debit.rupees()
        )
    }));
    lines.push(summary.report.trend.describe());
    lines.push(String::new());

    let totals = &summary.totals;
    lines.push(format!(
        "{} transactions, balance {} (credits {}, debits {})",
        totals.count,
        totals.balance.rupees(),
        totals.total_credit.rupees(),
        totals.total_debit.rupees()
    ));
    if let Some(row) = &totals.highest_expense {
        lines.push(format!(
            "Highest expense: {} on {}, {}",
            row.remarks(),
            row.date(),
            row.debit_amount().rupees()
        ));
    }
    lines.join("\n")
}
