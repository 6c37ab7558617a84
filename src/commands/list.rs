//! Commands that list ledger rows and months.

use crate::args::{ListArgs, MonthArgs};
use crate::commands::{format_rows, open_ledger, parse_date_arg, read_rows, Out};
use crate::engine::months::current_month;
use crate::engine::{month_index, rows_in_month, LedgerQuery, MonthKey};
use crate::error::{ErrorType, IntoResult};
use crate::model::TransactionRow;
use crate::{Config, Mode, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// The rows of one month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthView {
    /// `None` when the ledger has no dated rows and no month was asked for.
    pub month: Option<MonthKey>,
    pub rows: Vec<TransactionRow>,
}

/// Lists ledger rows. With a search query only matching rows are listed. With both `from` and
/// `to`, only rows dated within the range are listed and they stay in sheet order; otherwise rows
/// are listed most recent first.
///
/// # Errors
/// - A `from` or `to` that is not shaped `dd/mm/yyyy` is a validation error.
pub async fn list(config: Config, mode: Mode, args: ListArgs) -> Result<Out<Vec<TransactionRow>>> {
    let from = args.from.as_deref().map(parse_date_arg).transpose()?;
    let to = args.to.as_deref().map(parse_date_arg).transpose()?;
    let query = LedgerQuery::new(
        args.query,
        from.map(|d| d.date()),
        to.map(|d| d.date()),
    );
    debug!("{query:?}");

    let mut ledger = open_ledger(&config, mode).await?;
    let rows = read_rows(ledger.as_mut()).await;
    let selected = query.apply(&rows);
    let message = if selected.is_empty() {
        "No transactions found".to_string()
    } else {
        format!(
            "{} of {} transactions\n{}",
            selected.len(),
            rows.len(),
            format_rows(&selected)
        )
    };
    Ok(Out::new(message, selected))
}

/// Lists the months that have rows, in the order they first appear in the sheet.
pub async fn months(config: Config, mode: Mode) -> Result<Out<Vec<MonthKey>>> {
    let mut ledger = open_ledger(&config, mode).await?;
    let rows = read_rows(ledger.as_mut()).await;
    let index = month_index(&rows);
    let message = if index.is_empty() {
        "No months found".to_string()
    } else {
        index
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    };
    Ok(Out::new(message, index))
}

/// Lists the rows dated within a month, in sheet order. Without a month, the first month found in
/// the ledger is used.
///
/// # Errors
/// - A month that is not shaped `MM/YYYY` is a validation error.
pub async fn month(config: Config, mode: Mode, args: MonthArgs) -> Result<Out<MonthView>> {
    let requested = args
        .month
        .as_deref()
        .map(MonthKey::from_str)
        .transpose()
        .pub_result(ErrorType::Validation)?;

    let mut ledger = open_ledger(&config, mode).await?;
    let rows = read_rows(ledger.as_mut()).await;
    let month = match requested {
        Some(month) => Some(month),
        None => current_month(&month_index(&rows)).cloned(),
    };
    let Some(month) = month else {
        return Ok(Out::new(
            "No months found",
            MonthView {
                month: None,
                rows: Vec::new(),
            },
        ));
    };

    let selected = rows_in_month(&rows, &month);
    let message = if selected.is_empty() {
        format!("No transactions in {month}")
    } else {
        format!(
            "{} transactions in {month}\n{}",
            selected.len(),
            format_rows(&selected)
        )
    };
    Ok(Out::new(
        message,
        MonthView {
            month: Some(month),
            rows: selected,
        },
    ))
}
