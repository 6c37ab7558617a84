//! The financial summary that accompanies a general chat question.

use crate::engine::aggregate::ledger_totals;
use crate::model::{TransactionRow, RUPEE};

/// The first system message of every completion request.
pub const SYSTEM_INSTRUCTION: &str = "Your helpful expense tracking assistant.";

/// How many rows, from the start of the ledger, are listed as recent.
pub const RECENT_ROWS: usize = 10;

/// Builds the context text from a full ledger snapshot.
///
/// Amount cells are shown as they appear in the sheet, with empty cells shown as `0`. Totals are
/// computed leniently over every row.
pub fn build_context(rows: &[TransactionRow]) -> String {
    let totals = ledger_totals(rows);
    let highest = totals
        .highest_expense
        .as_ref()
        .map(|row| {
            format!(
                "{} - {} - {RUPEE}{}",
                row.date(),
                row.remarks(),
                row.debit_amount()
            )
        })
        .unwrap_or_default();

    let mut out = format!(
        "Current account information:\n\
         - Total Balance: {RUPEE}{}\n\
         - Total Credits: {RUPEE}{}\n\
         - Total Debits: {RUPEE}{}\n\
         - Highest Expense: {highest}\n\
         \n\
         Number of transactions: {}\n\
         \n\
         Recent Transactions:\n",
        totals.balance, totals.total_credit, totals.total_debit, totals.count,
    );

    let recent: Vec<String> = rows
        .iter()
        .take(RECENT_ROWS)
        .map(|row| {
            format!(
                "{} - {} - Debit: {RUPEE}{} - Credit: {RUPEE}{}",
                row.date(),
                row.remarks(),
                or_zero(row.debit()),
                or_zero(row.credit())
            )
        })
        .collect();
    out.push_str(&recent.join("\n"));

    out.push_str("\n\nTransaction History (Format: Date - Description - Debit - Credit):\n");
    let history: Vec<String> = rows
        .iter()
        .map(|row| {
            format!(
                "{} - {} - {RUPEE}{} - {RUPEE}{}",
                row.date(),
                row.remarks(),
                or_zero(row.debit()),
                or_zero(row.credit())
            )
        })
        .collect();
    out.push_str(&history.join("\n"));

    out.push_str(
        "\n\nUse this information to answer user queries about their finances. \
         When mentioning amounts, always include the ₹ symbol.\n",
    );
    out
}

fn or_zero(cell: &str) -> &str {
    if cell.is_empty() {
        "0"
    } else {
        cell
    }
}
