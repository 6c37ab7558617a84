use crate::model::date::{self, LedgerDate};
use crate::model::Amount;
use crate::Result;
use anyhow::bail;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Index of the date cell in a ledger row.
pub const DATE_IDX: usize = 0;
/// Index of the remarks cell in a ledger row.
pub const REMARKS_IDX: usize = 1;
/// Index of the debit cell in a ledger row.
pub const DEBIT_IDX: usize = 2;
/// Index of the credit cell in a ledger row.
pub const CREDIT_IDX: usize = 3;
/// Index of the total cell in a ledger row.
pub const TOTAL_IDX: usize = 4;
/// The number of cells in a ledger row.
pub const COLUMN_COUNT: usize = 5;

/// Represents a single row of the ledger: `date, remarks, debit, credit, total`.
///
/// Cell text is held exactly as it was read from, or will be written to, the sheet. Numeric
/// interpretation happens on demand through `Amount::lenient`, so a row whose cells contain
/// something unexpected is still readable.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionRow {
    pub(crate) date: String,
    pub(crate) remarks: String,
    pub(crate) debit: String,
    pub(crate) credit: String,
    pub(crate) total: String,
}

impl TransactionRow {
    /// Creates a new row, computing `total` as `credit - debit` with empty sides treated as zero.
    pub fn new(
        date: &LedgerDate,
        remarks: impl Into<String>,
        debit: impl Into<String>,
        credit: impl Into<String>,
    ) -> Self {
        let debit = debit.into();
        let credit = credit.into();
        let total = Amount::lenient(&credit) - Amount::lenient(&debit);
        Self {
            date: date.to_string(),
            remarks: remarks.into(),
            debit,
            credit,
            total: total.to_string(),
        }
    }

    /// Creates a row from the cells of a sheet row. Sheets omit trailing empty cells, so short rows
    /// are padded with empty strings. A row with more cells than the ledger has columns is an error.
    pub fn from_cells<S, I>(cells: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let mut values: Vec<String> = cells.into_iter().map(|s| s.into()).collect();
        if values.len() > COLUMN_COUNT {
            bail!(
                "A ledger row has {} cells but at most {COLUMN_COUNT} are expected",
                values.len()
            );
        }
        values.resize(COLUMN_COUNT, String::new());
        let mut it = values.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Ok(Self {
            date: next(),
            remarks: next(),
            debit: next(),
            credit: next(),
            total: next(),
        })
    }

    /// Returns the cells of the row in sheet column order.
    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = vec![String::new(); COLUMN_COUNT];
        cells[DATE_IDX] = self.date.clone();
        cells[REMARKS_IDX] = self.remarks.clone();
        cells[DEBIT_IDX] = self.debit.clone();
        cells[CREDIT_IDX] = self.credit.clone();
        cells[TOTAL_IDX] = self.total.clone();
        cells
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn debit(&self) -> &str {
        &self.debit
    }

    pub fn credit(&self) -> &str {
        &self.credit
    }

    pub fn total(&self) -> &str {
        &self.total
    }

    /// The calendar date of the row, or `None` if the date cell cannot be parsed.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        date::parse(&self.date)
    }

    pub fn debit_amount(&self) -> Amount {
        Amount::lenient(&self.debit)
    }

    pub fn credit_amount(&self) -> Amount {
        Amount::lenient(&self.credit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_computes_total() {
        let date = LedgerDate::from_str("05/03/2024").unwrap();
        let row = TransactionRow::new(&date, "groceries", "500", "");
        assert_eq!(row.total(), "-500");

        let row = TransactionRow::new(&date, "salary", "", "50000");
        assert_eq!(row.total(), "50000");

        let row = TransactionRow::new(&date, "refund", "20.25", "100");
        assert_eq!(row.total(), "79.75");
    }

    #[test]
    fn test_from_cells_pads_short_rows() {
        let row = TransactionRow::from_cells(vec!["01/01/2024", "coffee", "120"]).unwrap();
        assert_eq!(row.date(), "01/01/2024");
        assert_eq!(row.remarks(), "coffee");
        assert_eq!(row.debit(), "120");
        assert_eq!(row.credit(), "");
        assert_eq!(row.total(), "");
    }

    #[test]
    fn test_from_cells_rejects_long_rows() {
        let cells = vec!["01/01/2024", "coffee", "120", "", "-120", "extra"];
        assert!(TransactionRow::from_cells(cells).is_err());
    }

    #[test]
    fn test_cells_keep_column_order() {
        let cells = vec!["15/01/2024", "rent", "15000", "", "-15000"];
        let row = TransactionRow::from_cells(cells.clone()).unwrap();
        assert_eq!(row.to_cells(), cells);
        assert_eq!(row.to_cells()[TOTAL_IDX], "-15000");
    }

    #[test]
    fn test_amounts_are_lenient() {
        let row = TransactionRow::from_cells(vec!["x", "y", "abc", "₹1,000"]).unwrap();
        assert!(row.debit_amount().is_zero());
        assert_eq!(row.credit_amount().to_string(), "1000");
        assert_eq!(row.parsed_date(), None);
    }
}
