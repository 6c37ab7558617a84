//! Implements the very simple `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.
//!
//! State is kept in a process-wide map keyed by spreadsheet ID. Every `TestSheet` created for the
//! same ID sees the same cells, so a test can seed or inspect the sheet that a command used.

use crate::api::range::A1Range;
use crate::api::Sheet;
use crate::Result;
use anyhow::{bail, Context};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// The tab that the seed data is loaded into.
pub(crate) const SEED_TAB: &str = "Sheet1";

static STATE: Lazy<Mutex<HashMap<String, TestSheetState>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// The cells of every tab of an in-memory spreadsheet, plus switches to simulate failures.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct TestSheetState {
    /// Tab name to grid. `grid[0][0]` is cell `A1`.
    pub(crate) tabs: HashMap<String, Vec<Vec<String>>>,
    pub(crate) fail_reads: bool,
    pub(crate) fail_writes: bool,
}

impl TestSheetState {
    /// A state whose only tab is `tab`, holding `grid`.
    pub(crate) fn with_tab(tab: &str, grid: Vec<Vec<String>>) -> Self {
        Self {
            tabs: HashMap::from([(tab.to_string(), grid)]),
            ..Default::default()
        }
    }

    /// The seed ledger.
    pub(crate) fn seeded() -> Result<Self> {
        Ok(Self::with_tab(SEED_TAB, load_csv(LEDGER_DATA)?))
    }

    /// Rows `first_row..` of `tab` (0-based), trailing empty cells trimmed.
    #[cfg(test)]
    pub(crate) fn rows_from(&self, tab: &str, first_row: usize) -> Vec<Vec<String>> {
        self.tabs
            .get(tab)
            .map(|grid| grid.iter().skip(first_row).cloned().map(trim_row).collect())
            .unwrap_or_default()
    }
}

/// An implementation of the `Sheet` trait that does not use Google sheets.
pub(crate) struct TestSheet {
    spreadsheet_id: String,
}

impl TestSheet {
    /// Create a `TestSheet` for `spreadsheet_id`. The first time an ID is seen its state is seeded
    /// with the data from this module.
    pub(crate) fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    pub(crate) fn get_state(&self) -> TestSheetState {
        self.with_state(|state| state.clone())
    }

    pub(crate) fn set_state(&self, state: TestSheetState) {
        self.with_state(|current| *current = state)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TestSheetState) -> T) -> T {
        let mut map = STATE.lock().unwrap_or_else(PoisonError::into_inner);
        let state = map
            .entry(self.spreadsheet_id.clone())
            .or_insert_with(|| TestSheetState::seeded().unwrap_or_default());
        f(state)
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self, range: &str) -> Result<Vec<Vec<String>>> {
        trace!("test sheet get {range}");
        let a1 = A1Range::parse(range)?;
        self.with_state(|state| {
            if state.fail_reads {
                bail!("Simulated read failure for {range}");
            }
            let grid = state
                .tabs
                .get(&a1.sheet)
                .with_context(|| format!("Sheet '{}' not found", a1.sheet))?;
            Ok(read_grid(grid, &a1))
        })
    }

    async fn append(&mut self, range: &str, rows: Vec<Vec<String>>) -> Result<()> {
        let a1 = A1Range::parse(range)?;
        // Finding the end of the table and writing happen under one lock.
        self.with_state(|state| {
            if state.fail_writes {
                bail!("Simulated write failure for {range}");
            }
            let grid = state.tabs.entry(a1.sheet.clone()).or_default();
            let row_ix = a1.first_row() + read_grid(grid, &a1).len();
            trace!("test sheet append {} rows at row {}", rows.len(), row_ix + 1);
            write_grid(grid, row_ix, a1.start.col, &rows);
            Ok(())
        })
    }
}

/// Reads the cells of `a1` the way the Sheets API returns them: trailing empty cells and trailing
/// empty rows are omitted.
fn read_grid(grid: &[Vec<String>], a1: &A1Range) -> Vec<Vec<String>> {
    let first_row = a1.first_row();
    let first_col = a1.start.col;
    let last_col = a1.last_col();
    let mut rows: Vec<Vec<String>> = grid
        .iter()
        .enumerate()
        .skip(first_row)
        .take_while(|(ix, _)| a1.last_row().map_or(true, |last| *ix <= last))
        .map(|(_, row)| {
            let cells = row
                .iter()
                .skip(first_col)
                .take((last_col + 1).saturating_sub(first_col))
                .cloned()
                .collect();
            trim_row(cells)
        })
        .collect();
    while rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }
    rows
}

/// Writes `values` with its top-left corner at the 0-based `first_row` and `first_col`.
fn write_grid(
    grid: &mut Vec<Vec<String>>,
    first_row: usize,
    first_col: usize,
    values: &[Vec<String>],
) {
    for (offset, row_values) in values.iter().enumerate() {
        let row_ix = first_row + offset;
        if grid.len() <= row_ix {
            grid.resize(row_ix + 1, Vec::new());
        }
        let row = &mut grid[row_ix];
        let needed = first_col + row_values.len();
        if row.len() < needed {
            row.resize(needed, String::new());
        }
        for (col_offset, value) in row_values.iter().enumerate() {
            row[first_col + col_offset] = value.clone();
        }
    }
}

fn trim_row(mut row: Vec<String>) -> Vec<String> {
    while row.last().is_some_and(|cell| cell.is_empty()) {
        row.pop();
    }
    row
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.context("Unable to parse seed CSV")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed ledger. Rows 1 to 3 hold a title, the summary cells in `F1:G3` and the column headers.
/// Ledger rows start at row 4.
const LEDGER_DATA: &str = r##"Personal Ledger,,,,,Total Credit,160000
,,,,,Total Debit,61050
Date,Remarks,Debit,Credit,Total,Balance,98950
01/01/2024,Salary,,50000,50000
03/01/2024,Rent,15000,,-15000
10/01/2024,Groceries,3200,,-3200
18/01/2024,Electricity bill,1450,,-1450
01/02/2024,Salary,,50000,50000
05/02/2024,Rent,15000,,-15000
14/02/2024,Dinner with friends,2100,,-2100
22/02/2024,Groceries,2800,,-2800
01/03/2024,Salary,,52000,52000
04/03/2024,Rent,15000,,-15000
12/03/2024,Laptop repair,6500,,-6500
25/03/2024,Freelance project,,8000,8000
"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn sheet() -> TestSheet {
        TestSheet::new(format!("test-sheet-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_seeded_ledger_rows() {
        let mut sheet = sheet();
        let rows = sheet.get("Sheet1!A4:E").await.unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0], vec!["01/01/2024", "Salary", "", "50000", "50000"]);
        assert_eq!(rows[1], vec!["03/01/2024", "Rent", "15000", "", "-15000"]);
    }

    #[tokio::test]
    async fn test_seeded_summary_cells() {
        let mut sheet = sheet();
        let totals = sheet.get("Sheet1!F1:G3").await.unwrap();
        assert_eq!(
            totals,
            strings(&[
                &["Total Credit", "160000"],
                &["Total Debit", "61050"],
                &["Balance", "98950"],
            ])
        );
    }

    #[tokio::test]
    async fn test_append_then_read() {
        let mut sheet = sheet();
        sheet.set_state(TestSheetState::with_tab("Ledger", Vec::new()));
        sheet
            .append("Ledger!A2:E", strings(&[&["01/01/2024", "x", "1", "", "-1"]]))
            .await
            .unwrap();
        sheet
            .append("Ledger!A2:E", strings(&[&["02/01/2024", "y", "", "5", "5"]]))
            .await
            .unwrap();
        let rows = sheet.get("Ledger!A1:E").await.unwrap();
        assert_eq!(
            rows,
            strings(&[
                &[],
                &["01/01/2024", "x", "1", "", "-1"],
                &["02/01/2024", "y", "", "5", "5"],
            ])
        );
        assert!(sheet.get("Missing!A1:E").await.is_err());
    }

    #[tokio::test]
    async fn test_append_after_seeded_rows() {
        let mut sheet = sheet();
        sheet
            .append("Sheet1!A4:E", strings(&[&["01/04/2024", "Salary", "", "52000", "52000"]]))
            .await
            .unwrap();
        let state = sheet.get_state();
        assert_eq!(state.tabs[SEED_TAB].len(), 16);
        assert_eq!(state.tabs[SEED_TAB][15][0], "01/04/2024");
        // The summary cells beside the header rows are untouched.
        assert_eq!(state.tabs[SEED_TAB][0][6], "160000");
    }

    #[tokio::test]
    async fn test_simulated_failures() {
        let mut sheet = sheet();
        let mut state = sheet.get_state();
        state.fail_reads = true;
        state.fail_writes = true;
        sheet.set_state(state);
        assert!(sheet.get("Sheet1!A4:E").await.is_err());
        assert!(sheet.append("Sheet1!A4:E", Vec::new()).await.is_err());
    }

    #[test]
    fn test_rows_from() {
        let state = TestSheetState::seeded().unwrap();
        let rows = state.rows_from(SEED_TAB, 3);
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[11], vec!["25/03/2024", "Freelance project", "", "8000", "8000"]);
    }
}
