//! Implements the `Ledger` trait, which reads and appends ledger rows through a `Sheet`.

use crate::api::{Ledger, Sheet};
use crate::model::TransactionRow;
use crate::{Config, Result};
use anyhow::Context;
use tracing::debug;

/// Reads and writes ledger rows through a dynamically-dispatched `sheet`.
pub(super) struct LedgerImpl {
    sheet: Box<dyn Sheet + Send>,
    first_data_row: u32,
    data_range: String,
    totals_range: String,
}

impl LedgerImpl {
    pub(super) fn new(sheet: Box<dyn Sheet + Send>, config: &Config) -> Self {
        Self {
            sheet,
            first_data_row: config.first_data_row(),
            data_range: config.data_range(),
            totals_range: config.totals_range(),
        }
    }
}

#[async_trait::async_trait]
impl Ledger for LedgerImpl {
    async fn read_all(&mut self) -> Result<Vec<TransactionRow>> {
        let values = self.sheet.get(&self.data_range).await?;
        values
            .into_iter()
            .enumerate()
            .map(|(ix, cells)| {
                TransactionRow::from_cells(cells).with_context(|| {
                    format!("Bad ledger row {}", ix + self.first_data_row as usize)
                })
            })
            .collect()
    }

    async fn append(&mut self, row: &TransactionRow) -> Result<()> {
        debug!("Appending ledger row after {}", self.data_range);
        self.sheet
            .append(&self.data_range, vec![row.to_cells()])
            .await
    }

    async fn read_totals(&mut self) -> Result<Vec<Vec<String>>> {
        self.sheet.get(&self.totals_range).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TestSheet, TestSheetState, SEED_TAB};
    use crate::model::LedgerDate;
    use crate::test::TestEnv;
    use std::str::FromStr;

    async fn ledger(env: &TestEnv) -> LedgerImpl {
        let config = env.config();
        LedgerImpl::new(Box::new(TestSheet::new(config.spreadsheet_id())), &config)
    }

    /// Hands control back to the runtime before every call, so that two ledgers sharing a sheet
    /// interleave their requests.
    struct YieldingSheet(TestSheet);

    #[async_trait::async_trait]
    impl Sheet for YieldingSheet {
        async fn get(&mut self, range: &str) -> Result<Vec<Vec<String>>> {
            tokio::task::yield_now().await;
            self.0.get(range).await
        }

        async fn append(&mut self, range: &str, rows: Vec<Vec<String>>) -> Result<()> {
            tokio::task::yield_now().await;
            self.0.append(range, rows).await
        }
    }

    #[tokio::test]
    async fn test_read_all_seeded() {
        let env = TestEnv::new().await;
        let rows = ledger(&env).await.read_all().await.unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[2].remarks(), "Groceries");
        assert_eq!(rows[2].debit(), "3200");
        assert_eq!(rows[2].credit(), "");
        assert_eq!(rows[2].total(), "-3200");
    }

    #[tokio::test]
    async fn test_append_then_read_reproduces_cells() {
        let env = TestEnv::new().await;
        let mut ledger = ledger(&env).await;
        let date = LedgerDate::from_str("05/04/2024").unwrap();
        let row = TransactionRow::new(&date, "Books", "750.50", "");
        ledger.append(&row).await.unwrap();

        let rows = ledger.read_all().await.unwrap();
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[12], row);
        assert_eq!(rows[12].total(), "-750.5");

        // Row 4 is the first data row, so the 13th row lands on sheet row 16.
        let state = env.get_state();
        assert_eq!(state.tabs[SEED_TAB][15][1], "Books");
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_both_rows() {
        let env = TestEnv::new().await;
        let config = env.config();
        let shared = |config: &Config| {
            let sheet = YieldingSheet(TestSheet::new(config.spreadsheet_id()));
            LedgerImpl::new(Box::new(sheet), config)
        };
        let mut a = shared(&config);
        let mut b = shared(&config);
        let date = LedgerDate::from_str("06/04/2024").unwrap();
        let first = TransactionRow::new(&date, "first", "10", "");
        let second = TransactionRow::new(&date, "second", "", "20");

        let (ra, rb) = tokio::join!(a.append(&first), b.append(&second));
        ra.unwrap();
        rb.unwrap();

        let rows = a.read_all().await.unwrap();
        assert_eq!(rows.len(), 14);
        let remarks: Vec<&str> = rows[12..].iter().map(|r| r.remarks()).collect();
        assert!(remarks.contains(&"first"));
        assert!(remarks.contains(&"second"));
    }

    #[tokio::test]
    async fn test_append_to_empty_ledger() {
        let env = TestEnv::new().await;
        env.set_state(TestSheetState::with_tab(SEED_TAB, Vec::new()));
        let mut ledger = ledger(&env).await;
        let date = LedgerDate::from_str("01/01/2025").unwrap();
        ledger
            .append(&TransactionRow::new(&date, "Bonus", "", "1000"))
            .await
            .unwrap();
        let rows = ledger.read_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total(), "1000");
        assert_eq!(env.get_state().tabs[SEED_TAB].len(), 4);
    }

    #[tokio::test]
    async fn test_read_totals() {
        let env = TestEnv::new().await;
        let totals = ledger(&env).await.read_totals().await.unwrap();
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[2], vec!["Balance", "98950"]);
    }

    #[tokio::test]
    async fn test_write_failure_surfaces() {
        let env = TestEnv::new().await;
        let mut state = env.get_state();
        state.fail_writes = true;
        env.set_state(state);
        let date = LedgerDate::from_str("01/01/2025").unwrap();
        let result = ledger(&env)
            .await
            .append(&TransactionRow::new(&date, "x", "1", ""))
            .await;
        assert!(result.is_err());
    }
}
