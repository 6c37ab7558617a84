//! Access to the outside world: the Google sheet that holds the ledger, Google OAuth, and the chat
//! completion service. Each is reached through a trait so that commands can run against in-memory
//! implementations when `Mode::Testing` is selected.

mod completion;
mod files;
mod ledger;
mod oauth;
mod range;
mod sheet;
mod sheet_test_client;

use crate::model::TransactionRow;
use crate::{Config, Result};
use anyhow::Context;
use completion::{HttpCompletion, TestCompletion};
use ledger::LedgerImpl;
use sheet::GoogleSheet;
use tracing::debug;

pub use completion::CompletionRequest;
pub(crate) use oauth::TokenProvider;
pub(crate) use sheet_test_client::TestSheet;
#[cfg(test)]
pub(crate) use sheet_test_client::{TestSheetState, SEED_TAB};

/// OAuth scopes required for reading and appending ledger rows.
pub(crate) const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

/// The environment variable that, when set to a non-empty value, selects `Mode::Testing`.
pub const TEST_MODE_ENV: &str = "LEDGER_IN_TEST_MODE";

/// Whether to talk to Google and the completion service, or to use in-memory stand-ins.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Testing,
}

impl Mode {
    /// `Mode::Testing` when `LEDGER_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }
}

/// Cell-level access to a spreadsheet.
#[async_trait::async_trait]
pub(crate) trait Sheet {
    /// Returns the formatted values of an A1 `range`, e.g. `Sheet1!A4:E`. Trailing empty cells and
    /// rows are omitted.
    async fn get(&mut self, range: &str) -> Result<Vec<Vec<String>>>;

    /// Adds `rows` after the last non-empty row of the table in `range`, as if the values were
    /// typed by a user. Finding the row and writing it is a single operation on the sheet.
    async fn append(&mut self, range: &str, rows: Vec<Vec<String>>) -> Result<()>;
}

/// Row-level access to the ledger.
#[async_trait::async_trait]
pub trait Ledger {
    /// Every ledger row in sheet order.
    async fn read_all(&mut self) -> Result<Vec<TransactionRow>>;

    /// Writes `row` directly after the last ledger row.
    async fn append(&mut self, row: &TransactionRow) -> Result<()>;

    /// The precomputed summary cells, verbatim.
    async fn read_totals(&mut self) -> Result<Vec<Vec<String>>>;
}

/// Answers a general question about the ledger.
#[async_trait::async_trait]
pub trait Completion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Creates the `Sheet` for `mode`. In `Mode::Google` the stored OAuth token is loaded and refreshed
/// if needed.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    debug!("Creating a sheet client in {mode:?} mode");
    match mode {
        Mode::Google => {
            let token_provider =
                TokenProvider::load(config.client_secret_path(), config.token_path())
                    .await
                    .context("Unable to load OAuth tokens, run 'ledger auth' first")?;
            let sheet = GoogleSheet::new(config.spreadsheet_id(), token_provider).await?;
            Ok(Box::new(sheet))
        }
        Mode::Testing => Ok(Box::new(TestSheet::new(config.spreadsheet_id()))),
    }
}

/// Creates the `Ledger` for `mode`.
pub async fn ledger(config: &Config, mode: Mode) -> Result<Box<dyn Ledger + Send>> {
    let sheet = sheet(config, mode).await?;
    Ok(Box::new(LedgerImpl::new(sheet, config)))
}

/// Creates the `Completion` client for `mode`.
pub fn completion(config: &Config, mode: Mode) -> Result<Box<dyn Completion + Send + Sync>> {
    match mode {
        Mode::Google => Ok(Box::new(HttpCompletion::new(config.completion())?)),
        Mode::Testing => Ok(Box::new(TestCompletion)),
    }
}
