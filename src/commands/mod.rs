//! Command handlers for the ledger CLI.
//!
//! Each command returns an `Out<T>`, so the same handler serves both the command line and the MCP
//! server.

mod add;
mod auth;
mod chat;
mod init;
mod list;
mod mcp;
mod summary;

use crate::api::{Ledger, Mode};
use crate::error::{ErrorType, IntoResult};
use crate::model::date::{self, INVALID_DATE_MESSAGE};
use crate::model::{LedgerDate, TransactionRow};
use crate::{Config, Result};
use anyhow::anyhow;
use serde::Serialize;
use std::fmt::Debug;
use std::str::FromStr;
use tracing::{debug, info, warn};

pub use add::add_entry;
pub use auth::{auth, auth_verify};
pub use chat::{chat, ChatOutcome};
pub use init::init;
pub use list::{list, month, months, MonthView};
pub use mcp::mcp;
pub use summary::{summary, Summary};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to both the command line and MCP server interfaces.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Opens the ledger for `mode`. Failing to open the Google sheet is an authentication problem in
/// practice, so it is tagged as one.
pub(crate) async fn open_ledger(config: &Config, mode: Mode) -> Result<Box<dyn Ledger + Send>> {
    crate::api::ledger(config, mode)
        .await
        .pub_result(ErrorType::Auth)
}

/// Parses a date given by the caller, rejecting anything that is not shaped `dd/mm/yyyy`.
pub(crate) fn parse_date_arg(text: &str) -> Result<LedgerDate> {
    let text = text.trim();
    if !date::validate(text) {
        return Err(anyhow!(INVALID_DATE_MESSAGE)).pub_result(ErrorType::Validation);
    }
    LedgerDate::from_str(text).pub_result(ErrorType::Validation)
}

/// Reads every ledger row. A failed read is logged and treated as an empty ledger.
pub(crate) async fn read_rows(ledger: &mut (dyn Ledger + Send)) -> Vec<TransactionRow> {
    match ledger.read_all().await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Unable to read the ledger, continuing with no rows: {e:#}");
            Vec::new()
        }
    }
}

/// Formats rows one per line as `date | remarks | debit | credit | total`.
pub(crate) fn format_rows(rows: &[TransactionRow]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{} | {} | {} | {} | {}",
                row.date(),
                row.remarks(),
                row.debit(),
                row.credit(),
                row.total()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
