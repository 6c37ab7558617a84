//! These structs provide the CLI interface for the ledger CLI. The argument structs of the
//! commands that are also MCP tools derive `JsonSchema` so they can be used as tool parameters.

use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// ledger: browse, summarize and add to a personal ledger kept in a Google sheet.
///
/// The ledger lives in a Google sheet with the columns Date (dd/mm/yyyy), Remarks, Debit, Credit
/// and Total. Rows can be listed, searched and filtered by date, summarized by month, and added
/// either with structured arguments or with a free-text chat message such as
/// "add a new transaction of 500 for groceries on 5/3/2024". Chat messages that are not about
/// adding a transaction are answered by a chat completion service that is given a summary of the
/// ledger.
///
/// There is also a mode in which an AI agent can use this program through the mcp subcommand.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need two things beforehand:
    ///
    /// - The URL of the Google sheet that holds your ledger, passed as --sheet-url.
    ///
    /// - OAuth 2.0 desktop client credentials downloaded from the Google Cloud Console, passed as
    ///   --client-secret. The credentials must list http://localhost as a redirect URI.
    ///
    /// By default the data directory is $HOME/ledger; pass --ledger-home to use another one.
    Init(InitArgs),
    /// Authenticate with Google Sheets via OAuth.
    Auth(AuthArgs),
    /// List ledger rows, most recent first, optionally searched and filtered by date.
    List(ListArgs),
    /// List the months that have ledger rows, as MM/YYYY.
    Months,
    /// List the rows of one month, in sheet order.
    Month(MonthArgs),
    /// Show the last three months of credits and debits, the trend and the ledger totals.
    Summary,
    /// Add a row to the ledger.
    Add(AddArgs),
    /// Send a chat message. Messages asking to add a transaction are parsed and added; anything
    /// else is answered by the chat completion service.
    Chat(ChatArgs),
    /// Run an MCP server over stdio so that an AI agent can use the ledger.
    Mcp,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the ledger configuration and credentials are held. Defaults to
    /// ~/ledger
    #[arg(long, env = "LEDGER_HOME", default_value_t = default_ledger_home())]
    ledger_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, ledger_home: PathBuf) -> Self {
        Self {
            log_level,
            ledger_home: ledger_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn ledger_home(&self) -> &DisplayPath {
        &self.ledger_home
    }
}

/// Args for the `ledger init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of your Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The path to your downloaded OAuth client credentials. This file will be copied to the
    /// secrets directory inside the ledger home.
    #[arg(long)]
    client_secret: PathBuf,
}

impl InitArgs {
    pub fn new(sheet_url: impl Into<String>, client_secret: impl Into<PathBuf>) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn client_secret(&self) -> &Path {
        &self.client_secret
    }
}

/// Args for the `ledger auth` command.
#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    /// Verify and refresh the existing authentication instead of running the consent flow.
    #[arg(long)]
    verify: bool,
}

impl AuthArgs {
    pub fn new(verify: bool) -> Self {
        Self { verify }
    }

    pub fn verify(&self) -> bool {
        self.verify
    }
}

/// Args for listing ledger rows.
#[derive(Debug, Default, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListArgs {
    /// Text to search for. Matches remarks case-insensitively, and the date, debit and credit
    /// cells as written.
    #[arg(long)]
    #[serde(default)]
    pub query: Option<String>,

    /// Only list rows on or after this date (dd/mm/yyyy). Ignored unless `to` is also given.
    #[arg(long)]
    #[serde(default)]
    pub from: Option<String>,

    /// Only list rows on or before this date (dd/mm/yyyy). Ignored unless `from` is also given.
    #[arg(long)]
    #[serde(default)]
    pub to: Option<String>,
}

/// Args for listing the rows of one month.
#[derive(Debug, Default, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MonthArgs {
    /// The month as MM/YYYY, e.g. 03/2024. Defaults to the first month found in the ledger.
    #[serde(default)]
    pub month: Option<String>,
}

/// Args for adding a ledger row. At least one of `debit` or `credit` should be given; the total
/// is computed as credit minus debit.
#[derive(Debug, Default, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddArgs {
    /// The date of the transaction as dd/mm/yyyy.
    #[arg(long)]
    pub date: String,

    /// What the transaction was for.
    #[arg(long)]
    pub remarks: String,

    /// Money leaving the account.
    #[arg(long)]
    #[serde(default)]
    pub debit: Option<String>,

    /// Money entering the account.
    #[arg(long)]
    #[serde(default)]
    pub credit: Option<String>,
}

/// Args for sending a chat message.
#[derive(Debug, Default, Parser, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatArgs {
    /// The message, e.g. "add a new transaction of 500 for groceries on 05/03/2024" or "what was
    /// my biggest expense?"
    pub message: String,
}

fn default_ledger_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledger"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --ledger-home or LEDGER_HOME instead of relying on the default \
                ledger home directory.",
            );
            PathBuf::from("ledger")
        }
    })
}

/// A `PathBuf` that can be used as a clap default value.
#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
