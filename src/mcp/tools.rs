//! The MCP tools. Each one delegates to the command of the same purpose.

use crate::args::{AddArgs, ChatArgs, ListArgs, MonthArgs};
use crate::commands;
use crate::mcp::mcp_utils::tool_result;
use crate::mcp::LedgerServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_router};
use tracing::info;

#[tool_router(vis = "pub(super)")]
impl LedgerServer {
    #[tool]
    /// Initialize the ledger MCP service for this session and return usage instructions. You
    /// **MUST** call this **ONCE** before using other tools so that you have the full usage
    /// instructions. You **MAY** call it more than once if you have forgotten them.
    async fn initialize_service(&self) -> Result<CallToolResult, McpError> {
        let mut initialized = self.initialized.lock().await;
        *initialized = true;
        Ok(CallToolResult::success(vec![rmcp::model::Content::text(
            include_str!("docs/INSTRUCTIONS.md"),
        )]))
    }

    /// List ledger rows. Returns a text table and a JSON array of rows, each with `date`,
    /// `remarks`, `debit`, `credit` and `total`.
    ///
    /// - `query`: keeps rows whose remarks contain the text (case-insensitive), or whose date,
    ///   debit or credit cell contains it.
    /// - `from` and `to`: inclusive `dd/mm/yyyy` bounds. Both must be given for the range to
    ///   apply. With a range, rows stay in sheet order; without one, rows are most recent first.
    #[tool]
    async fn list_transactions(
        &self,
        Parameters(args): Parameters<ListArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: list_transactions called with {args:?}");
        let config = (*self.config).clone();
        tool_result(commands::list(config, self.mode, args).await)
    }

    /// List the months that have ledger rows, as `MM/YYYY`, in the order they first appear in
    /// the sheet.
    #[tool]
    async fn list_months(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: list_months called");
        let config = (*self.config).clone();
        tool_result(commands::months(config, self.mode).await)
    }

    /// List the rows of one month, in sheet order. `month` is `MM/YYYY`; when omitted, the first
    /// month that appears in the sheet is used.
    #[tool]
    async fn month_transactions(
        &self,
        Parameters(args): Parameters<MonthArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: month_transactions called with {args:?}");
        let config = (*self.config).clone();
        tool_result(commands::month(config, self.mode, args).await)
    }

    /// Summarize the ledger: credits and debits for the current month and the two before it,
    /// the month-over-month trend of the net amount, whole-ledger totals with the highest expense,
    /// and the summary cells kept in the sheet.
    #[tool]
    async fn monthly_summary(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: monthly_summary called");
        let config = (*self.config).clone();
        tool_result(commands::summary(config, self.mode).await)
    }

    /// Add a row to the ledger. `date` must be `dd/mm/yyyy` and `remarks` must not be empty. Give
    /// `debit` for money spent and `credit` for money received; the total is credit minus debit.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "date": "05/03/2024",
    ///   "remarks": "Groceries",
    ///   "debit": "500"
    /// }
    /// ```
    #[tool]
    async fn add_entry(
        &self,
        Parameters(args): Parameters<AddArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: add_entry called with {args:?}");
        let config = (*self.config).clone();
        tool_result(commands::add_entry(config, self.mode, args).await)
    }

    /// Send a chat message. A message that mentions "add", "create" or "new transaction" is
    /// parsed into a ledger row, e.g. "add a new transaction of 500 for groceries on 05/03/2024";
    /// if the date, remarks or amount cannot be found, the reply lists what is missing and nothing is written. Any
    /// other message is answered by the chat completion service using a summary of the ledger.
    #[tool]
    async fn chat(&self, Parameters(args): Parameters<ChatArgs>) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: chat called");
        let config = (*self.config).clone();
        tool_result(commands::chat(config, self.mode, args).await)
    }
}
