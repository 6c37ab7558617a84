//! The `Sheet` trait backed by the Google Sheets API.

use crate::api::{Sheet, TokenProvider};
use crate::Result;
use anyhow::Context;
use sheets::types::{
    DateTimeRenderOption, Dimension, InsertDataOption, ValueInputOption, ValueRange,
    ValueRenderOption,
};
use sheets::ClientError;
use tracing::{debug, trace};

/// A Google spreadsheet. The access token is checked before every request and the client is
/// rebuilt whenever the token changes.
pub(super) struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    access_token: String,
    client: sheets::Client,
}

impl GoogleSheet {
    pub(super) async fn new(
        spreadsheet_id: impl Into<String>,
        mut token_provider: TokenProvider,
    ) -> Result<Self> {
        let access_token = token_provider.token_with_refresh().await?.to_string();
        Ok(Self {
            spreadsheet_id: spreadsheet_id.into(),
            client: client_for(&access_token),
            access_token,
            token_provider,
        })
    }

    async fn spreadsheets(&mut self) -> Result<sheets::spreadsheets::Spreadsheets> {
        let current = self.token_provider.token_with_refresh().await?;
        if current != self.access_token {
            debug!("Access token changed, rebuilding the Sheets client");
            self.access_token = current.to_string();
            self.client = client_for(&self.access_token);
        }
        Ok(self.client.spreadsheets())
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn get(&mut self, range: &str) -> Result<Vec<Vec<String>>> {
        trace!("values_get {range}");
        let spreadsheet_id = self.spreadsheet_id.clone();
        let response = self
            .spreadsheets()
            .await?
            .values_get(
                &spreadsheet_id,
                range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(client_error)
            .with_context(|| format!("Failed to read {range}"))?;
        Ok(response.body.values)
    }

    async fn append(&mut self, range: &str, rows: Vec<Vec<String>>) -> Result<()> {
        trace!("values_append {} rows to {range}", rows.len());
        let body = ValueRange {
            major_dimension: Some(Dimension::Rows),
            range: range.to_string(),
            values: rows,
        };
        let spreadsheet_id = self.spreadsheet_id.clone();
        let response = self
            .spreadsheets()
            .await?
            .values_append(
                &spreadsheet_id,
                range,
                false,
                // New rows are inserted so that anything below the table is pushed down.
                InsertDataOption::InsertRows,
                DateTimeRenderOption::FormattedString,
                ValueRenderOption::FormattedValue,
                // Entered as if typed, so the sheet parses dates and numbers itself.
                ValueInputOption::UserEntered,
                &body,
            )
            .await
            .map_err(client_error)
            .with_context(|| format!("Failed to append to {range}"))?;
        debug!("Appended after table {}", response.body.table_range);
        Ok(())
    }
}

/// Only the access token is given to the client; refreshing is left to the `TokenProvider`.
fn client_for(access_token: &str) -> sheets::Client {
    sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token.to_string(),
        String::new(),
    )
}

fn client_error(e: ClientError) -> anyhow::Error {
    let summary = match &e {
        ClientError::HttpError { .. } => "The Sheets API rejected the request",
        ClientError::ReqwestError(_) | ClientError::ReqwestMiddleWareError(_) => {
            "Unable to reach the Sheets API"
        }
        ClientError::SerdeJsonError(_) => "Unexpected response from the Sheets API",
        ClientError::EmptyRefreshToken => "The Sheets client has no token",
        _ => "Sheets client error",
    };
    anyhow::Error::new(e).context(summary)
}
