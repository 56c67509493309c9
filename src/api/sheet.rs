//! Implements the `Sheet` trait using the `sheets::Client` to interact with a Google sheet.

use crate::api::{a1_range, column_letters, CellValue, Sheet, TokenProvider, Worksheet};
use crate::Result;
use anyhow::{bail, Context};
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use sheets::types::{DateTimeRenderOption, Dimension, ValueRenderOption};
use sheets::ClientError;
use tracing::trace;
use url::Url;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Implements the `Sheet` trait against the Google Sheets API. It takes a `TokenProvider`, from
/// which it gets a fresh access token before each call.
///
/// Values are read with the `sheets` client. The worksheet listing and the cell writes go through
/// the REST endpoints with `reqwest` because the `sheets` client only carries values as strings, and
/// the amount has to be written as a JSON number.
pub struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    http: reqwest::Client,
}

impl GoogleSheet {
    pub(crate) fn new(spreadsheet_id: impl Into<String>, token_provider: TokenProvider) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            token_provider,
            http: reqwest::Client::new(),
        }
    }

    /// Creates a sheets client with a refreshed access token.
    async fn client(&self) -> Result<sheets::Client> {
        let access_token = self.token_provider.token().await?;

        // The sheets crate requires client_id, client_secret and redirect_uri, but API calls only
        // need the access token.
        Ok(sheets::Client::new(
            String::new(),
            String::new(),
            String::new(),
            access_token,
            String::new(),
        ))
    }

    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API).context("Invalid Sheets API URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Sheets API URL cannot be a base"))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(range);
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        Ok(url)
    }
}

/// The parts of the `spreadsheets.get` response that we ask for with the `fields` parameter.
#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    title: String,
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn worksheets(&mut self) -> Result<Vec<Worksheet>> {
        trace!("worksheets for {}", self.spreadsheet_id);
        let access_token = self.token_provider.token().await?;
        let url = format!("{SHEETS_API}/{}", self.spreadsheet_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("fields", "sheets.properties(sheetId,title)")])
            .send()
            .await
            .context("Failed to send spreadsheet request to Google Sheets API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Google Sheets API get spreadsheet failed with status {status}: {body}");
        }

        let metadata: SpreadsheetMetadata = response
            .json()
            .await
            .context("Failed to parse Google Sheets API response")?;

        Ok(metadata
            .sheets
            .into_iter()
            .map(|entry| Worksheet::new(entry.properties.sheet_id, entry.properties.title))
            .collect())
    }

    async fn column_values(&mut self, worksheet: &Worksheet, column: usize) -> Result<Vec<String>> {
        let letters = column_letters(column);
        let range = a1_range(worksheet, &format!("{letters}:{letters}"));
        trace!("column_values for {range}");
        let response = self
            .client()
            .await?
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                &range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch column {letters} of {}", worksheet.title()))?;

        // Each row comes back as a list of cells, empty rows as an empty list.
        Ok(response
            .body
            .values
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect())
    }

    async fn set_cell(
        &mut self,
        worksheet: &Worksheet,
        row: usize,
        column: usize,
        value: CellValue,
    ) -> Result<()> {
        let range = a1_range(worksheet, &format!("{}{row}", column_letters(column)));
        trace!("set_cell {range} = {value}");
        let cell = match &value {
            CellValue::Text(s) => serde_json::Value::from(s.as_str()),
            CellValue::Number(n) => n
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .with_context(|| format!("Amount {n} cannot be written as a number"))?,
        };

        let access_token = self.token_provider.token().await?;
        let response = self
            .http
            .put(self.values_url(&range)?)
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [[cell]],
            }))
            .send()
            .await
            .with_context(|| format!("Failed to send update request for {range}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Google Sheets API update of {range} failed with status {status}: {body}");
        }
        Ok(())
    }
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}
