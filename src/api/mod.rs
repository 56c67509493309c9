//! Access to the spreadsheet that holds the ledger.
//!
//! The rest of the crate only sees the `Sheet` trait. `GoogleSheet` implements it against the Google
//! Sheets API and `TestSheet` implements it in memory.

mod oauth;
mod sheet;
mod sheet_test_client;

use crate::error::LedgerError;
use crate::{Config, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tracing::debug;

pub(crate) use oauth::TokenProvider;
pub use sheet::GoogleSheet;
pub use sheet_test_client::{CellWrite, TestSheet};

// OAuth scopes required for spreadsheet read/write and for listing files.
const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

/// When this environment variable is set and non-empty, the in-memory sheet is used instead of the
/// Google API.
const TEST_MODE_ENV: &str = "ACCOUNTANT_BOT_IN_TEST_MODE";

/// Which `Sheet` implementation to use.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Google,
    Test,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// An opaque handle to one tab of the spreadsheet.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Worksheet {
    id: i64,
    title: String,
}

impl Worksheet {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// A value to be written into a single cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Number(Decimal),
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// The spreadsheet operations needed by the ledger. Rows and columns are 1-indexed, as they are in
/// the spreadsheet UI.
#[async_trait::async_trait]
pub trait Sheet {
    /// Lists the worksheets (tabs) in the order they appear in the spreadsheet.
    async fn worksheets(&mut self) -> Result<Vec<Worksheet>>;

    /// Reads every value in `column`, top to bottom. Trailing empty cells may be omitted.
    async fn column_values(&mut self, worksheet: &Worksheet, column: usize) -> Result<Vec<String>>;

    /// Overwrites a single cell.
    async fn set_cell(
        &mut self,
        worksheet: &Worksheet,
        row: usize,
        column: usize,
        value: CellValue,
    ) -> Result<()>;
}

/// Opens the spreadsheet named in `config` using the implementation selected by `mode`.
///
/// For `Mode::Google` this authenticates with the service account credentials, so the credential
/// errors surface here, before any message is handled.
pub async fn sheet(config: &Config, mode: Mode) -> std::result::Result<Box<dyn Sheet + Send>, LedgerError> {
    debug!("Opening spreadsheet {} in {mode} mode", config.spreadsheet_id());
    match mode {
        Mode::Google => {
            let token_provider = TokenProvider::from_json(config.google_credentials_json()).await?;
            let sheet = GoogleSheet::new(config.spreadsheet_id(), token_provider);
            Ok(Box::new(sheet))
        }
        Mode::Test => Ok(Box::new(TestSheet::seeded()?)),
    }
}

/// Converts a 1-indexed column number to its A1 letters, e.g. 1 -> `A`, 28 -> `AB`.
pub(crate) fn column_letters(column: usize) -> String {
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Builds an A1 range for `worksheet`, quoting the title so that spaces and apostrophes survive.
pub(crate) fn a1_range(worksheet: &Worksheet, cells: &str) -> String {
    format!("'{}'!{cells}", worksheet.title().replace('\'', "''"))
}
