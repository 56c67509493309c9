//! Runtime configuration of the bot.
//!
//! Every value comes from the command line or, more commonly, from the environment (see `args`).
//! `Config` checks that the required values are present and gives the rest of the crate typed
//! access to them.

use crate::args::{Common, RunArgs};
use crate::ledger::LedgerLayout;
use crate::Result;
use anyhow::ensure;
use std::fmt::{Debug, Formatter};

/// The configuration needed to run the bot.
#[derive(Clone)]
pub struct Config {
    telegram_bot_token: String,
    google_credentials_json: String,
    spreadsheet_id: String,
    layout: LedgerLayout,
}

impl Config {
    /// Creates a `Config` and validates it.
    ///
    /// # Errors
    /// - Returns an error if the token, the credentials or the spreadsheet ID is blank.
    /// - Returns an error if the sentinel text is blank.
    pub fn new(
        telegram_bot_token: impl Into<String>,
        google_credentials_json: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        layout: LedgerLayout,
    ) -> Result<Self> {
        let config = Self {
            telegram_bot_token: telegram_bot_token.into(),
            google_credentials_json: google_credentials_json.into(),
            spreadsheet_id: spreadsheet_id.into(),
            layout,
        };
        ensure!(
            !config.telegram_bot_token.trim().is_empty(),
            "TELEGRAM_BOT_TOKEN is required"
        );
        ensure!(
            !config.google_credentials_json.trim().is_empty(),
            "GOOGLE_CREDENTIALS_JSON is required"
        );
        ensure!(
            !config.spreadsheet_id.trim().is_empty(),
            "GOOGLE_SPREADSHEET_ID is required"
        );
        ensure!(
            !config.layout.sentinel.trim().is_empty(),
            "The sentinel text must not be blank"
        );
        Ok(config)
    }

    /// Builds the configuration for the `run` command.
    pub fn from_args(common: &Common, run: &RunArgs) -> Result<Self> {
        Self::new(
            common.telegram_bot_token(),
            run.google_credentials_json(),
            run.google_spreadsheet_id(),
            LedgerLayout::new(run.sentinel(), run.rows_to_first_entry()),
        )
    }

    pub fn telegram_bot_token(&self) -> &str {
        &self.telegram_bot_token
    }

    pub fn google_credentials_json(&self) -> &str {
        &self.google_credentials_json
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn layout(&self) -> &LedgerLayout {
        &self.layout
    }
}

// Secrets stay out of the logs.
impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &"<redacted>")
            .field("google_credentials_json", &"<redacted>")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("layout", &self.layout)
            .finish()
    }
}
