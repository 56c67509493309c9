//! These structs provide the CLI interface for the accountant-bot binary.

use crate::ledger::{DEFAULT_ROWS_TO_FIRST_ENTRY, DEFAULT_SENTINEL};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing_subscriber::filter::LevelFilter;
use url::Url;

/// accountant-bot: a Telegram bot that records your expenses in a Google sheet.
///
/// Send the bot a message like `Lunch 2.95` and it writes the description and the amount into the
/// first free row below the `Total Net income` row of the leftmost tab of your spreadsheet.
///
/// The bot authenticates as a Google service account. Share the spreadsheet with the service
/// account's email address and pass its JSON key in GOOGLE_CREDENTIALS_JSON.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the bot.
    ///
    /// By default updates are fetched with long polling. When --webhook-url is given, the webhook
    /// is registered with Telegram and updates are received on --listen-addr instead.
    Run(RunArgs),
    /// Manage the Telegram webhook.
    Webhook(WebhookArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, env = "LOGGING_LEVEL", default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The bot token given to you by @BotFather.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_bot_token: String,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn telegram_bot_token(&self) -> &str {
        &self.telegram_bot_token
    }
}

/// Args for the `run` command.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// The JSON key of the Google service account.
    #[arg(long, env = "GOOGLE_CREDENTIALS_JSON", hide_env_values = true)]
    google_credentials_json: String,

    /// The ID of the spreadsheet, the part after /d/ in its URL.
    #[arg(long, env = "GOOGLE_SPREADSHEET_ID")]
    google_spreadsheet_id: String,

    /// The public HTTPS URL Telegram should deliver updates to. Long polling is used if absent.
    #[arg(long, env = "TELEGRAM_WEBHOOK_URL")]
    webhook_url: Option<Url>,

    /// The local address the webhook listener binds to.
    #[arg(long, env = "TELEGRAM_LISTEN_ADDR", default_value = "0.0.0.0:8443")]
    listen_addr: SocketAddr,

    /// The secret token Telegram sends with each webhook request.
    #[arg(long, env = "TELEGRAM_SECRET_TOKEN", hide_env_values = true)]
    secret_token: Option<String>,

    /// The text of the row that the expense block follows.
    #[arg(long, env = "ACCOUNTANT_SENTINEL", default_value = DEFAULT_SENTINEL)]
    sentinel: String,

    /// How many rows below the sentinel row the first expense row is.
    #[arg(long, env = "ACCOUNTANT_ROWS_TO_FIRST_ENTRY", default_value_t = DEFAULT_ROWS_TO_FIRST_ENTRY)]
    rows_to_first_entry: usize,
}

impl RunArgs {
    pub fn google_credentials_json(&self) -> &str {
        &self.google_credentials_json
    }

    pub fn google_spreadsheet_id(&self) -> &str {
        &self.google_spreadsheet_id
    }

    pub fn webhook_url(&self) -> Option<&Url> {
        self.webhook_url.as_ref()
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn secret_token(&self) -> Option<&str> {
        self.secret_token.as_deref()
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn rows_to_first_entry(&self) -> usize {
        self.rows_to_first_entry
    }
}

/// Args for the `webhook` command.
#[derive(Debug, Parser, Clone)]
pub struct WebhookArgs {
    #[command(subcommand)]
    action: WebhookAction,
}

impl WebhookArgs {
    pub fn action(&self) -> &WebhookAction {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum WebhookAction {
    /// Register a webhook URL with Telegram, dropping pending updates.
    Set(SetWebhookArgs),
    /// Remove the webhook, dropping pending updates.
    Delete,
    /// Show the current webhook information.
    Info,
}

/// Args for the `webhook set` command.
#[derive(Debug, Parser, Clone)]
pub struct SetWebhookArgs {
    /// The public HTTPS URL of the webhook.
    #[arg(long)]
    url: Url,

    /// The secret token Telegram should send with each webhook request.
    #[arg(long, env = "TELEGRAM_SECRET_TOKEN", hide_env_values = true)]
    secret_token: Option<String>,
}

impl SetWebhookArgs {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn secret_token(&self) -> Option<&str> {
        self.secret_token.as_deref()
    }
}
