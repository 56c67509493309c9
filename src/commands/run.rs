use crate::api::Mode;
use crate::bot::{self, SharedLedger, UpdateSource};
use crate::commands::Out;
use crate::ledger::LedgerWriter;
use crate::{api, Config, Result};
use anyhow::Context;
use std::sync::Arc;
use teloxide::Bot;
use tokio::sync::Mutex;
use tracing::info;

/// Handles the `run` command.
///
/// The spreadsheet client is created once, before the dispatcher starts, so that bad credentials
/// stop the bot right away instead of failing on the first message. It is then shared by every
/// handler for the lifetime of the process.
///
/// # Errors
/// - Returns an error if the credentials cannot be parsed or the client cannot be created.
/// - Returns an error if the webhook listener cannot be started.
pub async fn run(config: Config, mode: Mode, source: UpdateSource) -> Result<Out<()>> {
    let sheet = api::sheet(&config, mode)
        .await
        .context("Unable to open the spreadsheet")?;
    let ledger: SharedLedger = Arc::new(Mutex::new(LedgerWriter::new(
        sheet,
        config.layout().clone(),
    )));
    info!(
        "Ledger ready for spreadsheet {} (sentinel '{}')",
        config.spreadsheet_id(),
        config.layout().sentinel
    );

    let telegram = Bot::new(config.telegram_bot_token());
    bot::run(telegram, ledger, source).await?;
    Ok(Out::new_message("The bot has stopped"))
}
