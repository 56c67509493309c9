//! The Telegram side of the bot: the dispatcher, its handler tree and where updates come from.

mod handlers;

use crate::args::RunArgs;
use crate::ledger::LedgerWriter;
use crate::Result;
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

pub use handlers::{failure_reply, process_expense, start_reply, success_reply, PARSE_FAILURE_REPLY};

/// The ledger shared by all handlers. The lock also keeps two messages from this process from
/// racing for the same row.
pub type SharedLedger = Arc<Mutex<LedgerWriter>>;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum BotCommand {
    #[command(description = "start using the bot.")]
    Start,
    #[command(description = "show this message.")]
    Help,
}

/// How the bot receives updates from Telegram.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum UpdateSource {
    Polling,
    Webhook {
        url: Url,
        listen_addr: SocketAddr,
        secret_token: Option<String>,
    },
}

impl UpdateSource {
    pub fn from_args(args: &RunArgs) -> Self {
        match args.webhook_url() {
            None => UpdateSource::Polling,
            Some(url) => UpdateSource::Webhook {
                url: url.clone(),
                listen_addr: args.listen_addr(),
                secret_token: args.secret_token().map(str::to_string),
            },
        }
    }
}

/// Creates the handler tree: commands first, then any other text message is treated as an
/// expense.
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<BotCommand>()
                .endpoint(handlers::handle_command),
        )
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handlers::handle_expense))
}

/// Runs the dispatcher until it is stopped with Ctrl-C.
pub async fn run(bot: Bot, ledger: SharedLedger, source: UpdateSource) -> Result<()> {
    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![ledger])
        .default_handler(|upd| async move {
            debug!("Unhandled update {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build();

    match source {
        UpdateSource::Polling => {
            info!("Starting bot in long polling mode");
            dispatcher.dispatch().await;
        }
        UpdateSource::Webhook {
            url,
            listen_addr,
            secret_token,
        } => {
            info!("Starting bot in webhook mode at {url}, listening on {listen_addr}");
            let mut options = webhooks::Options::new(listen_addr, url);
            if let Some(token) = secret_token {
                options = options.secret_token(token);
            }
            let listener = webhooks::axum(bot, options)
                .await
                .context("Failed to start the webhook listener")?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
    }
    info!("Dispatcher shut down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            BotCommand::parse("/start", "accountant_bot").unwrap(),
            BotCommand::Start
        );
        assert_eq!(
            BotCommand::parse("/help", "accountant_bot").unwrap(),
            BotCommand::Help
        );
        assert!(BotCommand::parse("Lunch 2.95", "accountant_bot").is_err());
    }

    #[test]
    fn test_descriptions_mention_commands() {
        let descriptions = BotCommand::descriptions().to_string();
        assert!(descriptions.contains("/start"));
        assert!(descriptions.contains("/help"));
    }
}
