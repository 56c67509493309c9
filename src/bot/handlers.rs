//! Handler endpoints and the replies they send.

use super::{BotCommand, SharedLedger};
use crate::error::LedgerError;
use crate::expense::{self, format_amount, Expense};
use crate::ledger::LedgerWriter;
use rust_decimal::Decimal;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub const PARSE_FAILURE_REPLY: &str =
    "Could not parse expense. Please use format:\n\nExample: `Lunch 2.95`";

pub(super) async fn handle_command(bot: Bot, msg: Message, cmd: BotCommand) -> ResponseResult<()> {
    match cmd {
        BotCommand::Start => {
            let first_name = msg.from.as_ref().map(|user| user.first_name.as_str());
            if let Some(user) = msg.from.as_ref() {
                info!(
                    "User {} ({}) started the bot",
                    user.id,
                    user.username.as_deref().unwrap_or("-")
                );
            }
            bot.send_message(msg.chat.id, start_reply(first_name)).await?;
        }
        BotCommand::Help => {
            bot.send_message(msg.chat.id, BotCommand::descriptions().to_string())
                .await?;
        }
    }
    Ok(())
}

pub(super) async fn handle_expense(
    bot: Bot,
    ledger: SharedLedger,
    msg: Message,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    info!("Received message: {text}");

    let reply = match expense::parse(text) {
        Some(expense) => process_expense(&ledger, &expense).await,
        None => {
            debug!("'{text}' is not an expense");
            PARSE_FAILURE_REPLY.to_string()
        }
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Records `expense` and returns the reply for the user. The monthly total is best effort: if it
/// cannot be read, the reply just leaves it out.
pub async fn process_expense(ledger: &Mutex<LedgerWriter>, expense: &Expense) -> String {
    let mut ledger = ledger.lock().await;
    if let Err(e) = ledger.record(expense).await {
        error!("Failed to add expense '{expense}': {e:?}");
        return failure_reply(&e);
    }

    let total = match ledger.monthly_total().await {
        Ok(total) => Some(total),
        Err(e) => {
            warn!("Failed to get monthly total: {e:?}");
            None
        }
    };
    success_reply(expense, total)
}

pub fn start_reply(first_name: Option<&str>) -> String {
    let greeting = match first_name {
        Some(name) if !name.is_empty() => format!("Hi {name}! 👋"),
        _ => "Hi! 👋".to_string(),
    };
    format!(
        "{greeting}\n\n\
        I'm your personal accountant bot. Send me expenses in this format:\n\n\
        Example: `Lunch 2.95`"
    )
}

pub fn success_reply(expense: &Expense, monthly_total: Option<Decimal>) -> String {
    let mut reply = format!(
        "💸 Spent {}€ on {}.",
        format_amount(expense.amount()),
        expense.description()
    );
    if let Some(total) = monthly_total {
        reply.push_str(&format!(" New monthly total is {}€", format_amount(total)));
    }
    reply
}

pub fn failure_reply(error: &LedgerError) -> String {
    format!("Failed to add expense: {error}")
}
