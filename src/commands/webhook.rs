//! Webhook management commands: `webhook set`, `webhook delete` and `webhook info`.

use crate::args::{Common, SetWebhookArgs};
use crate::commands::Out;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, WebhookInfo};
use tracing::debug;

/// The parts of Telegram's webhook information worth showing.
#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct WebhookStatus {
    pub url: Option<String>,
    pub pending_update_count: u32,
    pub last_error_message: Option<String>,
}

impl From<WebhookInfo> for WebhookStatus {
    fn from(info: WebhookInfo) -> Self {
        Self {
            url: info.url.map(|url| url.to_string()),
            pending_update_count: info.pending_update_count,
            last_error_message: info.last_error_message,
        }
    }
}

/// Handles `webhook set`: removes any existing webhook, then registers `args.url()`. Pending
/// updates are dropped both times.
pub async fn set_webhook(common: &Common, args: &SetWebhookArgs) -> Result<Out<WebhookStatus>> {
    let bot = Bot::new(common.telegram_bot_token());
    bot.delete_webhook()
        .drop_pending_updates(true)
        .await
        .context("Failed to delete the existing webhook")?;
    debug!("Deleted existing webhook");

    let mut request = bot
        .set_webhook(args.url().clone())
        .allowed_updates(vec![AllowedUpdate::Message])
        .drop_pending_updates(true);
    if let Some(token) = args.secret_token() {
        request = request.secret_token(token.to_string());
    }
    request.await.context("Failed to set the webhook")?;

    let status = status(&bot).await?;
    Ok(Out::new(
        format!("Webhook successfully set to {}", args.url()),
        status,
    ))
}

/// Handles `webhook delete`.
pub async fn delete_webhook(common: &Common) -> Result<Out<()>> {
    let bot = Bot::new(common.telegram_bot_token());
    bot.delete_webhook()
        .drop_pending_updates(true)
        .await
        .context("Failed to delete the webhook")?;
    Ok(Out::new_message("Webhook successfully deleted"))
}

/// Handles `webhook info`.
pub async fn webhook_info(common: &Common) -> Result<Out<WebhookStatus>> {
    let bot = Bot::new(common.telegram_bot_token());
    let status = status(&bot).await?;
    let message = match &status.url {
        Some(url) if !url.is_empty() => format!(
            "Webhook is set to {url} with {} pending updates",
            status.pending_update_count
        ),
        _ => "No webhook is set, the bot uses long polling".to_string(),
    };
    Ok(Out::new(message, status))
}

async fn status(bot: &Bot) -> Result<WebhookStatus> {
    let info = bot
        .get_webhook_info()
        .await
        .context("Failed to get the webhook info")?;
    Ok(info.into())
}
