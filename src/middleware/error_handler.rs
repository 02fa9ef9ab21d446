//! Error trapping for handlers.
//!
//! Every handler runs inside [`handle_errors`]. Errors stop at this boundary:
//! they are logged and the chat gets a generic message.

use std::future::Future;

use teloxide::prelude::*;
use tracing::{error, warn};

use crate::bot::dispatcher::ThrottledBot;

/// Reply sent to the chat when a handler fails. Internals are never exposed.
pub const GENERIC_ERROR: &str = "⚠️ An error occurred while processing your request. Please try again later.";

/// Await a handler and trap its error.
pub async fn handle_errors<F>(bot: &ThrottledBot, chat_id: Option<ChatId>, handler: &str, fut: F)
where
    F: Future<Output = anyhow::Result<()>>,
{
    if let Err(e) = fut.await {
        error!("Error in {}: {:#}", handler, e);

        if let Some(chat_id) = chat_id
            && let Err(send_err) = bot.send_message(chat_id, GENERIC_ERROR).await
        {
            warn!("Failed to report error to chat {}: {}", chat_id, send_err);
        }
    }
}
