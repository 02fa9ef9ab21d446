//! Help command and the `help` inline-button callback.

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use super::{Command, register_sender};
use crate::bot::dispatcher::{AppState, ThrottledBot};

/// Callback data carried by the help button.
pub const HELP_CALLBACK: &str = "help";

const HELP_INTRO: &str = "I'm a bot.\nMy developer has not added any help text :/";

/// Full help text: intro plus the public command list.
pub fn help_text() -> String {
    format!("{}\n\n{}", HELP_INTRO, Command::descriptions())
}

/// Handle /help command.
pub async fn help_command(bot: &ThrottledBot, msg: &Message, state: &AppState) -> anyhow::Result<()> {
    register_sender(msg, state).await?;
    send_help(bot, msg.chat.id).await
}

pub async fn send_help(bot: &ThrottledBot, chat_id: ChatId) -> anyhow::Result<()> {
    bot.send_message(chat_id, help_text()).await?;
    Ok(())
}

/// Replace the message that carried the button with the help text.
///
/// The query is answered even when showing the help fails, so the button
/// never keeps spinning.
pub async fn help_callback(bot: &ThrottledBot, q: &CallbackQuery) -> anyhow::Result<()> {
    let shown = show_help(bot, q).await;
    bot.answer_callback_query(q.id.clone()).await?;
    shown
}

async fn show_help(bot: &ThrottledBot, q: &CallbackQuery) -> anyhow::Result<()> {
    match q.message.as_ref() {
        Some(message) => {
            bot.edit_message_text(message.chat().id, message.id(), help_text())
                .await?;
        }
        None => send_help(bot, ChatId::from(q.from.id)).await?,
    }
    Ok(())
}
