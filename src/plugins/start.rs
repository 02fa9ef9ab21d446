//! /start command plugin.
//!
//! Registers the sender and sends a greeting with a help button.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use super::{help, register_sender};
use crate::bot::dispatcher::{AppState, ThrottledBot};

pub const START_TEXT: &str = "Hello! I'm a bot.";

/// Handle the /start command.
///
/// `/start help` (the deep link `t.me/<bot>?start=help`) shows help instead.
pub async fn start_command(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    payload: &str,
) -> anyhow::Result<()> {
    register_sender(msg, state).await?;

    if payload.trim() == "help" {
        return help::send_help(bot, msg.chat.id).await;
    }

    bot.send_message(msg.chat.id, START_TEXT)
        .reply_markup(start_keyboard())
        .await?;

    Ok(())
}

fn start_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "📚 Help",
        help::HELP_CALLBACK,
    )]])
}
