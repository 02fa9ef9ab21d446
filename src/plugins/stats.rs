//! /stats command plugin.

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::{ACTIVE_WINDOW_DAYS, UserStats};

/// Handle the /stats command - total and recently active users.
pub async fn stats_command(bot: &ThrottledBot, msg: &Message, state: &AppState) -> anyhow::Result<()> {
    let stats = state.users.user_stats().await?;

    bot.send_message(msg.chat.id, render_stats(&stats))
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}

fn render_stats(stats: &UserStats) -> String {
    format!(
        "<b>Bot statistics</b>\n\
         Total users: <code>{}</code>\n\
         Active users (last {} days): <code>{}</code>",
        stats.total_users, ACTIVE_WINDOW_DAYS, stats.active_users
    )
}
