//! /info command plugin.
//!
//! Shows the stored record for the sender, the replied-to user, or an
//! explicit numeric id.

use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::UserRecord;
use crate::utils::{format_time, format_user_mention, html_escape, parse_args};

const USAGE: &str = "Usage: /info [user_id] (or reply to a message)";

/// Handle the /info command.
pub async fn info_command(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    args: &str,
) -> anyhow::Result<()> {
    let replied = msg
        .reply_to_message()
        .and_then(|reply| reply.from.as_ref())
        .map(|user| user.id.0);
    let sender = msg.from.as_ref().map(|user| user.id.0);

    let Some(user_id) = resolve_target(args, replied, sender) else {
        bot.send_message(msg.chat.id, USAGE)
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    };

    let record = state.users.get_user(user_id).await?;
    let text = render_info(user_id, record.as_ref(), Utc::now());

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}

/// Explicit id argument first, then the replied-to user, then the sender.
/// `None` when the argument is not a number or nobody can be identified.
fn resolve_target(args: &str, replied: Option<u64>, sender: Option<u64>) -> Option<u64> {
    match parse_args(args).first() {
        Some(arg) => arg.parse().ok(),
        None => replied.or(sender),
    }
}

/// Render the info card. Unknown users get a "not registered" notice.
pub fn render_info(user_id: u64, record: Option<&UserRecord>, now: DateTime<Utc>) -> String {
    let Some(user) = record else {
        return format!(
            "User <code>{}</code> is not registered yet. Send /start to register.",
            user_id
        );
    };

    let name = user
        .full_name()
        .map(|n| html_escape(&n))
        .unwrap_or_else(|| "-".to_string());
    let idle = (now - user.last_seen).num_seconds().max(0) as u64;

    format!(
        "<b>User info</b>\n\
         ID: <code>{}</code>\n\
         User: {}\n\
         Name: {}\n\
         Joined: {}\n\
         Last seen: {} ago",
        user.user_id,
        format_user_mention(user.user_id, user.username.as_deref()),
        name,
        user.join_date.format("%Y-%m-%d %H:%M UTC"),
        format_time(idle),
    )
}
