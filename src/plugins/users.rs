//! /users command plugin (owners only).

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::UserRecord;
use crate::utils::format_user_mention;

/// Lines shown before the list is cut off.
const MAX_LISTED: usize = 50;

/// Handle the /users command.
pub async fn users_command(bot: &ThrottledBot, msg: &Message, state: &AppState) -> anyhow::Result<()> {
    let is_owner = msg
        .from
        .as_ref()
        .is_some_and(|user| state.is_owner(user.id.0));

    let text = if is_owner {
        render_user_list(&state.users.get_all_users().await?)
    } else {
        "This command is only available to bot owners.".to_string()
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}

fn render_user_list(users: &[UserRecord]) -> String {
    if users.is_empty() {
        return "No users registered yet.".to_string();
    }

    let mut text = format!("<b>Registered users ({})</b>\n", users.len());
    for user in users.iter().take(MAX_LISTED) {
        text.push_str(&format!(
            "• {} (<code>{}</code>)\n",
            format_user_mention(user.user_id, user.username.as_deref()),
            user.user_id
        ));
    }

    if users.len() > MAX_LISTED {
        text.push_str(&format!("…and {} more", users.len() - MAX_LISTED));
    }

    text
}
