//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding a variant to [`Command`] and a `pub mod your_plugin;` below
//! 3. Routing the variant in `dispatch_command()`

pub mod help;
pub mod info;
pub mod start;
pub mod stats;
pub mod users;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use teloxide::utils::command::BotCommands;
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::{UpsertOutcome, UserProfile};
use crate::middleware::{RateDecision, handle_errors};
use crate::utils::format_time;

/// All bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start(String),

    #[command(description = "Show help")]
    Help,

    #[command(description = "Show stored info about you (or a user id)")]
    Info(String),

    #[command(description = "Show user statistics")]
    Stats,

    #[command(description = "List registered users (owners only)", hide)]
    Users,
}

impl Command {
    /// Name used for logging and as the rate-limit scope.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Help => "help",
            Self::Info(_) => "info",
            Self::Stats => "stats",
            Self::Users => "users",
        }
    }

    /// Commands that hit the store for reads are rate limited.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Info(_) | Self::Stats)
    }
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    teloxide::filter_command::<Command, _>().endpoint(dispatch_command)
}

/// Build the callback query handler.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|q: CallbackQuery| q.data.as_deref() == Some(help::HELP_CALLBACK))
        .endpoint(handle_help_callback)
}

/// Run a command behind the rate-limit and error guards.
async fn dispatch_command(
    bot: ThrottledBot,
    msg: Message,
    cmd: Command,
    state: AppState,
) -> anyhow::Result<()> {
    let name = cmd.name();

    handle_errors(&bot, Some(msg.chat.id), name, async {
        if cmd.is_rate_limited() && !check_rate_limit(&bot, &msg, &state, name).await? {
            return anyhow::Ok(());
        }

        match cmd {
            Command::Start(payload) => start::start_command(&bot, &msg, &state, &payload).await,
            Command::Help => help::help_command(&bot, &msg, &state).await,
            Command::Info(args) => info::info_command(&bot, &msg, &state, &args).await,
            Command::Stats => stats::stats_command(&bot, &msg, &state).await,
            Command::Users => users::users_command(&bot, &msg, &state).await,
        }
    })
    .await;

    Ok(())
}

async fn handle_help_callback(bot: ThrottledBot, q: CallbackQuery) -> anyhow::Result<()> {
    let chat_id = q.message.as_ref().map(|m| m.chat().id);
    handle_errors(&bot, chat_id, "help_callback", help::help_callback(&bot, &q)).await;
    Ok(())
}

/// Returns `false` (after telling the user how long to wait) when limited.
async fn check_rate_limit(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    scope: &'static str,
) -> anyhow::Result<bool> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(true);
    };

    let decision = state.limiter.check(scope, user.id.0);
    let RateDecision::Limited { remaining } = decision else {
        return Ok(true);
    };

    info!("Rate limited /{} for user {} ({:?} left)", scope, user.id, remaining);
    let wait = decision.wait_secs().unwrap_or(1);

    bot.send_message(msg.chat.id, rate_limited_text(wait))
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(false)
}

fn rate_limited_text(wait_secs: u64) -> String {
    format!(
        "Please wait {} before using this command again.",
        format_time(wait_secs)
    )
}

/// Insert or refresh the sender's record.
async fn register_sender(msg: &Message, state: &AppState) -> anyhow::Result<()> {
    if let Some(user) = msg.from.as_ref() {
        register_user(state, &UserProfile::from(user)).await?;
    }
    Ok(())
}

/// Upsert a profile, logging new users and username changes.
async fn register_user(state: &AppState, profile: &UserProfile) -> anyhow::Result<UpsertOutcome> {
    let previous = state.users.id_to_username(profile.user_id).await?;
    let outcome = state.users.add_user(profile).await?;

    match outcome {
        UpsertOutcome::Created => {
            info!("New user registered: {} (@{:?})", profile.user_id, profile.username);
        }
        UpsertOutcome::Updated if previous != profile.username => {
            info!(
                "User {} changed username: {:?} -> {:?}",
                profile.user_id, previous, profile.username
            );
        }
        UpsertOutcome::Updated => {}
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::database::{SqliteUserStore, UserStore};

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("/start", "bot").unwrap(),
            Command::Start(String::new())
        );
        assert_eq!(
            Command::parse("/info 12345", "bot").unwrap(),
            Command::Info("12345".to_string())
        );
        assert_eq!(Command::parse("/stats", "bot").unwrap(), Command::Stats);
    }

    #[test]
    fn test_rate_limited_commands() {
        assert!(Command::Info(String::new()).is_rate_limited());
        assert!(Command::Stats.is_rate_limited());
        assert!(!Command::Start(String::new()).is_rate_limited());
        assert!(!Command::Help.is_rate_limited());
    }

    #[test]
    fn test_rate_limited_text() {
        assert_eq!(
            rate_limited_text(75),
            "Please wait 1m 15s before using this command again."
        );
    }

    #[tokio::test]
    async fn test_register_user_tracks_username_changes() {
        let users: Arc<dyn UserStore> = Arc::new(SqliteUserStore::open_in_memory().unwrap());
        let state = AppState::new(users, Duration::from_secs(10), Vec::new());

        let first = UserProfile::new(5, Some("ada".to_string()));
        assert_eq!(register_user(&state, &first).await.unwrap(), UpsertOutcome::Created);

        let renamed = UserProfile::new(5, Some("lovelace".to_string()));
        assert_eq!(register_user(&state, &renamed).await.unwrap(), UpsertOutcome::Updated);

        assert_eq!(
            state.users.id_to_username(5).await.unwrap().as_deref(),
            Some("lovelace")
        );
        assert_eq!(state.users.user_count().await.unwrap(), 1);
    }
}
