//! Starter Bot - Telegram bot template
//!
//! Replies to a handful of commands and keeps minimal user metadata.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - User persistence (SQLite or MongoDB, picked by `DB_URI`)
//! - `middleware` - Activity tracking, rate limiting, error trapping
//! - `bot` - Dispatcher and runtime (with Throttle for API rate limiting)
//! - `plugins` - Command handlers
//! - `utils` - Formatting and argument parsing

mod bot;
mod config;
mod database;
mod middleware;
mod plugins;
mod utils;

use std::time::Duration;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::AppState;
use config::Config;
use plugins::Command;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("starter_bot=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting bot...");

    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config);

    let users = database::open_store(&config).await?;

    let state = AppState::new(
        users,
        Duration::from_secs(config.rate_limit_window),
        config.owner_ids.clone(),
    );
    info!("Rate limit window: {:?}", state.limiter.window());

    // Throttle respects Telegram's own limits (30 msg/s global, 1 msg/s per chat)
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    bot.set_my_commands(Command::bot_commands()).await?;
    info!("Registered bot commands");

    let dispatcher = bot::build_dispatcher(bot.clone(), state);
    bot::run(&config, bot, dispatcher).await
}
