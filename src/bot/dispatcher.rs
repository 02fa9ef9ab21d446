//! Message dispatcher setup.
//!
//! Builds the dispatcher with the tracking guard, command handlers and the
//! help callback.

use std::sync::Arc;
use std::time::Duration;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::debug;

use crate::database::UserStore;
use crate::middleware::{self, RateLimiter};
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Dispatcher type used by both polling and webhook runners.
pub type BotDispatcher = Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// User store (SQLite or MongoDB).
    pub users: Arc<dyn UserStore>,

    /// Per-command rate limiter.
    pub limiter: RateLimiter,

    /// Owner user IDs.
    pub owner_ids: Arc<[u64]>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, rate_limit_window: Duration, owner_ids: Vec<u64>) -> Self {
        Self {
            users,
            limiter: RateLimiter::new(rate_limit_window),
            owner_ids: owner_ids.into(),
        }
    }

    /// Check if a user is a bot owner.
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owner_ids.contains(&user_id)
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(bot: ThrottledBot, state: AppState) -> BotDispatcher {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!("Unhandled update {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    // Tracking runs first for every update, then the routed handler.
    let message_handler = Update::filter_message()
        .inspect_async(middleware::track_message)
        .branch(plugins::command_handler());

    let callback_handler = Update::filter_callback_query()
        .inspect_async(middleware::track_callback)
        .branch(plugins::callback_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}
