//! Activity tracking.
//!
//! Runs before every message and callback handler. Only known users are
//! touched; registration happens in /start and /help.

use teloxide::prelude::*;
use tracing::{trace, warn};

use crate::bot::dispatcher::AppState;

/// Track the sender of a message.
pub async fn track_message(msg: Message, state: AppState) {
    if let Some(user) = msg.from.as_ref() {
        touch(&state, user.id.0).await;
    }
}

/// Track the user who pressed an inline button.
pub async fn track_callback(q: CallbackQuery, state: AppState) {
    touch(&state, q.from.id.0).await;
}

async fn touch(state: &AppState, user_id: u64) {
    match state.users.update_last_seen(user_id).await {
        Ok(true) => trace!("Updated last_seen for {}", user_id),
        Ok(false) => trace!("User {} not registered, nothing to track", user_id),
        Err(e) => warn!("Failed to update last_seen for {}: {}", user_id, e),
    }
}
