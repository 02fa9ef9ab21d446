//! Cross-cutting guards that wrap every handler.
//!
//! - `tracking` - bumps `last_seen` before any handler runs
//! - `rate_limit` - per-user, per-command fixed window
//! - `error_handler` - traps handler errors and reports them to the chat

pub mod error_handler;
pub mod rate_limit;
pub mod tracking;

pub use error_handler::handle_errors;
pub use rate_limit::{RateDecision, RateLimiter};
pub use tracking::{track_callback, track_message};
