//! Utility functions.
//!
//! Collection of helper functions used across the bot.

pub mod formatting;
pub mod parser;

pub use formatting::{format_time, format_user_mention, html_escape};
pub use parser::parse_args;
