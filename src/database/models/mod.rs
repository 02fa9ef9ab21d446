//! Database model exports.

pub mod user;

pub use user::{UpsertOutcome, UserProfile, UserRecord, UserStats};
