//! User data model.
//!
//! One record per Telegram user that has talked to the bot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teloxide::types::User;

/// Stored user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Telegram user ID (unique, never changes).
    pub user_id: u64,
    /// Username without @.
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// First time the user was seen.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub join_date: DateTime<Utc>,
    /// Last interaction. Never moves backwards.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_seen: DateTime<Utc>,
}

impl UserRecord {
    /// First and last name joined, if any are set.
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// The mutable fields of a user, as observed on an incoming update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: u64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserProfile {
    pub fn new(user_id: u64, username: Option<String>) -> Self {
        Self {
            user_id,
            username,
            first_name: None,
            last_name: None,
        }
    }

    #[must_use]
    pub fn with_names(mut self, first_name: Option<String>, last_name: Option<String>) -> Self {
        self.first_name = first_name;
        self.last_name = last_name;
        self
    }
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        let first_name = Some(user.first_name.clone()).filter(|s| !s.is_empty());
        Self::new(user.id.0, user.username.clone()).with_names(first_name, user.last_name.clone())
    }
}

/// Result of an upsert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Aggregate user counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total_users: u64,
    pub active_users: u64,
}
