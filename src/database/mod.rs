//! Database module.
//!
//! User persistence behind the [`UserStore`] trait, with a relational
//! (SQLite) and a document (MongoDB) backend. `DB_URI` picks one at startup.

mod error;
mod models;
mod mongo;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

pub use error::{StoreError, StoreResult};
pub use models::*;
pub use mongo::MongoUserStore;
pub use sqlite::SqliteUserStore;

use crate::config::{Config, ConfigError};

/// Window used by [`UserStore::user_stats`] for the active-user count.
pub const ACTIVE_WINDOW_DAYS: u32 = 7;

/// User persistence operations shared by every backend.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert the user if absent, otherwise refresh names and `last_seen`.
    async fn add_user(&self, profile: &UserProfile) -> StoreResult<UpsertOutcome>;

    async fn get_user(&self, user_id: u64) -> StoreResult<Option<UserRecord>>;

    /// All users ordered by id.
    async fn get_all_users(&self) -> StoreResult<Vec<UserRecord>>;

    /// Bump `last_seen` for a known user. Returns `false` if the user is unknown.
    async fn update_last_seen(&self, user_id: u64) -> StoreResult<bool>;

    async fn id_to_username(&self, user_id: u64) -> StoreResult<Option<String>>;

    async fn user_count(&self) -> StoreResult<u64>;

    /// Users seen within the last `days` days.
    async fn active_users(&self, days: u32) -> StoreResult<u64>;

    /// Create the unique `user_id` index and the `last_seen` index.
    async fn create_indexes(&self) -> StoreResult<()>;

    async fn user_stats(&self) -> StoreResult<UserStats> {
        Ok(UserStats {
            total_users: self.user_count().await?,
            active_users: self.active_users(ACTIVE_WINDOW_DAYS).await?,
        })
    }
}

/// Backend selected by the `DB_URI` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUri {
    /// `None` means an in-memory database.
    Sqlite(Option<String>),
    Mongo(String),
}

impl StoreUri {
    /// Parse a connection string.
    ///
    /// - `sqlite://` - in-memory
    /// - `sqlite:///bot.db` - relative path `bot.db`
    /// - `sqlite:////var/lib/bot.db` - absolute path
    /// - `mongodb://...` / `mongodb+srv://...`
    pub fn parse(uri: &str) -> Result<Self, ConfigError> {
        let uri = uri.trim();

        if uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://") {
            return Ok(Self::Mongo(uri.to_string()));
        }

        if let Some(rest) = uri.strip_prefix("sqlite://") {
            let path = rest.strip_prefix('/').unwrap_or(rest);
            return Ok(match path {
                "" | ":memory:" => Self::Sqlite(None),
                path => Self::Sqlite(Some(path.to_string())),
            });
        }

        Err(ConfigError::UnsupportedDatabase(uri.to_string()))
    }
}

/// Open the configured store and make sure its indexes exist.
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn UserStore>> {
    let store: Arc<dyn UserStore> = match StoreUri::parse(&config.db_uri)? {
        StoreUri::Sqlite(path) => {
            info!("Using SQLite store at {}", path.as_deref().unwrap_or(":memory:"));
            let store = match path {
                Some(path) => SqliteUserStore::open(&path)?,
                None => SqliteUserStore::open_in_memory()?,
            };
            Arc::new(store)
        }
        StoreUri::Mongo(uri) => {
            info!("Connecting to MongoDB...");
            Arc::new(MongoUserStore::connect(&uri, &config.mongodb_database).await?)
        }
    };

    store.create_indexes().await?;
    info!("User store ready");

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sqlite_uris() {
        assert_eq!(StoreUri::parse("sqlite://").unwrap(), StoreUri::Sqlite(None));
        assert_eq!(
            StoreUri::parse("sqlite:///bot.db").unwrap(),
            StoreUri::Sqlite(Some("bot.db".to_string()))
        );
        assert_eq!(
            StoreUri::parse("sqlite:////var/lib/bot.db").unwrap(),
            StoreUri::Sqlite(Some("/var/lib/bot.db".to_string()))
        );
    }

    #[test]
    fn test_parse_mongo_uris() {
        assert_eq!(
            StoreUri::parse("mongodb://localhost:27017").unwrap(),
            StoreUri::Mongo("mongodb://localhost:27017".to_string())
        );
        assert!(matches!(
            StoreUri::parse("mongodb+srv://cluster.example.net").unwrap(),
            StoreUri::Mongo(_)
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_scheme() {
        assert!(matches!(
            StoreUri::parse("postgres://localhost/bot"),
            Err(ConfigError::UnsupportedDatabase(_))
        ));
    }
}
