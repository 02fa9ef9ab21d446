//! SQLite user store (relational variant).
//!
//! Blocking `rusqlite` calls over an `r2d2` pool. The inherent methods block;
//! the [`UserStore`] impl runs each of them on tokio's blocking pool.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

use super::error::{StoreResult, storage_id};
use super::models::{UpsertOutcome, UserProfile, UserRecord};
use super::UserStore;

pub type DbPool = Pool<SqliteConnectionManager>;
type DbConnection = PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        user_id    INTEGER PRIMARY KEY,
        username   TEXT,
        first_name TEXT,
        last_name  TEXT,
        join_date  INTEGER NOT NULL,
        last_seen  INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_users_last_seen ON users (last_seen);
";

const SELECT_USER: &str =
    "SELECT user_id, username, first_name, last_name, join_date, last_seen FROM users";

/// User store backed by a SQLite file (or memory).
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: DbPool,
}

impl SqliteUserStore {
    /// Open (or create) the database file and its schema.
    pub fn open(path: &str) -> StoreResult<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            Ok(())
        });
        let pool = Pool::builder().max_size(8).build(manager)?;
        Self::with_pool(pool)
    }

    /// In-memory database. Every pooled connection would get its own memory
    /// database, so the pool holds exactly one.
    pub fn open_in_memory() -> StoreResult<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(SqliteConnectionManager::memory())?;
        Self::with_pool(pool)
    }

    fn with_pool(pool: DbPool) -> StoreResult<Self> {
        let store = Self { pool };
        store.create_indexes()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Run a blocking call on tokio's blocking pool.
    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&SqliteUserStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store)).await?
    }

    // --- Blocking API ---

    pub fn create_indexes(&self) -> StoreResult<()> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn add_user(&self, profile: &UserProfile) -> StoreResult<UpsertOutcome> {
        let id = storage_id(profile.user_id)?;
        let now = Utc::now().timestamp();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO users (user_id, username, first_name, last_name, join_date, last_seen)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(user_id) DO NOTHING",
            params![id, profile.username, profile.first_name, profile.last_name, now],
        )?;

        let outcome = if inserted == 1 {
            UpsertOutcome::Created
        } else {
            tx.execute(
                "UPDATE users
                 SET username = ?2, first_name = ?3, last_name = ?4,
                     last_seen = MAX(last_seen, ?5)
                 WHERE user_id = ?1",
                params![id, profile.username, profile.first_name, profile.last_name, now],
            )?;
            UpsertOutcome::Updated
        };

        tx.commit()?;
        debug!("Upserted user {} ({:?})", profile.user_id, outcome);
        Ok(outcome)
    }

    pub fn get_user(&self, user_id: u64) -> StoreResult<Option<UserRecord>> {
        let id = storage_id(user_id)?;
        let user = self
            .conn()?
            .query_row(&format!("{SELECT_USER} WHERE user_id = ?1"), params![id], parse_row)
            .optional()?;
        Ok(user)
    }

    pub fn get_all_users(&self) -> StoreResult<Vec<UserRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_USER} ORDER BY user_id"))?;
        let users = stmt
            .query_map([], parse_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn update_last_seen(&self, user_id: u64) -> StoreResult<bool> {
        let id = storage_id(user_id)?;
        let updated = self.conn()?.execute(
            "UPDATE users SET last_seen = MAX(last_seen, ?2) WHERE user_id = ?1",
            params![id, Utc::now().timestamp()],
        )?;
        Ok(updated > 0)
    }

    pub fn id_to_username(&self, user_id: u64) -> StoreResult<Option<String>> {
        let id = storage_id(user_id)?;
        let username: Option<Option<String>> = self
            .conn()?
            .query_row(
                "SELECT username FROM users WHERE user_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(username.flatten())
    }

    pub fn user_count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn active_users(&self, days: u32) -> StoreResult<u64> {
        let cutoff = Utc::now().timestamp() - i64::from(days) * 86_400;
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM users WHERE last_seen >= ?1",
            params![cutoff],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

fn parse_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let id: i64 = row.get("user_id")?;
    let user_id =
        u64::try_from(id).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, id))?;

    Ok(UserRecord {
        user_id,
        username: row.get("username")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        join_date: from_timestamp(row.get("join_date")?),
        last_seen: from_timestamp(row.get("last_seen")?),
    })
}

fn from_timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn add_user(&self, profile: &UserProfile) -> StoreResult<UpsertOutcome> {
        let profile = profile.clone();
        self.run(move |store| store.add_user(&profile)).await
    }

    async fn get_user(&self, user_id: u64) -> StoreResult<Option<UserRecord>> {
        self.run(move |store| store.get_user(user_id)).await
    }

    async fn get_all_users(&self) -> StoreResult<Vec<UserRecord>> {
        self.run(|store| store.get_all_users()).await
    }

    async fn update_last_seen(&self, user_id: u64) -> StoreResult<bool> {
        self.run(move |store| store.update_last_seen(user_id)).await
    }

    async fn id_to_username(&self, user_id: u64) -> StoreResult<Option<String>> {
        self.run(move |store| store.id_to_username(user_id)).await
    }

    async fn user_count(&self) -> StoreResult<u64> {
        self.run(|store| store.user_count()).await
    }

    async fn active_users(&self, days: u32) -> StoreResult<u64> {
        self.run(move |store| store.active_users(days)).await
    }

    async fn create_indexes(&self) -> StoreResult<()> {
        self.run(|store| store.create_indexes()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::database::{StoreError, UserStats};

    fn store() -> SqliteUserStore {
        SqliteUserStore::open_in_memory().unwrap()
    }

    fn profile(id: u64, username: &str) -> UserProfile {
        UserProfile::new(id, Some(username.to_string()))
    }

    #[test]
    fn test_upsert_twice_keeps_one_record() {
        let store = store();

        let first = store.add_user(&profile(42, "old_name")).unwrap();
        let second = store
            .add_user(
                &profile(42, "new_name").with_names(Some("Ada".into()), Some("Lovelace".into())),
            )
            .unwrap();

        assert_eq!(first, UpsertOutcome::Created);
        assert_eq!(second, UpsertOutcome::Updated);
        assert_eq!(store.user_count().unwrap(), 1);

        let user = store.get_user(42).unwrap().unwrap();
        assert_eq!(user.username.as_deref(), Some("new_name"));
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.last_name.as_deref(), Some("Lovelace"));
        assert!(user.last_seen >= user.join_date);
    }

    #[test]
    fn test_update_keeps_join_date() {
        let store = store();
        store.add_user(&profile(7, "a")).unwrap();
        let joined = store.get_user(7).unwrap().unwrap().join_date;

        store.add_user(&profile(7, "b")).unwrap();

        assert_eq!(store.get_user(7).unwrap().unwrap().join_date, joined);
    }

    #[test]
    fn test_update_last_seen_unknown_user() {
        let store = store();

        assert!(!store.update_last_seen(99).unwrap());
        assert!(store.get_user(99).unwrap().is_none());
    }

    #[test]
    fn test_update_last_seen_known_user() {
        let store = store();
        store.add_user(&profile(5, "someone")).unwrap();

        assert!(store.update_last_seen(5).unwrap());
    }

    #[test]
    fn test_last_seen_never_moves_backwards() {
        let store = store();
        store.add_user(&profile(3, "later")).unwrap();

        let future = Utc::now().timestamp() + 3600;
        store
            .conn()
            .unwrap()
            .execute("UPDATE users SET last_seen = ?1 WHERE user_id = 3", params![future])
            .unwrap();

        store.update_last_seen(3).unwrap();
        store.add_user(&profile(3, "later")).unwrap();

        assert_eq!(store.get_user(3).unwrap().unwrap().last_seen.timestamp(), future);
    }

    #[test]
    fn test_id_to_username() {
        let store = store();
        store.add_user(&profile(1, "alice")).unwrap();
        store.add_user(&UserProfile::new(2, None)).unwrap();

        assert_eq!(store.id_to_username(1).unwrap().as_deref(), Some("alice"));
        assert_eq!(store.id_to_username(2).unwrap(), None);
        assert_eq!(store.id_to_username(3).unwrap(), None);
    }

    #[test]
    fn test_active_users_window() {
        let store = store();
        store.add_user(&profile(1, "fresh")).unwrap();
        store.add_user(&profile(2, "stale")).unwrap();

        let long_ago = Utc::now().timestamp() - 30 * 86_400;
        store
            .conn()
            .unwrap()
            .execute("UPDATE users SET last_seen = ?1 WHERE user_id = 2", params![long_ago])
            .unwrap();

        assert_eq!(store.user_count().unwrap(), 2);
        assert_eq!(store.active_users(7).unwrap(), 1);
        assert_eq!(store.active_users(60).unwrap(), 2);
    }

    #[test]
    fn test_get_all_users_ordered() {
        let store = store();
        for id in [30, 10, 20] {
            store.add_user(&UserProfile::new(id, None)).unwrap();
        }

        let ids: Vec<u64> = store.get_all_users().unwrap().iter().map(|u| u.user_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_rejects_out_of_range_id() {
        let store = store();
        let result = store.add_user(&UserProfile::new(u64::MAX, None));

        assert!(matches!(result, Err(StoreError::IdOutOfRange(u64::MAX))));
    }

    #[test]
    fn test_create_indexes_is_idempotent() {
        let store = store();
        store.create_indexes().unwrap();
        store.create_indexes().unwrap();
    }

    #[tokio::test]
    async fn test_async_trait_roundtrip() {
        let store: Arc<dyn UserStore> = Arc::new(store());

        let outcome = store.add_user(&profile(11, "async_user")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);
        assert!(store.update_last_seen(11).await.unwrap());

        let stats = store.user_stats().await.unwrap();
        assert_eq!(stats, UserStats { total_users: 1, active_users: 1 });
    }
}
