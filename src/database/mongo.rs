//! MongoDB user store (document variant).

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::options::{ClientOptions, IndexOptions, UpdateOptions};
use mongodb::{Client, Collection, IndexModel};
use tracing::{debug, info};

use super::error::{StoreResult, storage_id};
use super::models::{UpsertOutcome, UserProfile, UserRecord};
use super::UserStore;

/// User store backed by the `users` collection.
#[derive(Debug, Clone)]
pub struct MongoUserStore {
    collection: Collection<UserRecord>,
}

impl MongoUserStore {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// # Errors
    /// Returns error if the URI is invalid or the server does not answer a ping.
    pub async fn connect(uri: &str, db_name: &str) -> StoreResult<Self> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        info!("Successfully connected to MongoDB");

        Ok(Self {
            collection: client.database(db_name).collection("users"),
        })
    }

    fn by_id(user_id: u64) -> StoreResult<Document> {
        let id = storage_id(user_id)?;
        Ok(doc! { "user_id": id })
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn add_user(&self, profile: &UserProfile) -> StoreResult<UpsertOutcome> {
        let now = Utc::now().timestamp();
        let update = doc! {
            "$set": {
                "username": profile.username.clone(),
                "first_name": profile.first_name.clone(),
                "last_name": profile.last_name.clone(),
            },
            "$max": { "last_seen": now },
            "$setOnInsert": { "join_date": now },
        };
        let options = UpdateOptions::builder().upsert(true).build();

        let result = self
            .collection
            .update_one(Self::by_id(profile.user_id)?, update)
            .with_options(options)
            .await?;

        let outcome = if result.upserted_id.is_some() {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        };
        debug!("Upserted user {} ({:?})", profile.user_id, outcome);
        Ok(outcome)
    }

    async fn get_user(&self, user_id: u64) -> StoreResult<Option<UserRecord>> {
        Ok(self.collection.find_one(Self::by_id(user_id)?).await?)
    }

    async fn get_all_users(&self) -> StoreResult<Vec<UserRecord>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "user_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_last_seen(&self, user_id: u64) -> StoreResult<bool> {
        // matched, not modified: `$max` is a no-op within the same second.
        let result = self
            .collection
            .update_one(
                Self::by_id(user_id)?,
                doc! { "$max": { "last_seen": Utc::now().timestamp() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn id_to_username(&self, user_id: u64) -> StoreResult<Option<String>> {
        let user = self
            .collection
            .clone_with_type::<Document>()
            .find_one(Self::by_id(user_id)?)
            .projection(doc! { "username": 1 })
            .await?;

        Ok(user.and_then(|doc| doc.get_str("username").ok().map(str::to_string)))
    }

    async fn user_count(&self) -> StoreResult<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn active_users(&self, days: u32) -> StoreResult<u64> {
        let cutoff = Utc::now().timestamp() - i64::from(days) * 86_400;
        Ok(self
            .collection
            .count_documents(doc! { "last_seen": { "$gte": cutoff } })
            .await?)
    }

    async fn create_indexes(&self) -> StoreResult<()> {
        let unique_id = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let last_seen = IndexModel::builder().keys(doc! { "last_seen": 1 }).build();

        self.collection
            .create_indexes([unique_id, last_seen])
            .await?;

        debug!("Ensured indexes on users collection");
        Ok(())
    }
}
