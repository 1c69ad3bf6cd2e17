use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::options::ReplaceOptions;
use mongodb::{bson, Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::StorageConfig;
use crate::error::Error;

const STORAGE: &str = "storage";

/// String-valued key-value side-channel that outlives the process.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    async fn set(&self, key: &str, value: String) -> Result<(), Error>;
}

#[async_trait]
impl<S: Storage + ?Sized> Storage for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), Error> {
        (**self).set(key, value).await
    }
}

pub async fn connect(config: &StorageConfig) -> Result<Box<dyn Storage>, Error> {
    match config {
        StorageConfig::Memory => {
            info!("using in-memory storage");
            Ok(Box::new(MemoryStorage::new()))
        }
        StorageConfig::Mongo { uri, database } => {
            info!("connecting to db: {}", uri);
            let db = Client::with_uri_str(uri).await?.database(database);

            // ping the database to ensure connection is established
            db.run_command(bson::doc! { "ping": 1 }, None).await?;

            Ok(Box::new(db.collection::<StorageEntry>(STORAGE)))
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StorageEntry {
    #[serde(rename = "_id")]
    pub key: String,
    pub value: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

pub type MongoStorage = Collection<StorageEntry>;

#[async_trait]
impl Storage for MongoStorage {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entry = self.find_one(bson::doc! { "_id": key }, None).await?;

        Ok(entry.map(|entry| entry.value))
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&self, key: &str, value: String) -> Result<(), Error> {
        let entry = StorageEntry {
            key: key.to_owned(),
            value,
            modified_at: Utc::now(),
        };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.replace_one(bson::doc! { "_id": key }, &entry, options)
            .await?;

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value);

        Ok(())
    }
}
