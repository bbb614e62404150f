//! MongoDB client and collection wrapper

use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::{
    options::{FindOptions, IndexOptions},
    results::{DeleteResult, UpdateResult},
    Client, Collection, IndexModel,
};
use tracing::{debug, info};

use crate::types::ApiError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, ApiError> {
        info!("Connecting to MongoDB at {}", redact_uri(uri));

        // Fail fast instead of hanging on an unreachable server
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| ApiError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ApiError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Open a collection and apply the schema's indexes
    pub async fn collection<T: IntoIndexes>(&self, name: &str) -> Result<MongoCollection, ApiError> {
        let collection = MongoCollection {
            inner: self.client.database(&self.db_name).collection::<Document>(name),
        };
        collection.apply_indexes(T::into_indices()).await?;
        Ok(collection)
    }

    /// Close pooled connections; called once on shutdown
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        info!("MongoDB client closed");
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Untyped collection handle; records are encoded by the store layer
#[derive(Debug, Clone)]
pub struct MongoCollection {
    inner: Collection<Document>,
}

impl MongoCollection {
    async fn apply_indexes(
        &self,
        schema_indices: Vec<(Document, Option<IndexOptions>)>,
    ) -> Result<(), ApiError> {
        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| ApiError::Database(format!("Failed to create indexes: {}", e)))?;

        debug!("Indexes applied to '{}'", self.inner.name());
        Ok(())
    }

    pub async fn insert_one(&self, document: Document) -> Result<(), ApiError> {
        self.inner
            .insert_one(document)
            .await
            .map_err(|e| ApiError::Database(format!("Insert failed: {}", e)))?;
        Ok(())
    }

    pub async fn count(&self, filter: Document) -> Result<u64, ApiError> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| ApiError::Database(format!("Count failed: {}", e)))
    }

    /// Sorted, paginated find
    pub async fn find_page(
        &self,
        filter: Document,
        sort: Document,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Document>, ApiError> {
        let options = FindOptions::builder()
            .sort(sort)
            .skip(skip)
            .limit(limit)
            .build();

        let cursor = self
            .inner
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| ApiError::Database(format!("Find failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| ApiError::Database(format!("Cursor read failed: {}", e)))
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<Document>, ApiError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| ApiError::Database(format!("Find failed: {}", e)))
    }

    pub async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateResult, ApiError> {
        self.inner
            .update_one(filter, update)
            .await
            .map_err(|e| ApiError::Database(format!("Update failed: {}", e)))
    }

    pub async fn delete_one(&self, filter: Document) -> Result<DeleteResult, ApiError> {
        self.inner
            .delete_one(filter)
            .await
            .map_err(|e| ApiError::Database(format!("Delete failed: {}", e)))
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Connection string with any `user:password@` part masked, for logging
pub fn redact_uri(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}://***@{}", scheme, &rest[at + 1..]),
        None => uri.to_string(),
    }
}
