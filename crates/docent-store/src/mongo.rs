//! MongoDB-backed document store

use crate::StoreError;
use docent_domain::traits::DocumentStore;
use docent_domain::{Document, Record};
use futures::TryStreamExt;
use mongodb::bson::{self, Bson, Document as BsonDocument};
use mongodb::{Client, Database};
use serde_json::Value;
use tracing::{debug, info};

/// Read-only access to one MongoDB database
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connect to `uri` and select `database`
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        info!("Connected to MongoDB database {}", database);
        Ok(Self {
            database: client.database(database),
        })
    }

    /// MongoDB silently returns nothing for unknown collections; report them
    async fn ensure_collection(&self, name: &str) -> Result<(), StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidQuery("collection name is empty".into()));
        }
        let names = self.database.list_collection_names().await?;
        if names.iter().any(|n| n == name) {
            Ok(())
        } else {
            Err(StoreError::CollectionNotFound(name.to_string()))
        }
    }
}

fn to_bson(doc: &Document) -> Result<BsonDocument, StoreError> {
    bson::to_document(doc).map_err(|e| StoreError::InvalidQuery(e.to_string()))
}

fn to_record(doc: BsonDocument) -> Result<Record, StoreError> {
    match Bson::Document(doc).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidData(format!("expected a document, got {}", other))),
    }
}

impl DocumentStore for MongoStore {
    type Error = StoreError;

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        projection: Option<&Document>,
        limit: Option<u64>,
    ) -> Result<Vec<Record>, Self::Error> {
        self.ensure_collection(collection).await?;

        let mut action = self
            .database
            .collection::<BsonDocument>(collection)
            .find(to_bson(filter)?);
        if let Some(spec) = projection.filter(|p| !p.is_empty()) {
            action = action.projection(to_bson(spec)?);
        }
        if let Some(n) = limit.filter(|&n| n > 0) {
            action = action.limit(i64::try_from(n).unwrap_or(i64::MAX));
        }

        let docs: Vec<BsonDocument> = action.await?.try_collect().await?;
        debug!(collection, rows = docs.len(), "mongo find");
        docs.into_iter().map(to_record).collect()
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Document],
    ) -> Result<Vec<Record>, Self::Error> {
        self.ensure_collection(collection).await?;

        let stages = pipeline
            .iter()
            .map(to_bson)
            .collect::<Result<Vec<_>, _>>()?;
        let docs: Vec<BsonDocument> = self
            .database
            .collection::<BsonDocument>(collection)
            .aggregate(stages)
            .await?
            .try_collect()
            .await?;
        debug!(collection, rows = docs.len(), "mongo aggregate");
        docs.into_iter().map(to_record).collect()
    }
}
