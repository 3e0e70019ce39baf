//! Docent Storage Layer
//!
//! Read-only implementations of the `DocumentStore` trait.
//!
//! # Architecture
//!
//! - `MemoryStore`: whole collections held in memory, loaded from a JSON
//!   fixture. Filters, projections and aggregation pipelines are evaluated
//!   in-process with MongoDB semantics.
//! - `MongoStore` (feature `mongodb`): a live MongoDB database.
//! - `Backend`: whichever of the two a `StoreConfig` selected.
//!
//! Neither store can write: `$out` and `$merge` are refused.
//!
//! # Examples
//!
//! ```
//! use docent_store::MemoryStore;
//! use docent_domain::{Document, traits::DocumentStore};
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let store = MemoryStore::from_json(r#"{"teams": [{"name": "Jane Doe"}]}"#).unwrap();
//! let rows = store.find("teams", &Document::new(), None, None).await.unwrap();
//! assert_eq!(rows.len(), 1);
//! # });
//! ```

#![warn(missing_docs)]

mod expr;
mod filter;
mod memory;
#[cfg(feature = "mongodb")]
mod mongo;
mod pipeline;
mod projection;
mod value;

use docent_domain::traits::DocumentStore;
use docent_domain::{Document, Record};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The collection does not exist in the store
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Operator or stage the store does not implement
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// Malformed filter, projection or pipeline
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Write stage on a read-only store
    #[error("Write stage {0} is not allowed on a read-only store")]
    ReadOnly(String),

    /// Invalid fixture data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Store could not be opened from its settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Fixture file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MongoDB driver error
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// Where the records come from
///
/// `fixture` wins over `uri` when both are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// MongoDB connection URI
    pub uri: Option<String>,

    /// Database name on the MongoDB server
    pub database: String,

    /// JSON fixture file for the in-memory store
    pub fixture: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: None,
            database: "RAG".to_string(),
            fixture: None,
        }
    }
}

impl StoreConfig {
    /// Settings for a fixture file
    pub fn fixture(path: impl Into<PathBuf>) -> Self {
        Self {
            fixture: Some(path.into()),
            ..Self::default()
        }
    }

    /// Open the configured backend
    pub async fn open(&self) -> Result<Backend, StoreError> {
        if let Some(path) = &self.fixture {
            return Ok(Backend::Memory(MemoryStore::from_path(path)?));
        }
        match &self.uri {
            Some(uri) => Self::connect(uri, &self.database).await,
            None => Err(StoreError::Configuration(
                "no data source configured: set a fixture file or a MongoDB uri".into(),
            )),
        }
    }

    #[cfg(feature = "mongodb")]
    async fn connect(uri: &str, database: &str) -> Result<Backend, StoreError> {
        Ok(Backend::Mongo(MongoStore::connect(uri, database).await?))
    }

    #[cfg(not(feature = "mongodb"))]
    async fn connect(_uri: &str, _database: &str) -> Result<Backend, StoreError> {
        Err(StoreError::Configuration(
            "this build has no MongoDB support; rebuild with the `mongodb` feature".into(),
        ))
    }
}

/// A store selected at runtime
#[derive(Debug)]
pub enum Backend {
    /// In-memory fixture
    Memory(MemoryStore),
    /// Live MongoDB database
    #[cfg(feature = "mongodb")]
    Mongo(MongoStore),
}

impl DocumentStore for Backend {
    type Error = StoreError;

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        projection: Option<&Document>,
        limit: Option<u64>,
    ) -> Result<Vec<Record>, Self::Error> {
        match self {
            Backend::Memory(store) => store.find(collection, filter, projection, limit).await,
            #[cfg(feature = "mongodb")]
            Backend::Mongo(store) => store.find(collection, filter, projection, limit).await,
        }
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Document],
    ) -> Result<Vec<Record>, Self::Error> {
        match self {
            Backend::Memory(store) => store.aggregate(collection, pipeline).await,
            #[cfg(feature = "mongodb")]
            Backend::Mongo(store) => store.aggregate(collection, pipeline).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.database, "RAG");
        assert!(config.uri.is_none());
        assert!(config.fixture.is_none());
    }

    #[tokio::test]
    async fn test_open_without_source_fails() {
        let result = StoreConfig::default().open().await;
        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_open_missing_fixture_is_io_error() {
        let result = StoreConfig::fixture("/nonexistent/fixture.json").open().await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[cfg(not(feature = "mongodb"))]
    #[tokio::test]
    async fn test_uri_without_feature_fails() {
        let config = StoreConfig {
            uri: Some("mongodb://localhost:27017".into()),
            ..StoreConfig::default()
        };
        assert!(matches!(config.open().await, Err(StoreError::Configuration(_))));
    }
}
