//! In-memory document store backed by JSON fixtures

use crate::filter::matches;
use crate::pipeline;
use crate::projection::project_all;
use crate::StoreError;
use docent_domain::traits::DocumentStore;
use docent_domain::{Document, Record};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Read-only store holding whole collections in memory
///
/// Records keep their fixture order, so the same read always yields the
/// same rows in the same order.
///
/// # Examples
///
/// ```
/// use docent_store::MemoryStore;
///
/// let store = MemoryStore::from_json(r#"{
///     "teams": [{"name": "Jane Doe", "firm": "FirmX"}]
/// }"#).unwrap();
///
/// assert_eq!(store.collection_names(), vec!["teams"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Record>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a collection, builder style
    pub fn with_collection(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        self.insert_collection(name, records);
        self
    }

    /// Add or replace a collection
    pub fn insert_collection(&mut self, name: impl Into<String>, records: Vec<Record>) {
        self.collections.insert(name.into(), records);
    }

    /// Build a store from a JSON object mapping collection names to record arrays
    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        let Value::Object(collections) = value else {
            return Err(StoreError::InvalidData(
                "fixture must be an object of collection name to records".into(),
            ));
        };

        let mut store = Self::new();
        for (name, records) in collections {
            let Value::Array(items) = records else {
                return Err(StoreError::InvalidData(format!(
                    "collection '{}' must be an array of records",
                    name
                )));
            };
            let mut parsed = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(record) => parsed.push(record),
                    other => {
                        return Err(StoreError::InvalidData(format!(
                            "collection '{}' contains a non-object record: {}",
                            name, other
                        )))
                    }
                }
            }
            store.insert_collection(name, parsed);
        }
        Ok(store)
    }

    /// Parse a fixture from JSON text
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Load a fixture file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let store = Self::from_json(&text)?;
        debug!(
            "Loaded fixture {} with {} collections",
            path.as_ref().display(),
            store.collections.len()
        );
        Ok(store)
    }

    /// Collection names, sorted
    pub fn collection_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.collections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All records of a collection
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CollectionNotFound` if the store has no such collection.
    pub fn records(&self, collection: &str) -> Result<&[Record], StoreError> {
        if collection.is_empty() {
            return Err(StoreError::InvalidQuery("collection name is empty".into()));
        }
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }

    /// Filtered, capped and projected read
    pub fn find_records(
        &self,
        collection: &str,
        filter: &Document,
        projection: Option<&Document>,
        limit: Option<u64>,
    ) -> Result<Vec<Record>, StoreError> {
        let cap = limit
            .filter(|&n| n > 0)
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));

        let mut rows = Vec::new();
        for record in self.records(collection)? {
            if rows.len() >= cap {
                break;
            }
            if matches(record, filter)? {
                rows.push(record.clone());
            }
        }

        match projection {
            Some(spec) if !spec.is_empty() => project_all(rows, spec),
            _ => Ok(rows),
        }
    }

    /// Run an aggregation pipeline
    pub fn aggregate_records(
        &self,
        collection: &str,
        stages: &[Document],
    ) -> Result<Vec<Record>, StoreError> {
        let records = self.records(collection)?.to_vec();
        pipeline::run(self, records, stages)
    }
}

impl DocumentStore for MemoryStore {
    type Error = StoreError;

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        projection: Option<&Document>,
        limit: Option<u64>,
    ) -> Result<Vec<Record>, Self::Error> {
        let rows = self.find_records(collection, filter, projection, limit)?;
        debug!(collection, rows = rows.len(), "memory find");
        Ok(rows)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Document],
    ) -> Result<Vec<Record>, Self::Error> {
        let rows = self.aggregate_records(collection, pipeline)?;
        debug!(collection, stages = pipeline.len(), rows = rows.len(), "memory aggregate");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn fixture() -> MemoryStore {
        MemoryStore::from_value(json!({
            "careers": [
                {"position": "Associate", "location": "Boston"},
                {"position": "Paralegal", "location": "Chicago"},
                {"position": "Partner", "location": "Boston"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_value_rejects_bad_shapes() {
        assert!(MemoryStore::from_value(json!([1, 2])).is_err());
        assert!(MemoryStore::from_value(json!({"teams": {"a": 1}})).is_err());
        assert!(MemoryStore::from_value(json!({"teams": [1]})).is_err());
    }

    #[test]
    fn test_find_with_limit() {
        let store = fixture();
        let rows = store
            .find_records("careers", &doc(json!({"location": "Boston"})), None, Some(1))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["position"], "Associate");
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let store = fixture();
        let rows = store
            .find_records("careers", &Document::new(), None, Some(0))
            .unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_missing_collection() {
        let store = fixture();
        let result = store.find_records("clients", &Document::new(), None, None);
        assert!(matches!(result, Err(StoreError::CollectionNotFound(name)) if name == "clients"));
    }

    #[test]
    fn test_empty_collection_name() {
        let store = fixture();
        assert!(matches!(store.records(""), Err(StoreError::InvalidQuery(_))));
    }
}
