//! Query descriptor - the structured form of one database read

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A MongoDB-style document: field name to JSON value
pub type Document = serde_json::Map<String, Value>;

/// Structured, schema-bound description of one read operation
///
/// Descriptors are produced fresh for every turn by the translator and
/// consumed once by the executor. The wire format follows the exemplars
/// the translator is primed with, so the filter travels under the key
/// `query` (`filter` is accepted as an alias). Unknown keys are rejected.
///
/// # Examples
///
/// ```
/// use docent_domain::{QueryDescriptor, QueryPlan};
///
/// let descriptor: QueryDescriptor = serde_json::from_str(r#"{
///     "collection": "teams",
///     "query": { "position": { "$regex": "Founding Partner", "$options": "i" } },
///     "projection": { "name": 1, "_id": 0 }
/// }"#).unwrap();
///
/// assert_eq!(descriptor.collection, "teams");
/// assert!(matches!(descriptor.plan(), QueryPlan::ProjectedFind { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryDescriptor {
    /// Target collection name
    pub collection: String,

    /// Match conditions; empty means match everything
    #[serde(rename = "query", alias = "filter", default)]
    pub filter: Document,

    /// Include/exclude flags used to shrink rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Document>,

    /// Ordered pipeline stages; wins over filter and projection when non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Vec<Document>>,

    /// Cap on returned rows for find-style reads (0 means no cap)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// How a descriptor is dispatched against the store
///
/// Precedence: a non-empty aggregation pipeline, then a projected find,
/// then a plain find.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryPlan<'a> {
    /// Run the pipeline; filter, projection and limit are ignored
    Aggregate {
        /// Pipeline stages in order
        pipeline: &'a [Document],
    },

    /// Filtered read with a projection
    ProjectedFind {
        /// Match conditions
        filter: &'a Document,
        /// Include/exclude flags
        projection: &'a Document,
        /// Row cap
        limit: Option<u64>,
    },

    /// Filtered read returning whole records
    Find {
        /// Match conditions
        filter: &'a Document,
        /// Row cap
        limit: Option<u64>,
    },
}

impl QueryPlan<'_> {
    /// Short name of the plan, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            QueryPlan::Aggregate { .. } => "aggregate",
            QueryPlan::ProjectedFind { .. } => "projected_find",
            QueryPlan::Find { .. } => "find",
        }
    }
}

impl QueryDescriptor {
    /// Create a match-all descriptor for a collection
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: Document::new(),
            projection: None,
            aggregation: None,
            limit: None,
        }
    }

    /// Set the filter
    pub fn with_filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    /// Set the projection
    pub fn with_projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Set the aggregation pipeline
    pub fn with_aggregation(mut self, pipeline: Vec<Document>) -> Self {
        self.aggregation = Some(pipeline);
        self
    }

    /// Set the row cap
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Row cap with the "0 means unlimited" convention applied
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit.filter(|&n| n > 0)
    }

    /// Decide how this descriptor is executed
    pub fn plan(&self) -> QueryPlan<'_> {
        if let Some(pipeline) = self.aggregation.as_deref() {
            if !pipeline.is_empty() {
                return QueryPlan::Aggregate { pipeline };
            }
        }

        match self.projection.as_ref() {
            Some(projection) if !projection.is_empty() => QueryPlan::ProjectedFind {
                filter: &self.filter,
                projection,
                limit: self.effective_limit(),
            },
            _ => QueryPlan::Find {
                filter: &self.filter,
                limit: self.effective_limit(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_minimal_descriptor() {
        let descriptor: QueryDescriptor =
            serde_json::from_str(r#"{"collection": "careers"}"#).unwrap();
        assert_eq!(descriptor.collection, "careers");
        assert!(descriptor.filter.is_empty());
        assert!(descriptor.projection.is_none());
        assert!(descriptor.aggregation.is_none());
    }

    #[test]
    fn test_filter_alias_accepted() {
        let descriptor: QueryDescriptor =
            serde_json::from_str(r#"{"collection": "teams", "filter": {"name": "Tony Rupp"}}"#)
                .unwrap();
        assert_eq!(descriptor.filter.get("name"), Some(&json!("Tony Rupp")));
    }

    #[test]
    fn test_missing_collection_rejected() {
        let result = serde_json::from_str::<QueryDescriptor>(r#"{"query": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result =
            serde_json::from_str::<QueryDescriptor>(r#"{"collection": "teams", "sort": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_filter_as_query() {
        let descriptor = QueryDescriptor::new("teams").with_filter(doc(json!({"firm": "A"})));
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["query"], json!({"firm": "A"}));
        assert!(value.get("projection").is_none());
    }

    #[test]
    fn test_aggregation_takes_precedence() {
        let descriptor = QueryDescriptor::new("teams")
            .with_filter(doc(json!({"firm": "A"})))
            .with_projection(doc(json!({"name": 1})))
            .with_aggregation(vec![doc(json!({"$group": {"_id": "$firm"}}))]);

        match descriptor.plan() {
            QueryPlan::Aggregate { pipeline } => assert_eq!(pipeline.len(), 1),
            other => panic!("Expected aggregate plan, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_aggregation_falls_back_to_find() {
        let descriptor = QueryDescriptor::new("teams").with_aggregation(Vec::new());
        assert!(matches!(descriptor.plan(), QueryPlan::Find { .. }));
    }

    #[test]
    fn test_empty_projection_is_plain_find() {
        let descriptor = QueryDescriptor::new("teams").with_projection(Document::new());
        assert_eq!(descriptor.plan().kind(), "find");
    }

    #[test]
    fn test_zero_limit_means_unlimited() {
        let descriptor = QueryDescriptor::new("articles").with_limit(0);
        assert_eq!(descriptor.effective_limit(), None);
        let descriptor = QueryDescriptor::new("articles").with_limit(5);
        assert!(matches!(descriptor.plan(), QueryPlan::Find { limit: Some(5), .. }));
    }
}
