//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and
//! infrastructure. Implementations live in other crates.

use crate::{CompletionRequest, Document, Record};
use std::future::Future;

/// Trait for language-model completion services
///
/// Implemented by the infrastructure layer (docent-llm). A call is a pure
/// `(request) -> text` round-trip; retries and timeouts belong to the
/// implementation.
pub trait LlmProvider {
    /// Error type for completion calls
    type Error;

    /// Generate one completion for the request
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Trait for read-only document stores
///
/// Implemented by the infrastructure layer (docent-store). The pipeline
/// never writes through this interface.
pub trait DocumentStore {
    /// Error type for store operations
    type Error;

    /// Filtered read with an optional projection and row cap
    ///
    /// An empty filter matches every record. Reading a collection the store
    /// does not have is an error.
    fn find(
        &self,
        collection: &str,
        filter: &Document,
        projection: Option<&Document>,
        limit: Option<u64>,
    ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send;

    /// Run an aggregation pipeline against a collection
    fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Document],
    ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send;
}
