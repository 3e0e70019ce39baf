//! Descriptor dispatch against a document store

use crate::{ExecutionError, ExecutorConfig};
use docent_domain::traits::DocumentStore;
use docent_domain::{QueryDescriptor, QueryPlan, ResultSet};
use std::fmt::Display;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Runs exactly one read per descriptor
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    /// Create an executor
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute a descriptor and materialize every returned row
    ///
    /// Dispatch follows [`QueryDescriptor::plan`]: a non-empty pipeline
    /// first, then a projected find, then a plain find. Store faults come
    /// back as [`ExecutionError`]; nothing is retried.
    pub async fn execute<S>(
        &self,
        descriptor: &QueryDescriptor,
        store: &S,
    ) -> Result<ResultSet, ExecutionError>
    where
        S: DocumentStore + Sync,
        S::Error: Display,
    {
        let collection = descriptor.collection.as_str();
        if collection.trim().is_empty() {
            return Err(ExecutionError::EmptyCollection);
        }

        let plan = descriptor.plan();
        debug!(collection, plan = plan.kind(), "Executing descriptor");
        let started = Instant::now();

        let read = async {
            match plan {
                QueryPlan::Aggregate { pipeline } => store.aggregate(collection, pipeline).await,
                QueryPlan::ProjectedFind {
                    filter,
                    projection,
                    limit,
                } => store.find(collection, filter, Some(projection), limit).await,
                QueryPlan::Find { filter, limit } => {
                    store.find(collection, filter, None, limit).await
                }
            }
        };

        let records = timeout(self.config.timeout(), read)
            .await
            .map_err(|_| {
                warn!(collection, "Read timed out after {}s", self.config.timeout_secs);
                ExecutionError::Timeout(self.config.timeout_secs)
            })?
            .map_err(|e| {
                warn!(collection, "Read failed: {}", e);
                ExecutionError::Store(e.to_string())
            })?;

        info!(
            collection,
            plan = plan.kind(),
            rows = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query executed"
        );
        Ok(ResultSet::new(records))
    }
}
