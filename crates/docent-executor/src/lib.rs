//! Docent Executor
//!
//! Runs a [`QueryDescriptor`](docent_domain::QueryDescriptor) against any
//! [`DocumentStore`](docent_domain::traits::DocumentStore) as exactly one
//! read operation.
//!
//! # Example
//!
//! ```
//! use docent_executor::{Executor, ExecutorConfig};
//! use docent_domain::QueryDescriptor;
//! use docent_store::MemoryStore;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let store = MemoryStore::from_json(r#"{"careers": [{"position": "Paralegal"}]}"#).unwrap();
//! let executor = Executor::new(ExecutorConfig::default());
//!
//! let rows = executor.execute(&QueryDescriptor::new("careers"), &store).await.unwrap();
//! assert_eq!(rows.len(), 1);
//! # });
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod executor;

pub use config::ExecutorConfig;
pub use error::ExecutionError;
pub use executor::Executor;
