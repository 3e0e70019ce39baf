//! Docent Domain Layer
//!
//! This crate holds the data model shared by every stage of the question
//! answering pipeline, together with the trait seams the infrastructure
//! crates implement.
//!
//! ## Key Concepts
//!
//! - **Schema Contract**: The four sanctioned collections and their fields
//! - **Query Descriptor**: A schema-bound description of one read operation
//! - **Query Plan**: The dispatch decision derived from a descriptor
//! - **Result Set**: Materialized rows returned by one read
//! - **Turn**: One user or assistant entry in a conversation
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - No I/O; providers and stores live in `docent-llm` and `docent-store`
//! - Only serde, serde_json and uuid as external dependencies

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod completion;
pub mod descriptor;
pub mod record;
pub mod schema;
pub mod traits;
pub mod turn;

// Re-exports for convenience
pub use completion::{ChatMessage, ChatRole, CompletionRequest};
pub use descriptor::{Document, QueryDescriptor, QueryPlan};
pub use record::{Record, ResultSet};
pub use schema::{CollectionSchema, SchemaContract};
pub use turn::{Role, SessionId, Turn};
