//! Error types for the Executor

use thiserror::Error;

/// A read that could not be carried out
///
/// The store's own message is kept verbatim so it can be shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Descriptor names no collection
    #[error("collection name is empty")]
    EmptyCollection,

    /// Store rejected or failed the read
    #[error("{0}")]
    Store(String),

    /// Store did not answer in time
    #[error("query did not complete within {0}s")]
    Timeout(u64),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
