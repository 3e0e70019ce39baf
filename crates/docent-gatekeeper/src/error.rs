//! Gatekeeper error types

use thiserror::Error;

/// A descriptor stepped outside the schema contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// Collection not named by the contract
    #[error("collection '{collection}' is not part of the schema")]
    UnknownCollection {
        /// Offending collection name
        collection: String,
    },

    /// Field not declared for the collection
    #[error("field '{field}' is not declared for collection '{collection}'")]
    UnknownField {
        /// Collection the field was looked up in
        collection: String,
        /// Offending field path
        field: String,
    },

    /// Stage that writes to the database
    #[error("write stage {stage} is not allowed")]
    WriteStage {
        /// Stage name
        stage: String,
    },

    /// Stage that reads another collection outside the contract
    #[error("stage {stage} reads collection '{collection}', which is not allowed")]
    ForeignCollection {
        /// Stage name
        stage: String,
        /// Collection the stage reads
        collection: String,
    },

    /// Stage the guard has no rules for
    #[error("stage {stage} is not supported")]
    UnsupportedStage {
        /// Stage name
        stage: String,
    },

    /// Pipeline longer than the configured bound
    #[error("pipeline has {stages} stages, the limit is {limit}")]
    PipelineTooLong {
        /// Stages in the pipeline
        stages: usize,
        /// Configured bound
        limit: usize,
    },

    /// Stage whose shape cannot be checked
    #[error("malformed pipeline stage: {0}")]
    MalformedStage(String),
}

/// Errors that can occur while setting up the gatekeeper
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
