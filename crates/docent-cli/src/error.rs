//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Language model provider could not be built
    #[error("LLM provider error: {0}")]
    Llm(#[from] docent_llm::LlmError),

    /// Data store could not be opened
    #[error("Data store error: {0}")]
    Store(#[from] docent_store::StoreError),

    /// Pipeline settings are invalid
    #[error(transparent)]
    Pipeline(#[from] docent_orchestrator::ConfigError),

    /// Question could not be translated
    #[error(transparent)]
    Translation(#[from] docent_translator::TranslationError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Line editor error
    #[error("Line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not permitted
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),
}
