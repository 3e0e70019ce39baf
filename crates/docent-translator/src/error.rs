//! Error types for the Translator

use thiserror::Error;

/// Errors that can occur while turning a question into a descriptor
///
/// No variant carries a partial descriptor: a translation either yields a
/// complete [`QueryDescriptor`](docent_domain::QueryDescriptor) or fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// Question is empty or whitespace
    #[error("Question is empty")]
    EmptyQuestion,

    /// Question exceeds the configured length
    #[error("Question too long: {0} chars (max: {1})")]
    QuestionTooLong(usize, usize),

    /// Language model call failed
    #[error("Error generating query: {0}")]
    Llm(String),

    /// Language model did not answer in time
    #[error("Error generating query: no response within {0}s")]
    Timeout(u64),

    /// Model output is not exactly one query descriptor
    #[error("Error parsing JSON query: {0}")]
    InvalidFormat(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for TranslationError {
    fn from(e: serde_json::Error) -> Self {
        TranslationError::InvalidFormat(e.to_string())
    }
}
