//! Error types for the Orchestrator

use docent_executor::ExecutionError;
use docent_gatekeeper::ContractViolation;
use docent_translator::TranslationError;
use thiserror::Error;

/// Why a turn ended without an answer
///
/// Failures are terminal for the turn only; the session stays usable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TurnFailure {
    /// Question could not be turned into a descriptor
    #[error(transparent)]
    Translation(#[from] TranslationError),

    /// Descriptor stepped outside the schema contract
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    /// Store rejected or failed the read
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl TurnFailure {
    /// Stage that failed, for logs
    pub fn stage(&self) -> &'static str {
        match self {
            TurnFailure::Translation(_) => "translation",
            TurnFailure::Contract(_) => "validation",
            TurnFailure::Execution(_) => "execution",
        }
    }
}

/// Errors in pipeline configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A section holds an impossible value
    #[error("Invalid {section} configuration: {message}")]
    Invalid {
        /// Section name
        section: &'static str,
        /// What is wrong
        message: String,
    },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
