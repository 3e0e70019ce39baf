//! Configuration for the Translator

use crate::TranslationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Translator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Output token bound for the completion
    pub max_tokens: u32,

    /// Sampling temperature; zero keeps the output deterministic
    pub temperature: f32,

    /// Maximum time for a single translation call (seconds)
    pub timeout_secs: u64,

    /// Maximum question length (characters)
    pub max_question_length: usize,

    /// List the schema contract's collections and fields in the prompt
    pub include_schema: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            temperature: 0.0,
            timeout_secs: 60,
            max_question_length: 2_000,
            include_schema: true,
        }
    }
}

impl TranslatorConfig {
    /// Quick preset: short timeout, short questions
    pub fn quick() -> Self {
        Self {
            timeout_secs: 20,
            max_question_length: 500,
            ..Self::default()
        }
    }

    /// Roomy preset: larger output budget for long pipelines, patient timeout
    pub fn roomy() -> Self {
        Self {
            max_tokens: 600,
            timeout_secs: 120,
            max_question_length: 5_000,
            ..Self::default()
        }
    }

    /// Get the call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), TranslationError> {
        if self.max_tokens == 0 {
            return Err(TranslationError::Config("max_tokens must be greater than 0".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(TranslationError::Config(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if self.timeout_secs == 0 {
            return Err(TranslationError::Config("timeout_secs must be greater than 0".into()));
        }
        if self.max_question_length == 0 {
            return Err(TranslationError::Config(
                "max_question_length must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, TranslationError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| TranslationError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, TranslationError> {
        toml::to_string_pretty(self)
            .map_err(|e| TranslationError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
