//! Whole-pipeline configuration

use crate::ConfigError;
use docent_executor::ExecutorConfig;
use docent_gatekeeper::GuardConfig;
use docent_synthesizer::SynthesizerConfig;
use docent_translator::TranslatorConfig;
use serde::{Deserialize, Serialize};

/// Settings for every stage of a turn
///
/// ```toml
/// max_history_turns = 40
///
/// [translator]
/// max_tokens = 200
///
/// [guard]
/// check_fields = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Retained history entries; oldest exchanges are evicted beyond this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_history_turns: Option<usize>,

    /// Query translation
    pub translator: TranslatorConfig,

    /// Contract checks
    pub guard: GuardConfig,

    /// Query execution
    pub executor: ExecutorConfig,

    /// Answer synthesis
    pub synthesizer: SynthesizerConfig,
}

impl PipelineConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max) = self.max_history_turns {
            if max < 2 {
                return Err(ConfigError::Invalid {
                    section: "session",
                    message: "max_history_turns must keep at least one exchange (2 turns)".into(),
                });
            }
        }
        self.translator.validate().map_err(|e| ConfigError::Invalid {
            section: "translator",
            message: e.to_string(),
        })?;
        self.guard.validate().map_err(|e| ConfigError::Invalid {
            section: "guard",
            message: e.to_string(),
        })?;
        self.executor.validate().map_err(|e| ConfigError::Invalid {
            section: "executor",
            message: e.to_string(),
        })?;
        self.synthesizer
            .validate()
            .map_err(|message| ConfigError::Invalid {
                section: "synthesizer",
                message,
            })?;
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
