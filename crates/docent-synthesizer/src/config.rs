//! Configuration for the Synthesizer

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    /// Output token bound for the answer
    pub max_tokens: u32,

    /// Sampling temperature (`None` leaves the provider default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum time for a single synthesis call (seconds)
    pub timeout_secs: u64,

    /// Rows serialized into the prompt; the rest are dropped
    pub max_rows: usize,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: None,
            timeout_secs: 60,
            max_rows: 200,
        }
    }
}

impl SynthesizerConfig {
    /// Brief preset: short answers over few rows
    pub fn brief() -> Self {
        Self {
            max_tokens: 80,
            timeout_secs: 30,
            max_rows: 50,
            ..Self::default()
        }
    }

    /// Detailed preset: longer answers over more rows
    pub fn detailed() -> Self {
        Self {
            max_tokens: 500,
            timeout_secs: 120,
            max_rows: 1_000,
            ..Self::default()
        }
    }

    /// Get the call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("temperature must be between 0 and 2, got {}", t));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
