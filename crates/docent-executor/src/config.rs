//! Configuration for the Executor

use crate::ExecutionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum time for a single read (seconds)
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl ExecutorConfig {
    /// Short timeout for local fixtures
    pub fn local() -> Self {
        Self { timeout_secs: 5 }
    }

    /// Get the read timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExecutionError> {
        if self.timeout_secs == 0 {
            return Err(ExecutionError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExecutionError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ExecutionError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExecutionError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExecutionError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        assert_eq!(ExecutorConfig::default().timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(ExecutorConfig::from_toml("timeout_secs = 0").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExecutorConfig::local();
        let parsed = ExecutorConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
