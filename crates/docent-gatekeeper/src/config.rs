//! Gatekeeper configuration

use crate::GatekeeperError;
use serde::{Deserialize, Serialize};

/// Configuration for contract checks
///
/// Collection checks and write-stage checks are always on; the flags here
/// only control the finer-grained rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Reject field names the contract does not declare
    pub check_fields: bool,

    /// Allow `$lookup`, `$graphLookup` and `$unionWith` into other
    /// contract collections
    pub allow_cross_collection: bool,

    /// Upper bound on aggregation stages (`None` for no bound)
    pub max_pipeline_stages: Option<usize>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            check_fields: true,
            allow_cross_collection: true,
            max_pipeline_stages: Some(20),
        }
    }
}

impl GuardConfig {
    /// Create a permissive configuration (collection checks only)
    pub fn permissive() -> Self {
        Self {
            check_fields: false,
            ..Self::default()
        }
    }

    /// Create a strict configuration (single-collection, short pipelines)
    pub fn strict() -> Self {
        Self {
            check_fields: true,
            allow_cross_collection: false,
            max_pipeline_stages: Some(8),
        }
    }

    /// Check the configuration for impossible values
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        if self.max_pipeline_stages == Some(0) {
            return Err(GatekeeperError::Config(
                "max_pipeline_stages must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    /// Parse from TOML
    pub fn from_toml(text: &str) -> Result<Self, GatekeeperError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, GatekeeperError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
