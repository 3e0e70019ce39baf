//! Provider selection and connection settings

use crate::{LlmError, MockProvider, OllamaProvider, OpenAiProvider, Provider};
use serde::{Deserialize, Serialize};

/// Upper bound on `max_retries`
pub const MAX_RETRIES: u32 = 5;

/// Which provider implementation to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions
    #[default]
    OpenAi,
    /// Local Ollama instance
    Ollama,
    /// Canned responses, no network
    Mock,
}

/// Settings for building a [`Provider`]
///
/// # Examples
///
/// ```
/// use docent_llm::{ProviderConfig, ProviderKind};
///
/// let config: ProviderConfig = toml::from_str(r#"
///     kind = "ollama"
///     model = "llama3"
/// "#).unwrap();
///
/// assert_eq!(config.kind, ProviderKind::Ollama);
/// assert_eq!(config.max_retries, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider implementation
    pub kind: ProviderKind,

    /// Model name passed to the provider
    pub model: String,

    /// Base URL; `None` uses the provider's default
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// HTTP timeout per request
    pub timeout_secs: u64,

    /// Extra attempts after a transport failure
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            model: "gpt-4".to_string(),
            endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            max_retries: 1,
        }
    }
}

impl ProviderConfig {
    /// Settings for a mock provider
    pub fn mock() -> Self {
        Self {
            kind: ProviderKind::Mock,
            model: "mock".to_string(),
            ..Self::default()
        }
    }

    /// Check the settings without touching the network
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.model.trim().is_empty() {
            return Err(LlmError::Configuration("model must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(LlmError::Configuration(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(LlmError::Configuration(format!(
                "max_retries must be at most {}, got {}",
                MAX_RETRIES, self.max_retries
            )));
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(LlmError::Configuration(format!(
                    "endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }
        if self.kind == ProviderKind::OpenAi && self.api_key_env.trim().is_empty() {
            return Err(LlmError::Configuration(
                "api_key_env must name an environment variable".into(),
            ));
        }
        Ok(())
    }

    /// Build the configured provider
    ///
    /// The OpenAI key is read from `api_key_env` at this point; a missing key
    /// fails here rather than on the first question.
    pub fn build(&self) -> Result<Provider, LlmError> {
        self.validate()?;

        match self.kind {
            ProviderKind::OpenAi => {
                let api_key = std::env::var(&self.api_key_env).map_err(|_| {
                    LlmError::Authentication(format!(
                        "environment variable {} is not set",
                        self.api_key_env
                    ))
                })?;
                let base_url = self
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| crate::openai::DEFAULT_BASE_URL.to_string());
                let provider = OpenAiProvider::new(base_url, api_key, &self.model, self.timeout_secs)?
                    .with_max_retries(self.max_retries);
                Ok(Provider::OpenAi(provider))
            }
            ProviderKind::Ollama => {
                let endpoint = self
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| crate::ollama::DEFAULT_ENDPOINT.to_string());
                let provider = OllamaProvider::new(endpoint, &self.model, self.timeout_secs)?
                    .with_max_retries(self.max_retries);
                Ok(Provider::Ollama(provider))
            }
            ProviderKind::Mock => Ok(Provider::Mock(MockProvider::default())),
        }
    }
}
