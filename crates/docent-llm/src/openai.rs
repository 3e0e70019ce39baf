//! OpenAI-compatible chat completions provider
//!
//! Works with any endpoint that speaks the `/chat/completions` protocol.
//!
//! # Examples
//!
//! ```no_run
//! use docent_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new(
//!     "https://api.openai.com/v1",
//!     std::env::var("OPENAI_API_KEY").unwrap(),
//!     "gpt-4",
//!     60,
//! ).unwrap();
//! ```

use crate::retry::with_retries;
use crate::LlmError;
use docent_domain::traits::LlmProvider as LlmProviderTrait;
use docent_domain::{ChatMessage, CompletionRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Delay before the first retry
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Provider for OpenAI-compatible APIs
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Configuration` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
            max_retries: 1,
        })
    }

    /// Set the number of retries after a transport failure
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Model name
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_once(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &self.model, text));
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No content in response".to_string()))?;

        Ok(content.trim().to_string())
    }
}

fn classify_status(status: u16, model: &str, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::Authentication(body),
        404 => LlmError::ModelNotAvailable(model.to_string()),
        429 => LlmError::RateLimitExceeded,
        500..=599 => LlmError::Communication(format!("HTTP {}: {}", status, body)),
        _ => LlmError::Other(format!("HTTP {}: {}", status, body)),
    }
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl LlmProviderTrait for OpenAiProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        debug!(model = %self.model, messages = request.messages.len(), "OpenAI completion");
        with_retries(self.max_retries, RETRY_BASE_DELAY, || self.send_once(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = OpenAiProvider::new("https://api.openai.com/v1/", "k", "gpt-4", 10).unwrap();
        assert_eq!(provider.base_url, "https://api.openai.com/v1");
        assert_eq!(provider.model(), "gpt-4");
        assert_eq!(provider.max_retries, 1);
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = OpenAiProvider::new(DEFAULT_BASE_URL, "sk-secret", "gpt-4", 10).unwrap();
        let text = format!("{:?}", provider);
        assert!(!text.contains("sk-secret"));
        assert!(text.contains("<redacted>"));
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(classify_status(401, "m", String::new()), LlmError::Authentication(_)));
        assert!(matches!(classify_status(404, "m", String::new()), LlmError::ModelNotAvailable(_)));
        assert!(matches!(classify_status(429, "m", String::new()), LlmError::RateLimitExceeded));
        assert!(classify_status(503, "m", String::new()).is_retryable());
        assert!(!classify_status(400, "m", String::new()).is_retryable());
    }

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest::new()
            .system("sys")
            .user("hi")
            .with_max_tokens(200);
        let body = ChatCompletionRequest {
            model: "gpt-4",
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 200);
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let data: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":" hi "}}]}"#,
        )
        .unwrap();
        assert_eq!(data.choices[0].message.content.as_deref(), Some(" hi "));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let provider = OpenAiProvider::new("http://127.0.0.1:9", "k", "gpt-4", 2)
            .unwrap()
            .with_max_retries(0);
        let request = CompletionRequest::new().user("test");
        let result = provider.complete(&request).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
