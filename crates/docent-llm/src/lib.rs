//! Docent LLM Provider Layer
//!
//! Pluggable language-model provider implementations.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from `docent-domain`.
//! Every provider takes a stateless `CompletionRequest` and returns the raw text
//! of one completion. Transport retries and timeouts live here, at the call
//! boundary, so the pipeline above never retries anything itself.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible chat completions API
//! - `OllamaProvider`: Local Ollama chat API
//! - `Provider`: Runtime-selected wrapper built from a `ProviderConfig`
//!
//! # Examples
//!
//! ```
//! use docent_llm::MockProvider;
//! use docent_domain::{CompletionRequest, traits::LlmProvider};
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let request = CompletionRequest::new().user("test prompt");
//! let result = provider.complete(&request).await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # });
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ollama;
pub mod openai;
mod retry;

use docent_domain::traits::LlmProvider as LlmProviderTrait;
use docent_domain::CompletionRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use config::{ProviderConfig, ProviderKind, MAX_RETRIES};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Credentials missing or rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Provider could not be constructed from its settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether a failed call is worth repeating
    ///
    /// Only transport-level failures qualify; a rejected request fails the
    /// same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Communication(_) | LlmError::RateLimitExceeded)
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<(String, MockReply)>,
    script: VecDeque<MockReply>,
    requests: Vec<CompletionRequest>,
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network calls.
/// Replies are chosen in this order:
///
/// 1. The first rule whose fragment occurs in the request's last user message
/// 2. The next scripted reply, if any remain
/// 3. The default response
///
/// # Examples
///
/// ```
/// use docent_llm::MockProvider;
/// use docent_domain::{CompletionRequest, traits::LlmProvider};
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let mut provider = MockProvider::default();
/// provider.add_response("founding partners", r#"{"collection": "teams"}"#);
///
/// let request = CompletionRequest::new().user("Who are the founding partners?");
/// assert_eq!(provider.complete(&request).await.unwrap(), r#"{"collection": "teams"}"#);
///
/// let other = CompletionRequest::new().user("Anything else");
/// assert_eq!(provider.complete(&other).await.unwrap(), "Default mock response");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a MockProvider that replies with `responses` in order
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::default();
        {
            let mut state = provider.lock();
            state
                .script
                .extend(responses.into_iter().map(|r| MockReply::Text(r.into())));
        }
        provider
    }

    /// Reply with `response` whenever the user message contains `fragment`
    pub fn add_response(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        self.lock()
            .rules
            .push((fragment.into(), MockReply::Text(response.into())));
    }

    /// Fail whenever the user message contains `fragment`
    pub fn add_error(&mut self, fragment: impl Into<String>) {
        self.lock().rules.push((fragment.into(), MockReply::Error));
    }

    /// Queue a scripted failure
    pub fn push_error(&self) {
        self.lock().script.push_back(MockReply::Error);
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Reset the recorded calls
    pub fn reset_call_count(&self) {
        self.lock().requests.clear();
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned mock only means another test thread panicked mid-call.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reply_for(&self, request: &CompletionRequest) -> MockReply {
        let mut state = self.lock();
        state.requests.push(request.clone());

        let prompt = request.last_user_message().unwrap_or_default();
        if let Some((_, reply)) = state.rules.iter().find(|(f, _)| prompt.contains(f.as_str())) {
            return reply.clone();
        }

        state
            .script
            .pop_front()
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        match self.reply_for(request) {
            MockReply::Text(text) => Ok(text),
            MockReply::Error => Err(LlmError::Other("Mock error".to_string())),
        }
    }
}

/// A provider selected at runtime from configuration
#[derive(Debug)]
pub enum Provider {
    /// OpenAI-compatible endpoint
    OpenAi(OpenAiProvider),
    /// Local Ollama endpoint
    Ollama(OllamaProvider),
    /// Canned responses
    Mock(MockProvider),
}

impl LlmProviderTrait for Provider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        match self {
            Provider::OpenAi(p) => p.complete(request).await,
            Provider::Ollama(p) => p.complete(request).await,
            Provider::Mock(p) => p.complete(request).await,
        }
    }
}
