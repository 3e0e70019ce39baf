//! Completion requests sent to language-model providers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a chat message sent to a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Fixed behavioural instruction
    System,

    /// Prompt content
    User,

    /// Prior model output
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::System => write!(f, "system"),
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in a completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role
    pub role: ChatRole,

    /// Message text
    pub content: String,
}

/// A stateless request for one completion
///
/// Both pipeline stages that talk to a model build one of these; the model
/// sees no session state beyond what the request carries.
///
/// # Examples
///
/// ```
/// use docent_domain::CompletionRequest;
///
/// let request = CompletionRequest::new()
///     .system("You answer questions.")
///     .user("What is 2 + 2?")
///     .with_temperature(0.0)
///     .with_max_tokens(20);
///
/// assert_eq!(request.messages.len(), 2);
/// assert_eq!(request.last_user_message(), Some("What is 2 + 2?"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Messages in order
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature; `None` leaves the provider default
    pub temperature: Option<f32>,

    /// Upper bound on generated tokens
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system message
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: ChatRole::System,
            content: content.into(),
        });
        self
    }

    /// Append a user message
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        });
        self
    }

    /// Pin the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Bound the output length
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Content of the last user message, if any
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
    }

    /// Content of the first system message, if any
    pub fn system_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
    }
}
