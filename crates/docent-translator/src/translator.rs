//! Core Translator implementation

use crate::config::TranslatorConfig;
use crate::error::TranslationError;
use crate::exemplars::{exemplars, Exemplar};
use crate::parser::parse_llm_response;
use crate::prompt::{PromptBuilder, SYSTEM_PROMPT};
use docent_domain::traits::LlmProvider;
use docent_domain::{CompletionRequest, QueryDescriptor, SchemaContract};
use std::fmt::Display;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The Translator turns a natural-language question into a query descriptor
pub struct Translator<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    contract: &'static SchemaContract,
    exemplars: &'static [Exemplar],
    config: TranslatorConfig,
}

impl<L> Translator<L>
where
    L: LlmProvider + Send + Sync,
    L::Error: Display,
{
    /// Create a new Translator over the standard schema and exemplars
    pub fn new(llm_provider: L, config: TranslatorConfig) -> Self {
        Self::shared(Arc::new(llm_provider), config)
    }

    /// Create a Translator over a provider shared with other stages
    pub fn shared(llm_provider: Arc<L>, config: TranslatorConfig) -> Self {
        Self {
            llm_provider,
            contract: SchemaContract::standard(),
            exemplars: exemplars(),
            config,
        }
    }

    /// Replace the schema contract described in the prompt
    pub fn with_contract(mut self, contract: &'static SchemaContract) -> Self {
        self.contract = contract;
        self
    }

    /// Replace the worked examples
    pub fn with_exemplars(mut self, exemplars: &'static [Exemplar]) -> Self {
        self.exemplars = exemplars;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Build the completion request for a question
    pub fn request_for(&self, question: &str) -> CompletionRequest {
        let mut builder = PromptBuilder::new(question).with_exemplars(self.exemplars);
        if self.config.include_schema {
            builder = builder.with_schema(self.contract);
        }

        CompletionRequest::new()
            .system(SYSTEM_PROMPT)
            .user(builder.build())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens)
    }

    /// Translate a question into exactly one descriptor
    ///
    /// Makes one model call. Blank or oversized questions fail without one.
    pub async fn translate(&self, question: &str) -> Result<QueryDescriptor, TranslationError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TranslationError::EmptyQuestion);
        }
        let length = question.chars().count();
        if length > self.config.max_question_length {
            return Err(TranslationError::QuestionTooLong(
                length,
                self.config.max_question_length,
            ));
        }

        info!("Translating question ({} chars)", length);

        let request = self.request_for(question);
        debug!(
            "Prompt length: {} chars",
            request.last_user_message().map(str::len).unwrap_or_default()
        );

        let response = timeout(self.config.timeout(), self.llm_provider.complete(&request))
            .await
            .map_err(|_| {
                warn!("Translation timed out after {}s", self.config.timeout_secs);
                TranslationError::Timeout(self.config.timeout_secs)
            })?
            .map_err(|e| {
                warn!("Translation call failed: {}", e);
                TranslationError::Llm(e.to_string())
            })?;

        debug!("LLM response length: {} chars", response.len());

        let descriptor = parse_llm_response(&response).inspect_err(|e| {
            warn!("Unusable translation output: {}", e);
        })?;

        info!(
            collection = %descriptor.collection,
            plan = descriptor.plan().kind(),
            "Translation complete"
        );
        Ok(descriptor)
    }
}
