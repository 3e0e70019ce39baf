//! Answer synthesis from result rows

use crate::config::SynthesizerConfig;
use docent_domain::traits::LlmProvider;
use docent_domain::{CompletionRequest, ResultSet};
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

/// System message for synthesis requests
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers user questions based on the provided data.";

const GROUNDING_RULE: &str = "Use only the data above. If it does not contain the answer, say so instead of guessing.";

/// Why a synthesis call produced no answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisFailure {
    /// Language model call failed
    #[error("{0}")]
    Llm(String),

    /// Language model did not answer in time
    #[error("no response within {0}s")]
    Timeout(u64),
}

/// Turns result rows into a natural-language answer
pub struct Synthesizer<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    config: SynthesizerConfig,
}

impl<L> Synthesizer<L>
where
    L: LlmProvider + Send + Sync,
    L::Error: Display,
{
    /// Create a new Synthesizer
    pub fn new(llm_provider: L, config: SynthesizerConfig) -> Self {
        Self::shared(Arc::new(llm_provider), config)
    }

    /// Create a Synthesizer over a provider shared with other stages
    pub fn shared(llm_provider: Arc<L>, config: SynthesizerConfig) -> Self {
        Self {
            llm_provider,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    /// Build the completion request for a result set
    pub fn request_for(&self, results: &ResultSet, question: &str) -> CompletionRequest {
        let shown = results.len().min(self.config.max_rows);
        let data = results.to_compact_json(self.config.max_rows);

        let mut prompt = if shown < results.len() {
            format!(
                "Based on the following data (showing {} of {} records): {}, answer the question: '{}'",
                shown,
                results.len(),
                data,
                question
            )
        } else {
            format!(
                "Based on the following data: {}, answer the question: '{}'",
                data, question
            )
        };
        prompt.push_str("\n\n");
        prompt.push_str(GROUNDING_RULE);

        let request = CompletionRequest::new()
            .system(SYSTEM_PROMPT)
            .user(prompt)
            .with_max_tokens(self.config.max_tokens);
        match self.config.temperature {
            Some(t) => request.with_temperature(t),
            None => request,
        }
    }

    /// Answer the question from the rows
    ///
    /// Never fails: a failed call becomes an explanatory message.
    pub async fn synthesize(&self, results: &ResultSet, question: &str) -> String {
        match self.try_synthesize(results, question).await {
            Ok(answer) => answer,
            Err(failure) => format!("Error generating response: {}", failure),
        }
    }

    /// Answer the question from the rows, reporting failures
    pub async fn try_synthesize(
        &self,
        results: &ResultSet,
        question: &str,
    ) -> Result<String, SynthesisFailure> {
        let request = self.request_for(results, question);
        debug!(rows = results.len(), "Synthesizing answer");

        let answer = match timeout(self.config.timeout(), self.llm_provider.complete(&request)).await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!("Synthesis failed: {}", e);
                return Err(SynthesisFailure::Llm(e.to_string()));
            }
            Err(_) => {
                warn!("Synthesis timed out after {}s", self.config.timeout_secs);
                return Err(SynthesisFailure::Timeout(self.config.timeout_secs));
            }
        };

        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_domain::{ChatRole, Record};
    use docent_llm::MockProvider;
    use serde_json::json;

    fn rows(values: serde_json::Value) -> ResultSet {
        let records: Vec<Record> = values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        ResultSet::new(records)
    }

    #[tokio::test]
    async fn test_synthesize_returns_model_text() {
        let llm = MockProvider::new("  Jane Doe is the founding partner.\n");
        let synthesizer = Synthesizer::new(llm, SynthesizerConfig::default());

        let answer = synthesizer
            .synthesize(&rows(json!([{"name": "Jane Doe"}])), "Who founded FirmX?")
            .await;
        assert_eq!(answer, "Jane Doe is the founding partner.");
    }

    #[tokio::test]
    async fn test_prompt_contains_rows_and_question() {
        let llm = MockProvider::new("ok");
        let synthesizer = Synthesizer::new(llm.clone(), SynthesizerConfig::default());
        synthesizer
            .synthesize(&rows(json!([{"name": "Jane Doe"}])), "Who founded FirmX?")
            .await;

        let request = &llm.requests()[0];
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(request.max_tokens, Some(150));
        assert_eq!(request.temperature, None);

        let prompt = request.last_user_message().unwrap();
        assert!(prompt.starts_with(
            r#"Based on the following data: [{"name":"Jane Doe"}], answer the question: 'Who founded FirmX?'"#
        ));
        assert!(prompt.ends_with(GROUNDING_RULE));
    }

    #[tokio::test]
    async fn test_empty_results_still_narrated() {
        let llm = MockProvider::new("No matching records were found.");
        let synthesizer = Synthesizer::new(llm.clone(), SynthesizerConfig::default());

        let answer = synthesizer.synthesize(&ResultSet::default(), "Any openings?").await;
        assert_eq!(answer, "No matching records were found.");
        assert!(llm.requests()[0]
            .last_user_message()
            .unwrap()
            .contains("Based on the following data: [],"));
    }

    #[tokio::test]
    async fn test_rows_beyond_limit_are_dropped() {
        let llm = MockProvider::new("ok");
        let config = SynthesizerConfig {
            max_rows: 2,
            ..SynthesizerConfig::default()
        };
        let synthesizer = Synthesizer::new(llm.clone(), config);
        let results = rows(json!([{"n": 1}, {"n": 2}, {"n": 3}]));
        synthesizer.synthesize(&results, "Count?").await;

        let prompt = llm.requests()[0].last_user_message().unwrap().to_string();
        assert!(prompt.contains("(showing 2 of 3 records): [{\"n\":1},{\"n\":2}],"));
    }

    #[tokio::test]
    async fn test_failure_becomes_text() {
        let llm = MockProvider::default();
        llm.push_error();
        let synthesizer = Synthesizer::new(llm, SynthesizerConfig::default());

        let answer = synthesizer.synthesize(&ResultSet::default(), "Anything?").await;
        assert!(answer.starts_with("Error generating response: "));
        assert!(answer.contains("Mock error"));
    }

    #[tokio::test]
    async fn test_configured_temperature_is_sent() {
        let llm = MockProvider::new("ok");
        let config = SynthesizerConfig {
            temperature: Some(0.3),
            ..SynthesizerConfig::default()
        };
        Synthesizer::new(llm.clone(), config)
            .synthesize(&ResultSet::default(), "q")
            .await;
        assert_eq!(llm.requests()[0].temperature, Some(0.3));
    }
}
