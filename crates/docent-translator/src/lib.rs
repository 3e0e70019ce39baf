//! Docent Translator
//!
//! Converts a natural-language question into a schema-bound query descriptor
//! using a language model primed with worked examples.
//!
//! # Overview
//!
//! The Translator is the first stage of every turn. It sends one completion
//! request made of a fixed instruction, the schema contract, the exemplar
//! set and the JSON-quoted question, then decodes the reply strictly into a
//! single [`QueryDescriptor`](docent_domain::QueryDescriptor).
//!
//! # Architecture
//!
//! ```text
//! Question → Translator → LLM → Descriptor → Gatekeeper → Executor
//! ```
//!
//! # Example Usage
//!
//! ```
//! use docent_translator::{Translator, TranslatorConfig};
//! use docent_llm::MockProvider;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let llm = MockProvider::new(r#"{"collection": "careers", "query": {}}"#);
//! let translator = Translator::new(llm, TranslatorConfig::default());
//!
//! let descriptor = translator.translate("What positions are open?").await.unwrap();
//! assert_eq!(descriptor.collection, "careers");
//! # });
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod exemplars;
mod parser;
mod prompt;
mod translator;


pub use config::TranslatorConfig;
pub use error::TranslationError;
pub use exemplars::{exemplars, Exemplar};
pub use parser::parse_llm_response;
pub use prompt::{PromptBuilder, OUTPUT_INSTRUCTION, SYSTEM_PROMPT};
pub use translator::Translator;
