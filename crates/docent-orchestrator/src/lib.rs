//! Docent Orchestrator
//!
//! Sequences one conversational turn through the pipeline and keeps the
//! session history.
//!
//! # Turn lifecycle
//!
//! ```text
//! AwaitingInput → Translating → Validating → Executing → Synthesizing → Rendered
//!                      │             │            │                        ▲
//!                      └─────────────┴────────────┴──── failure ───────────┘
//! ```
//!
//! Every non-empty question appends exactly two turns: the question, then
//! either the synthesized answer or an `Error: ...` message. Nothing is
//! retried at this level, and history is never fed back into translation.
//!
//! # Example
//!
//! ```
//! use docent_orchestrator::{Orchestrator, PipelineConfig};
//! use docent_llm::MockProvider;
//! use docent_store::MemoryStore;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let mut llm = MockProvider::default();
//! llm.add_response("Output only the MongoDB query", r#"{"collection": "careers"}"#);
//! llm.add_response("Based on the following data", "There is one opening.");
//!
//! let store = MemoryStore::from_json(r#"{"careers": [{"position": "Paralegal"}]}"#).unwrap();
//! let mut orchestrator = Orchestrator::new(llm, PipelineConfig::default());
//!
//! let report = orchestrator.submit_question("Any openings?", &store).await.unwrap();
//! assert_eq!(report.reply(), "There is one opening.");
//! assert_eq!(orchestrator.history().len(), 2);
//! # });
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod orchestrator;
mod session;
mod state;

pub use config::PipelineConfig;
pub use error::{ConfigError, TurnFailure};
pub use orchestrator::Orchestrator;
pub use session::Session;
pub use state::{TurnOutcome, TurnReport, TurnState};
