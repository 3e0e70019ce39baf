//! Docent Synthesizer
//!
//! Turns the rows of one query into a natural-language answer with a single
//! language-model call. The model is told to answer from the supplied rows
//! only. Synthesis never fails outward: a failed call comes back as an
//! `Error generating response: ...` message.
//!
//! # Example
//!
//! ```
//! use docent_synthesizer::{Synthesizer, SynthesizerConfig};
//! use docent_domain::ResultSet;
//! use docent_llm::MockProvider;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let synthesizer = Synthesizer::new(MockProvider::new("Nothing matched."), SynthesizerConfig::default());
//! let answer = synthesizer.synthesize(&ResultSet::default(), "Any openings in Tampa?").await;
//! assert_eq!(answer, "Nothing matched.");
//! # });
//! ```

#![warn(missing_docs)]

mod config;
mod synthesizer;

pub use config::SynthesizerConfig;
pub use synthesizer::{SynthesisFailure, Synthesizer, SYSTEM_PROMPT};
