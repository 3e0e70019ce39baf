//! Turn lifecycle

use crate::TurnFailure;
use docent_domain::QueryDescriptor;
use std::fmt;
use std::time::Duration;

/// Where a turn is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnState {
    /// Waiting for the next question
    AwaitingInput,
    /// Asking the model for a descriptor
    Translating,
    /// Checking the descriptor against the contract
    Validating,
    /// Reading from the store
    Executing,
    /// Asking the model for an answer
    Synthesizing,
    /// Reply decided and recorded
    Rendered,
}

impl TurnState {
    /// Lowercase name, for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnState::AwaitingInput => "awaiting_input",
            TurnState::Translating => "translating",
            TurnState::Validating => "validating",
            TurnState::Executing => "executing",
            TurnState::Synthesizing => "synthesizing",
            TurnState::Rendered => "rendered",
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Synthesized answer (possibly a synthesis error message)
    Answered(String),
    /// Translation, validation or execution failed
    Failed(TurnFailure),
}

impl TurnOutcome {
    /// Text recorded as the assistant turn
    pub fn reply(&self) -> String {
        match self {
            TurnOutcome::Answered(answer) => answer.clone(),
            TurnOutcome::Failed(failure) => format!("Error: {}", failure),
        }
    }

    /// Whether the turn produced an answer
    pub fn is_answered(&self) -> bool {
        matches!(self, TurnOutcome::Answered(_))
    }
}

/// Everything a front end may want to show about one turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    /// Question exactly as submitted
    pub question: String,

    /// States entered, in order
    pub states: Vec<TurnState>,

    /// Descriptor produced by translation, if any
    pub descriptor: Option<QueryDescriptor>,

    /// Rows returned, if the read ran
    pub rows: Option<usize>,

    /// How the turn ended
    pub outcome: TurnOutcome,

    /// Wall time for the whole turn
    pub elapsed: Duration,
}

impl TurnReport {
    /// Text recorded as the assistant turn
    pub fn reply(&self) -> String {
        self.outcome.reply()
    }
}
