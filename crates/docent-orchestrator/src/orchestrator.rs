//! Per-turn pipeline sequencing

use crate::{PipelineConfig, Session, TurnFailure, TurnOutcome, TurnReport, TurnState};
use docent_domain::traits::{DocumentStore, LlmProvider};
use docent_domain::{QueryDescriptor, SchemaContract, Turn};
use docent_executor::Executor;
use docent_gatekeeper::ContractGuard;
use docent_synthesizer::Synthesizer;
use docent_translator::Translator;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Runs one question at a time through translate, validate, execute and
/// synthesize, and keeps the session history
pub struct Orchestrator<L>
where
    L: LlmProvider,
{
    translator: Translator<L>,
    guard: ContractGuard,
    executor: Executor,
    synthesizer: Synthesizer<L>,
    session: Session,
    state: TurnState,
}

/// Stage output carried into the turn report
struct Progress {
    states: Vec<TurnState>,
    descriptor: Option<QueryDescriptor>,
    rows: Option<usize>,
}

impl<L> Orchestrator<L>
where
    L: LlmProvider + Send + Sync,
    L::Error: Display,
{
    /// Build every stage from one provider and one configuration
    pub fn new(llm_provider: L, config: PipelineConfig) -> Self {
        let llm = Arc::new(llm_provider);
        Self::from_parts(
            Translator::shared(Arc::clone(&llm), config.translator),
            ContractGuard::new(SchemaContract::standard(), config.guard),
            Executor::new(config.executor),
            Synthesizer::shared(llm, config.synthesizer),
            Session::with_max_turns(config.max_history_turns),
        )
    }

    /// Assemble from ready-made stages
    pub fn from_parts(
        translator: Translator<L>,
        guard: ContractGuard,
        executor: Executor,
        synthesizer: Synthesizer<L>,
        session: Session,
    ) -> Self {
        Self {
            translator,
            guard,
            executor,
            synthesizer,
            session,
            state: TurnState::AwaitingInput,
        }
    }

    /// Current session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// History in submission order
    pub fn history(&self) -> &[Turn] {
        self.session.turns()
    }

    /// Current state; `AwaitingInput` between turns
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Translation stage
    pub fn translator(&self) -> &Translator<L> {
        &self.translator
    }

    /// Contract guard stage
    pub fn guard(&self) -> &ContractGuard {
        &self.guard
    }

    /// Discard the history and start a new session with the same cap
    pub fn reset(&mut self) {
        self.session = Session::with_max_turns(self.session.max_turns());
        self.state = TurnState::AwaitingInput;
        info!(session = %self.session.id(), "Session reset");
    }

    /// Run one question through the pipeline
    ///
    /// Returns `None` for a blank question; nothing is recorded or called
    /// in that case. Otherwise exactly one user turn and one assistant turn
    /// are appended, whatever happens along the way. The user turn keeps
    /// the question exactly as typed.
    pub async fn submit_question<S>(&mut self, question: &str, store: &S) -> Option<TurnReport>
    where
        S: DocumentStore + Sync,
        S::Error: Display,
    {
        if question.trim().is_empty() {
            debug!("Ignoring empty question");
            return None;
        }

        let span = info_span!("turn", session = %self.session.id());
        Some(self.run_turn(question, store).instrument(span).await)
    }

    async fn run_turn<S>(&mut self, question: &str, store: &S) -> TurnReport
    where
        S: DocumentStore + Sync,
        S::Error: Display,
    {
        let started = Instant::now();
        let mut progress = Progress {
            states: Vec::new(),
            descriptor: None,
            rows: None,
        };

        let outcome = match self.run_stages(question, store, &mut progress).await {
            Ok(answer) => TurnOutcome::Answered(answer),
            Err(failure) => {
                warn!(stage = failure.stage(), "Turn failed: {}", failure);
                TurnOutcome::Failed(failure)
            }
        };

        self.enter(TurnState::Rendered, &mut progress);
        self.session.record_exchange(question, outcome.reply());
        self.state = TurnState::AwaitingInput;

        let report = TurnReport {
            question: question.to_string(),
            states: progress.states,
            descriptor: progress.descriptor,
            rows: progress.rows,
            outcome,
            elapsed: started.elapsed(),
        };
        info!(
            answered = report.outcome.is_answered(),
            rows = report.rows,
            history = self.session.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Turn complete"
        );
        report
    }

    async fn run_stages<S>(
        &mut self,
        question: &str,
        store: &S,
        progress: &mut Progress,
    ) -> Result<String, TurnFailure>
    where
        S: DocumentStore + Sync,
        S::Error: Display,
    {
        self.enter(TurnState::Translating, progress);
        let descriptor = self.translator.translate(question).await?;
        progress.descriptor = Some(descriptor.clone());

        self.enter(TurnState::Validating, progress);
        self.guard.check(&descriptor)?;

        self.enter(TurnState::Executing, progress);
        let rows = self.executor.execute(&descriptor, store).await?;
        progress.rows = Some(rows.len());

        self.enter(TurnState::Synthesizing, progress);
        Ok(self.synthesizer.synthesize(&rows, question).await)
    }

    fn enter(&mut self, state: TurnState, progress: &mut Progress) {
        debug!(from = %self.state, to = %state, "Turn state");
        self.state = state;
        progress.states.push(state);
    }
}
