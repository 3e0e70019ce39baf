//! End-to-end turns over the mock provider and the in-memory store

use docent_domain::traits::DocumentStore;
use docent_domain::{Document, Record, Role};
use docent_executor::ExecutionError;
use docent_gatekeeper::ContractViolation;
use docent_llm::MockProvider;
use docent_orchestrator::{
    Orchestrator, PipelineConfig, TurnFailure, TurnOutcome, TurnState,
};
use docent_store::{MemoryStore, StoreError};
use docent_translator::TranslationError;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

const SYNTHESIS_MARKER: &str = "Based on the following data";

/// Memory store that counts reads
struct CountingStore {
    inner: MemoryStore,
    reads: AtomicUsize,
}

impl CountingStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl DocumentStore for CountingStore {
    type Error = StoreError;

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        projection: Option<&Document>,
        limit: Option<u64>,
    ) -> Result<Vec<Record>, Self::Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find(collection, filter, projection, limit).await
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Document],
    ) -> Result<Vec<Record>, Self::Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.aggregate(collection, pipeline).await
    }
}

fn teams_store(members: Value) -> MemoryStore {
    MemoryStore::from_json(&json!({ "teams": members }).to_string()).unwrap()
}

/// Mock that answers `question` with `descriptor` and every synthesis with `answer`
fn mock(question: &str, descriptor: &str, answer: &str) -> MockProvider {
    let mut llm = MockProvider::default();
    llm.add_response(format!("Question: {}", json!(question)), descriptor);
    llm.add_response(SYNTHESIS_MARKER, answer);
    llm
}

/// Rows the synthesizer was shown in the most recent synthesis request
fn synthesized_rows(llm: &MockProvider) -> Value {
    let requests = llm.requests();
    let prompt = requests
        .iter()
        .rev()
        .filter_map(|r| r.last_user_message())
        .find(|p| p.starts_with(SYNTHESIS_MARKER))
        .unwrap();
    let data = prompt
        .strip_prefix("Based on the following data: ")
        .and_then(|rest| rest.split_once(", answer the question:"))
        .map(|(data, _)| data)
        .unwrap();
    serde_json::from_str(data).unwrap()
}

#[tokio::test]
async fn test_founding_partner_round_trip() {
    let question = "Who are founding partners for FirmX?";
    let llm = mock(
        question,
        r#"{
            "collection": "teams",
            "query": { "position": { "$regex": "Founding Partner", "$options": "i" } },
            "projection": { "name": 1, "_id": 0 }
        }"#,
        "Jane Doe is the founding partner of FirmX.",
    );
    let store = teams_store(json!([
        {"position": "Founding Partner", "firm": "FirmX", "name": "Jane Doe"},
        {"position": "Associate", "firm": "FirmX", "name": "John Roe"}
    ]));
    let mut orchestrator = Orchestrator::new(llm.clone(), PipelineConfig::default());

    let report = orchestrator.submit_question(question, &store).await.unwrap();

    let descriptor = report.descriptor.as_ref().unwrap();
    assert_eq!(descriptor.collection, "teams");
    assert_eq!(
        descriptor.filter["position"],
        json!({"$regex": "Founding Partner", "$options": "i"})
    );
    assert_eq!(report.rows, Some(1));
    assert_eq!(synthesized_rows(&llm), json!([{"name": "Jane Doe"}]));
    assert_eq!(
        report.states,
        vec![
            TurnState::Translating,
            TurnState::Validating,
            TurnState::Executing,
            TurnState::Synthesizing,
            TurnState::Rendered,
        ]
    );
    assert_eq!(
        report.outcome,
        TurnOutcome::Answered("Jane Doe is the founding partner of FirmX.".into())
    );
    assert_eq!(orchestrator.state(), TurnState::AwaitingInput);

    let history = orchestrator.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, question);
    assert_eq!(history[1].content, "Jane Doe is the founding partner of FirmX.");
}

#[tokio::test]
async fn test_members_per_firm_aggregation() {
    let question = "How many team members are there in total for each firm?";
    let llm = mock(
        question,
        r#"{
            "collection": "teams",
            "query": {},
            "aggregation": [
                { "$group": { "_id": "$firm", "total_members": { "$sum": 1 } } }
            ]
        }"#,
        "FirmA has 2 members and FirmB has 1.",
    );
    let store = teams_store(json!([
        {"name": "A1", "firm": "FirmA"},
        {"name": "B1", "firm": "FirmB"},
        {"name": "A2", "firm": "FirmA"}
    ]));
    let mut orchestrator = Orchestrator::new(llm.clone(), PipelineConfig::default());

    let report = orchestrator.submit_question(question, &store).await.unwrap();
    assert_eq!(report.rows, Some(2));

    let rows: HashSet<String> = synthesized_rows(&llm)
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row.to_string())
        .collect();
    let expected: HashSet<String> = [
        json!({"_id": "FirmA", "total_members": 2}),
        json!({"_id": "FirmB", "total_members": 1}),
    ]
    .iter()
    .map(|row| row.to_string())
    .collect();
    assert_eq!(rows, expected);
}

#[tokio::test]
async fn test_missing_collection_becomes_error_turn() {
    let question = "What positions are open?";
    let llm = mock(question, r#"{"collection": "careers", "query": {}}"#, "unused");
    let store = teams_store(json!([]));
    let mut orchestrator = Orchestrator::new(llm.clone(), PipelineConfig::default());

    let report = orchestrator.submit_question(question, &store).await.unwrap();

    assert_eq!(
        report.outcome,
        TurnOutcome::Failed(TurnFailure::Execution(ExecutionError::Store(
            "Collection not found: careers".into()
        )))
    );
    assert_eq!(report.rows, None);
    assert_eq!(orchestrator.history().len(), 2);
    assert_eq!(
        orchestrator.history()[1].content,
        "Error: Collection not found: careers"
    );
    // Translation only; synthesis never ran
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_translation_failure_skips_store() {
    let question = "Tell me a joke";
    let llm = mock(question, "Why did the lawyer cross the road?", "unused");
    let store = CountingStore::new(teams_store(json!([{"name": "Jane Doe"}])));
    let mut orchestrator = Orchestrator::new(llm.clone(), PipelineConfig::default());

    let report = orchestrator.submit_question(question, &store).await.unwrap();

    assert!(matches!(
        report.outcome,
        TurnOutcome::Failed(TurnFailure::Translation(TranslationError::InvalidFormat(_)))
    ));
    assert_eq!(report.states, vec![TurnState::Translating, TurnState::Rendered]);
    assert!(report.descriptor.is_none());
    assert_eq!(store.reads(), 0);
    assert_eq!(llm.call_count(), 1);

    let history = orchestrator.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::Assistant);
    assert!(history[1].content.starts_with("Error: "));
}

#[tokio::test]
async fn test_out_of_contract_descriptor_never_reaches_store() {
    let question = "List every user";
    let llm = mock(question, r#"{"collection": "users", "query": {}}"#, "unused");
    let store = CountingStore::new(teams_store(json!([])));
    let mut orchestrator = Orchestrator::new(llm, PipelineConfig::default());

    let report = orchestrator.submit_question(question, &store).await.unwrap();

    assert_eq!(
        report.outcome,
        TurnOutcome::Failed(TurnFailure::Contract(ContractViolation::UnknownCollection {
            collection: "users".into()
        }))
    );
    assert_eq!(
        report.states,
        vec![TurnState::Translating, TurnState::Validating, TurnState::Rendered]
    );
    assert!(report.descriptor.is_some());
    assert_eq!(store.reads(), 0);
    assert!(orchestrator.history()[1]
        .content
        .starts_with("Error: collection 'users'"));
}

#[tokio::test]
async fn test_write_stage_rejected() {
    let question = "Copy the team";
    let llm = mock(
        question,
        r#"{"collection": "teams", "aggregation": [{"$out": "backup"}]}"#,
        "unused",
    );
    let store = CountingStore::new(teams_store(json!([])));
    let mut orchestrator = Orchestrator::new(llm, PipelineConfig::default());

    let report = orchestrator.submit_question(question, &store).await.unwrap();
    assert!(matches!(
        report.outcome,
        TurnOutcome::Failed(TurnFailure::Contract(ContractViolation::WriteStage { .. }))
    ));
    assert_eq!(store.reads(), 0);
}

#[tokio::test]
async fn test_synthesis_failure_is_still_an_answer() {
    let question = "Who is here?";
    let mut llm = MockProvider::default();
    llm.add_response(format!("Question: {}", json!(question)), r#"{"collection": "teams"}"#);
    llm.add_error(SYNTHESIS_MARKER);
    let store = teams_store(json!([{"name": "Jane Doe"}]));
    let mut orchestrator = Orchestrator::new(llm, PipelineConfig::default());

    let report = orchestrator.submit_question(question, &store).await.unwrap();

    assert_eq!(report.states.last(), Some(&TurnState::Rendered));
    assert!(report.outcome.is_answered());
    assert!(report.reply().starts_with("Error generating response: "));
    assert_eq!(orchestrator.history().len(), 2);
}

#[tokio::test]
async fn test_empty_question_is_ignored() {
    let llm = MockProvider::default();
    let store = CountingStore::new(teams_store(json!([])));
    let mut orchestrator = Orchestrator::new(llm.clone(), PipelineConfig::default());

    assert!(orchestrator.submit_question("  \n ", &store).await.is_none());
    assert!(orchestrator.history().is_empty());
    assert_eq!(llm.call_count(), 0);
    assert_eq!(store.reads(), 0);
}

#[tokio::test]
async fn test_question_recorded_as_typed() {
    let typed = "  Who works here?\n";
    let llm = mock("Who works here?", r#"{"collection": "teams"}"#, "Jane Doe.");
    let store = teams_store(json!([{"name": "Jane Doe"}]));
    let mut orchestrator = Orchestrator::new(llm, PipelineConfig::default());

    let report = orchestrator.submit_question(typed, &store).await.unwrap();

    assert_eq!(report.reply(), "Jane Doe.");
    assert_eq!(report.question, typed);
    assert_eq!(orchestrator.history()[0].content, typed);
}

#[tokio::test]
async fn test_session_survives_failures() {
    let mut llm = MockProvider::default();
    llm.add_response("Question: \"bad\"", "nope");
    llm.add_response("Question: \"good\"", r#"{"collection": "teams"}"#);
    llm.add_response(SYNTHESIS_MARKER, "One member.");
    let store = teams_store(json!([{"name": "Jane Doe"}]));
    let mut orchestrator = Orchestrator::new(llm, PipelineConfig::default());

    orchestrator.submit_question("bad", &store).await.unwrap();
    let report = orchestrator.submit_question("good", &store).await.unwrap();

    assert_eq!(report.reply(), "One member.");
    assert_eq!(orchestrator.history().len(), 4);
    assert_eq!(orchestrator.session().last_reply(), Some("One member."));
}

#[tokio::test]
async fn test_history_cap_and_reset() {
    let llm = mock("q", r#"{"collection": "teams"}"#, "a");
    let store = teams_store(json!([]));
    let config = PipelineConfig {
        max_history_turns: Some(4),
        ..PipelineConfig::default()
    };
    let mut orchestrator = Orchestrator::new(llm, config);

    for _ in 0..5 {
        orchestrator.submit_question("q", &store).await.unwrap();
    }
    assert_eq!(orchestrator.history().len(), 4);

    let old_id = orchestrator.session().id();
    orchestrator.reset();
    assert!(orchestrator.history().is_empty());
    assert_ne!(orchestrator.session().id(), old_id);
    assert_eq!(orchestrator.session().max_turns(), Some(4));
}

#[tokio::test]
async fn test_same_question_twice_gives_same_rows() {
    let question = "Who are the partners?";
    let llm = mock(
        question,
        r#"{"collection": "teams", "query": {"position": {"$regex": "partner", "$options": "i"}}}"#,
        "Two partners.",
    );
    let store = teams_store(json!([
        {"name": "P1", "position": "Partner"},
        {"name": "X", "position": "Clerk"},
        {"name": "P2", "position": "Managing Partner"}
    ]));
    let mut orchestrator = Orchestrator::new(llm.clone(), PipelineConfig::default());

    orchestrator.submit_question(question, &store).await.unwrap();
    let first = synthesized_rows(&llm);
    orchestrator.submit_question(question, &store).await.unwrap();
    let second = synthesized_rows(&llm);

    assert_eq!(first, second);
    assert_eq!(first.as_array().unwrap().len(), 2);
}

proptest! {
    /// Property: N turns leave 2N entries alternating user/assistant in submission order
    #[test]
    fn test_history_alternates(questions in prop::collection::vec(
        prop_oneof![Just("good"), Just("bad"), Just("missing"), Just("outside")],
        1..12,
    )) {
        let mut llm = MockProvider::default();
        llm.add_response("Question: \"good\"", r#"{"collection": "teams"}"#);
        llm.add_response("Question: \"bad\"", "not json");
        llm.add_response("Question: \"missing\"", r#"{"collection": "articles"}"#);
        llm.add_response("Question: \"outside\"", r#"{"collection": "users"}"#);
        llm.add_response(SYNTHESIS_MARKER, "answer");
        let store = teams_store(json!([{"name": "Jane Doe"}]));
        let mut orchestrator = Orchestrator::new(llm, PipelineConfig::default());

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            for question in &questions {
                orchestrator.submit_question(question, &store).await;
            }
        });

        let history = orchestrator.history();
        prop_assert_eq!(history.len(), 2 * questions.len());
        for (i, question) in questions.iter().enumerate() {
            prop_assert_eq!(history[2 * i].role, Role::User);
            prop_assert_eq!(history[2 * i].content.as_str(), *question);
            prop_assert_eq!(history[2 * i + 1].role, Role::Assistant);
            let is_error = history[2 * i + 1].content.starts_with("Error: ");
            prop_assert_eq!(is_error, *question != "good");
        }
    }
}
