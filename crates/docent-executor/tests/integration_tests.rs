//! Integration tests for descriptor execution against the in-memory store

use docent_domain::traits::DocumentStore;
use docent_domain::{Document, QueryDescriptor, Record};
use docent_executor::{ExecutionError, Executor, ExecutorConfig};
use docent_store::MemoryStore;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

fn fixture() -> MemoryStore {
    MemoryStore::from_json(
        &json!({
            "teams": [
                {"_id": 1, "name": "Jane Doe", "position": "Founding Partner", "firm": "FirmX"},
                {"_id": 2, "name": "John Roe", "position": "Associate", "firm": "FirmA"},
                {"_id": 3, "name": "Ann Poe", "position": "Partner", "firm": "FirmA"},
                {"_id": 4, "name": "Bob Moe", "position": "Paralegal", "firm": "FirmB"}
            ],
            "careers": []
        })
        .to_string(),
    )
    .unwrap()
}

fn executor() -> Executor {
    Executor::new(ExecutorConfig::default())
}

#[tokio::test]
async fn test_projected_find() {
    let descriptor = QueryDescriptor::new("teams")
        .with_filter(doc(json!({"position": {"$regex": "founding partner", "$options": "i"}})))
        .with_projection(doc(json!({"name": 1, "_id": 0})));

    let rows = executor().execute(&descriptor, &fixture()).await.unwrap();
    assert_eq!(rows.records(), &[doc(json!({"name": "Jane Doe"}))]);
}

#[tokio::test]
async fn test_aggregation_ignores_filter_projection_and_limit() {
    let descriptor = QueryDescriptor::new("teams")
        .with_filter(doc(json!({"firm": "nobody"})))
        .with_projection(doc(json!({"name": 1})))
        .with_limit(1)
        .with_aggregation(vec![
            doc(json!({"$group": {"_id": "$firm", "total_members": {"$sum": 1}}})),
            doc(json!({"$sort": {"_id": 1}})),
        ]);

    let rows = executor().execute(&descriptor, &fixture()).await.unwrap();
    assert_eq!(
        serde_json::to_value(&rows).unwrap(),
        json!([
            {"_id": "FirmA", "total_members": 2},
            {"_id": "FirmB", "total_members": 1},
            {"_id": "FirmX", "total_members": 1}
        ])
    );
}

#[tokio::test]
async fn test_empty_filter_returns_everything() {
    let rows = executor()
        .execute(&QueryDescriptor::new("teams"), &fixture())
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows.records()[0]["name"], json!("Jane Doe"));
}

#[tokio::test]
async fn test_limit_applies_to_find() {
    let store = fixture();
    let limited = executor()
        .execute(&QueryDescriptor::new("teams").with_limit(2), &store)
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);

    let unlimited = executor()
        .execute(&QueryDescriptor::new("teams").with_limit(0), &store)
        .await
        .unwrap();
    assert_eq!(unlimited.len(), 4);
}

#[tokio::test]
async fn test_empty_result_is_success() {
    let rows = executor()
        .execute(&QueryDescriptor::new("careers"), &fixture())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_missing_collection() {
    let err = executor()
        .execute(&QueryDescriptor::new("ghosts"), &fixture())
        .await
        .unwrap_err();
    assert_eq!(err, ExecutionError::Store("Collection not found: ghosts".into()));
    assert_eq!(err.to_string(), "Collection not found: ghosts");
}

#[tokio::test]
async fn test_unsupported_operator() {
    let descriptor =
        QueryDescriptor::new("teams").with_filter(doc(json!({"name": {"$where": "true"}})));
    let err = executor().execute(&descriptor, &fixture()).await.unwrap_err();
    assert!(err.to_string().contains("$where"));
}

/// Counts calls and optionally stalls
#[derive(Default)]
struct ProbeStore {
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ProbeStore {
    async fn touch(&self) -> Result<Vec<Record>, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Vec::new())
    }
}

impl DocumentStore for ProbeStore {
    type Error = String;

    async fn find(
        &self,
        _collection: &str,
        _filter: &Document,
        _projection: Option<&Document>,
        _limit: Option<u64>,
    ) -> Result<Vec<Record>, Self::Error> {
        self.touch().await
    }

    async fn aggregate(
        &self,
        _collection: &str,
        _pipeline: &[Document],
    ) -> Result<Vec<Record>, Self::Error> {
        self.touch().await
    }
}

#[tokio::test]
async fn test_empty_collection_never_reaches_store() {
    let store = ProbeStore::default();
    let err = executor()
        .execute(&QueryDescriptor::new(""), &store)
        .await
        .unwrap_err();
    assert_eq!(err, ExecutionError::EmptyCollection);
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_exactly_one_read() {
    let store = ProbeStore::default();
    let descriptor = QueryDescriptor::new("teams")
        .with_aggregation(vec![doc(json!({"$match": {}}))]);
    executor().execute(&descriptor, &store).await.unwrap();
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_read_timeout() {
    let store = ProbeStore {
        delay: Some(Duration::from_secs(5)),
        ..ProbeStore::default()
    };
    let executor = Executor::new(ExecutorConfig { timeout_secs: 1 });
    let err = executor
        .execute(&QueryDescriptor::new("teams"), &store)
        .await
        .unwrap_err();
    assert_eq!(err, ExecutionError::Timeout(1));
}

fn descriptor_strategy() -> impl Strategy<Value = QueryDescriptor> {
    let firm = prop_oneof![Just("FirmA"), Just("FirmB"), Just("FirmX")];
    (prop::option::of(firm), prop::option::of(0u64..5), any::<bool>(), any::<bool>()).prop_map(
        |(firm, limit, project, group)| {
            let mut descriptor = QueryDescriptor::new("teams");
            if let Some(firm) = firm {
                descriptor = descriptor.with_filter(doc(json!({"firm": firm})));
            }
            if project {
                descriptor = descriptor.with_projection(doc(json!({"name": 1, "_id": 0})));
            }
            if group {
                descriptor = descriptor.with_aggregation(vec![doc(
                    json!({"$group": {"_id": "$firm", "n": {"$sum": 1}}}),
                )]);
            }
            descriptor.limit = limit;
            descriptor
        },
    )
}

proptest! {
    /// Property: the same descriptor twice on an unchanged store gives the same ordered rows
    #[test]
    fn test_execution_is_idempotent(descriptor in descriptor_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let store = fixture();
        let (first, second) = rt.block_on(async {
            let first = executor().execute(&descriptor, &store).await;
            let second = executor().execute(&descriptor, &store).await;
            (first, second)
        });
        prop_assert_eq!(first, second);
    }
}
