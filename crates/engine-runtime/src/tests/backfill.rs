use crate::execution::{
    backfill::{BackfillExecutor, BackfillRequest, PartitionOutcome},
    runner::PartitionRunner,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use connectors::error::TransferError;
use engine_core::{
    retry::RetryPolicy,
    state::{StateStore, models::WalEntry, sled_store::SledStateStore},
};
use engine_processing::{
    error::{ErrorKind, PipelineError},
    pipeline::{LoadOutcome, StageObserver},
};
use model::{
    error::FormatError,
    partition::{Granularity, PartitionKey, PartitionState},
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;

type FailureRule = Box<dyn Fn(&PartitionKey, usize) -> Option<PipelineError> + Send + Sync>;

/// Walks the observer through the load stages, optionally failing.
struct MockRunner {
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: Mutex<HashMap<String, usize>>,
    fail: FailureRule,
}

impl MockRunner {
    fn new() -> Self {
        Self::failing(|_, _| None)
    }

    fn failing(
        rule: impl Fn(&PartitionKey, usize) -> Option<PipelineError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            calls: Mutex::new(HashMap::new()),
            fail: Box::new(rule),
        }
    }

    fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl PartitionRunner for MockRunner {
    async fn run(
        &self,
        _dataset: &str,
        key: &PartitionKey,
        observer: &dyn StageObserver,
        _cancel: &CancellationToken,
    ) -> Result<LoadOutcome, PipelineError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let entry = calls.entry(key.to_string()).or_default();
            *entry += 1;
            *entry
        };
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        let result = async {
            observer.on_stage(PartitionState::Downloading).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
            if let Some(err) = (self.fail)(key, call) {
                return Err(err);
            }
            observer.on_stage(PartitionState::Decoding).await.unwrap();
            observer.on_stage(PartitionState::Loading).await.unwrap();
            Ok(LoadOutcome {
                table: format!("public.green_tripdata_{}", key.compact()),
                rows: 10,
                chunks: 1,
                ..LoadOutcome::default()
            })
        }
        .await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn request(force: bool) -> BackfillRequest {
    BackfillRequest {
        dataset: "green".into(),
        start: date(2020, 1, 1),
        until: date(2020, 4, 10),
        granularity: Granularity::Monthly,
        force,
    }
}

fn unavailable() -> PipelineError {
    PipelineError::Transfer(TransferError::Status {
        url: "https://example.test/green.csv.gz".into(),
        status: 503,
    })
}

fn key(text: &str) -> PartitionKey {
    PartitionKey::parse(Granularity::Monthly, text).unwrap()
}

fn executor(
    runner: Arc<MockRunner>,
    store: Arc<dyn StateStore>,
    max_concurrency: usize,
) -> BackfillExecutor {
    BackfillExecutor::new(runner, store, CancellationToken::new())
        .with_retry(RetryPolicy::immediate(2))
        .with_max_concurrency(max_concurrency)
}

#[tokio::test]
async fn runs_every_partition_one_at_a_time() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(SledStateStore::open(dir.path()).unwrap());
    let runner = Arc::new(MockRunner::new());

    let report = executor(runner.clone(), store.clone(), 1)
        .execute(&request(false))
        .await
        .unwrap();

    assert_eq!(report.completed, 4);
    assert_eq!(report.failed, 0);
    let keys: Vec<&str> = report.partitions.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, vec!["2020-01", "2020-02", "2020-03", "2020-04"]);
    assert_eq!(runner.max_active.load(Ordering::SeqCst), 1);

    let stored = store.list_partitions("green").await.unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored.iter().all(|p| p.state == PartitionState::Completed && p.attempts == 1));
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(SledStateStore::open(dir.path()).unwrap());
    let runner = Arc::new(MockRunner::new());

    let report = executor(runner.clone(), store, 2)
        .execute(&request(false))
        .await
        .unwrap();

    assert_eq!(report.completed, 4);
    assert!(runner.max_active.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn retries_then_settles_at_failed_without_blocking_others() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(SledStateStore::open(dir.path()).unwrap());
    let runner = Arc::new(MockRunner::failing(|key, _| {
        (key.to_string() == "2020-02").then(unavailable)
    }));

    let report = executor(runner.clone(), store.clone(), 1)
        .execute(&request(false))
        .await
        .unwrap();

    assert!(report.has_failures());
    assert_eq!(report.completed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(runner.calls("2020-02"), 2);
    assert_eq!(report.metrics.retry_count, 1);

    let failed = &report.partitions[1];
    assert_eq!(failed.outcome, PartitionOutcome::Failed);
    assert_eq!(failed.attempts, 2);
    assert!(failed.error.as_deref().unwrap().contains("503"));

    let stored = store.load_partition("green", &key("2020-02")).await.unwrap().unwrap();
    assert_eq!(stored.state, PartitionState::Failed);
    assert_eq!(stored.attempts, 2);
    assert!(stored.last_error.is_some());
}

#[tokio::test]
async fn transient_failure_recovers_on_second_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(SledStateStore::open(dir.path()).unwrap());
    let runner = Arc::new(MockRunner::failing(|key, call| {
        (key.to_string() == "2020-03" && call == 1).then(unavailable)
    }));

    let report = executor(runner.clone(), store.clone(), 1)
        .execute(&request(false))
        .await
        .unwrap();

    assert_eq!(report.completed, 4);
    let stored = store.load_partition("green", &key("2020-03")).await.unwrap().unwrap();
    assert_eq!(stored.state, PartitionState::Completed);
    assert_eq!(stored.attempts, 2);
    assert_eq!(stored.last_error, None);
}

#[tokio::test]
async fn format_errors_are_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(SledStateStore::open(dir.path()).unwrap());
    let runner = Arc::new(MockRunner::failing(|_, _| {
        Some(PipelineError::Format(FormatError::Unrecognized(
            "green_tripdata.xlsx".into(),
        )))
    }));

    let report = executor(runner.clone(), store, 1)
        .execute(&request(false))
        .await
        .unwrap();

    assert_eq!(report.failed, 4);
    assert_eq!(runner.total_calls(), 4);
    assert!(report.partitions.iter().all(|p| p.attempts == 1));
    assert!(
        report
            .partitions
            .iter()
            .all(|p| p.error_kind == Some(ErrorKind::Format))
    );
}

#[tokio::test]
async fn completed_partitions_are_skipped_unless_forced() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(SledStateStore::open(dir.path()).unwrap());
    let runner = Arc::new(MockRunner::failing(|key, call| {
        (key.to_string() == "2020-04" && call <= 2).then(unavailable)
    }));

    let first = executor(runner.clone(), store.clone(), 1)
        .execute(&request(false))
        .await
        .unwrap();
    assert_eq!(first.completed, 3);
    assert_eq!(first.failed, 1);

    // Catchup only redoes what did not complete.
    let second = executor(runner.clone(), store.clone(), 1)
        .execute(&request(false))
        .await
        .unwrap();
    assert_eq!(second.skipped, 3);
    assert_eq!(second.completed, 1);
    assert_eq!(runner.calls("2020-01"), 1);
    assert_eq!(runner.calls("2020-04"), 3);
    let retried = store.load_partition("green", &key("2020-04")).await.unwrap().unwrap();
    assert_eq!(retried.attempts, 3);

    let forced = executor(runner.clone(), store, 1)
        .execute(&request(true))
        .await
        .unwrap();
    assert_eq!(forced.completed, 4);
    assert_eq!(runner.calls("2020-01"), 2);
}

#[tokio::test]
async fn cancelled_run_leaves_partitions_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(SledStateStore::open(dir.path()).unwrap());
    let runner = Arc::new(MockRunner::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = BackfillExecutor::new(runner.clone(), store.clone(), cancel)
        .execute(&request(false))
        .await
        .unwrap();

    assert_eq!(report.cancelled, 4);
    assert_eq!(runner.total_calls(), 0);
    assert!(store.list_partitions("green").await.unwrap().is_empty());
}

#[tokio::test]
async fn transitions_are_logged_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(SledStateStore::open(dir.path()).unwrap());
    let runner = Arc::new(MockRunner::new());

    let mut single = request(false);
    single.until = date(2020, 1, 31);
    let report = executor(runner, store.clone(), 1)
        .execute(&single)
        .await
        .unwrap();

    let wal = store.iter_wal(&report.run_id).await.unwrap();
    assert!(matches!(wal.first(), Some(WalEntry::RunStart { partitions: 1, .. })));
    assert!(matches!(wal.last(), Some(WalEntry::RunDone { completed: 1, failed: 0, .. })));

    let states: Vec<PartitionState> = wal
        .iter()
        .filter_map(|entry| match entry {
            WalEntry::Transition { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            PartitionState::Pending,
            PartitionState::Downloading,
            PartitionState::Decoding,
            PartitionState::Loading,
            PartitionState::Completed,
        ]
    );
}
