use crate::{
    error::RuntimeError,
    execution::{enumerate::enumerate, runner::PartitionRunner, tracker::PartitionTracker},
};
use chrono::{NaiveDate, Utc};
use engine_core::{
    metrics::{Metrics, MetricsSnapshot},
    retry::RetryPolicy,
    state::{StateStore, models::WalEntry},
};
use engine_processing::{
    error::{ErrorKind, PipelineError},
    pipeline::LoadOutcome,
    retry::classify_pipeline_error,
};
use futures::{StreamExt, stream};
use model::{
    core::identifiers::RunId,
    partition::{Granularity, Partition, PartitionKey, PartitionState},
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct BackfillRequest {
    pub dataset: String,
    pub start: NaiveDate,
    pub until: NaiveDate,
    pub granularity: Granularity,
    /// Reload partitions already completed by an earlier run.
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionOutcome {
    Completed,
    Failed,
    Skipped,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionReport {
    pub key: String,
    pub outcome: PartitionOutcome,
    pub attempts: u32,
    pub rows: u64,
    pub table: Option<String>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackfillReport {
    pub run_id: String,
    pub dataset: String,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub partitions: Vec<PartitionReport>,
    pub metrics: MetricsSnapshot,
}

impl BackfillReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Drives every partition of a dataset through the load chain with bounded
/// concurrency, retrying failed attempts under the retry policy.
pub struct BackfillExecutor {
    runner: Arc<dyn PartitionRunner>,
    store: Arc<dyn StateStore>,
    retry: RetryPolicy,
    max_concurrency: usize,
    metrics: Metrics,
    cancel: CancellationToken,
}

impl BackfillExecutor {
    pub fn new(
        runner: Arc<dyn PartitionRunner>,
        store: Arc<dyn StateStore>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            runner,
            store,
            retry: RetryPolicy::default(),
            max_concurrency: 1,
            metrics: Metrics::new(),
            cancel,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub async fn execute(&self, request: &BackfillRequest) -> Result<BackfillReport, RuntimeError> {
        let keys = enumerate(request.start, request.until, request.granularity)?;
        let run_id = RunId::generate();

        info!(
            run_id = %run_id,
            dataset = %request.dataset,
            partitions = keys.len(),
            max_concurrency = self.max_concurrency,
            "Starting backfill"
        );
        self.store
            .append_wal(&WalEntry::RunStart {
                run_id: run_id.to_string(),
                dataset: request.dataset.clone(),
                partitions: keys.len(),
                at: Utc::now(),
            })
            .await?;

        let results: Vec<Result<PartitionReport, RuntimeError>> = stream::iter(keys)
            .map(|key| self.run_partition(request, key, &run_id))
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut partitions = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        partitions.sort_by(|a, b| a.key.cmp(&b.key));

        let count = |outcome: PartitionOutcome| partitions.iter().filter(|p| p.outcome == outcome).count();
        let report = BackfillReport {
            run_id: run_id.to_string(),
            dataset: request.dataset.clone(),
            completed: count(PartitionOutcome::Completed),
            failed: count(PartitionOutcome::Failed),
            skipped: count(PartitionOutcome::Skipped),
            cancelled: count(PartitionOutcome::Cancelled),
            metrics: self.metrics.snapshot(),
            partitions,
        };

        self.store
            .append_wal(&WalEntry::RunDone {
                run_id: report.run_id.clone(),
                completed: report.completed,
                failed: report.failed,
                at: Utc::now(),
            })
            .await?;

        info!(
            run_id = %report.run_id,
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            "Backfill finished"
        );
        Ok(report)
    }

    async fn run_partition(
        &self,
        request: &BackfillRequest,
        key: PartitionKey,
        run_id: &RunId,
    ) -> Result<PartitionReport, RuntimeError> {
        let dataset = request.dataset.as_str();
        let existing = self.store.load_partition(dataset, &key).await?;

        if self.cancel.is_cancelled() {
            return Ok(report_without_attempt(&key, existing.as_ref(), PartitionOutcome::Cancelled));
        }
        if let Some(done) = &existing
            && done.state == PartitionState::Completed
            && !request.force
        {
            info!(dataset, partition = %key, "Partition already completed, skipping");
            return Ok(report_without_attempt(&key, existing.as_ref(), PartitionOutcome::Skipped));
        }

        let initial = existing.unwrap_or_else(|| Partition::new(dataset, key, run_id.clone()));
        let tracker = PartitionTracker::new(self.store.clone(), run_id.clone(), initial);
        let result = self
            .retry
            .run_until_cancelled(
                &self.cancel,
                |attempt| self.attempt(&tracker, dataset, key, attempt, request.force),
                classify_pipeline_error,
            )
            .await;

        let partition = tracker.snapshot().await;
        match result {
            Ok(outcome) => {
                self.metrics.increment_completed();
                Ok(PartitionReport {
                    key: key.to_string(),
                    outcome: PartitionOutcome::Completed,
                    attempts: partition.attempts,
                    rows: outcome.rows,
                    table: Some(outcome.table),
                    error: None,
                    error_kind: None,
                })
            }
            Err(err) => {
                let err = err.into_inner();
                let kind = err.kind();
                let outcome = if kind == ErrorKind::Cancelled {
                    PartitionOutcome::Cancelled
                } else {
                    self.metrics.increment_failed();
                    error!(dataset, partition = %key, attempts = partition.attempts, error = %err, "Partition failed");
                    PartitionOutcome::Failed
                };
                Ok(PartitionReport {
                    key: key.to_string(),
                    outcome,
                    attempts: partition.attempts,
                    rows: 0,
                    table: None,
                    error: Some(err.to_string()),
                    error_kind: Some(kind),
                })
            }
        }
    }

    /// One pass through the chain, bracketed by the lifecycle transitions
    /// the scheduler owns.
    async fn attempt(
        &self,
        tracker: &PartitionTracker,
        dataset: &str,
        key: PartitionKey,
        attempt: usize,
        force: bool,
    ) -> Result<LoadOutcome, PipelineError> {
        if attempt > 1 {
            self.metrics.increment_retries(1);
            warn!(dataset, partition = %key, attempt, "Retrying partition");
        }
        tracker
            .begin(force)
            .await
            .map_err(|source| PipelineError::Observer {
                stage: PartitionState::Pending,
                source,
            })?;

        match self.runner.run(dataset, &key, tracker, &self.cancel).await {
            Ok(outcome) => {
                tracker
                    .complete()
                    .await
                    .map_err(|source| PipelineError::Observer {
                        stage: PartitionState::Completed,
                        source,
                    })?;
                Ok(outcome)
            }
            Err(err) => {
                if let Err(save_err) = tracker.fail(err.to_string()).await {
                    warn!(dataset, partition = %key, error = %save_err, "Failed to record partition failure");
                }
                Err(err)
            }
        }
    }
}

fn report_without_attempt(
    key: &PartitionKey,
    existing: Option<&Partition>,
    outcome: PartitionOutcome,
) -> PartitionReport {
    PartitionReport {
        key: key.to_string(),
        outcome,
        attempts: existing.map_or(0, |p| p.attempts),
        rows: 0,
        table: None,
        error: None,
        error_kind: None,
    }
}
