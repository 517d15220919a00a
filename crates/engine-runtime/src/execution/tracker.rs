use async_trait::async_trait;
use chrono::Utc;
use engine_core::{
    lifecycle,
    state::{StateStore, models::WalEntry},
};
use engine_processing::{error::BoxError, pipeline::StageObserver};
use model::{
    core::identifiers::RunId,
    partition::{Partition, PartitionState},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Owns the in-flight record of one partition during a scheduler run and
/// persists every transition to the state store and its log.
pub struct PartitionTracker {
    store: Arc<dyn StateStore>,
    run_id: RunId,
    current: Mutex<Partition>,
}

impl PartitionTracker {
    pub fn new(store: Arc<dyn StateStore>, run_id: RunId, partition: Partition) -> Self {
        Self {
            store,
            run_id,
            current: Mutex::new(partition),
        }
    }

    pub async fn snapshot(&self) -> Partition {
        self.current.lock().await.clone()
    }

    /// Reset to `Pending` for a new attempt.
    pub async fn begin(&self, force: bool) -> Result<(), BoxError> {
        let mut current = self.current.lock().await;
        let next = lifecycle::begin_attempt(&current, &self.run_id, force)?;
        self.persist(&current, &next).await?;
        *current = next;
        Ok(())
    }

    pub async fn complete(&self) -> Result<(), BoxError> {
        self.transition(PartitionState::Completed).await
    }

    pub async fn fail(&self, error: impl Into<String>) -> Result<(), BoxError> {
        let mut current = self.current.lock().await;
        let next = lifecycle::fail(&current, error)?;
        self.persist(&current, &next).await?;
        *current = next;
        Ok(())
    }

    async fn transition(&self, to: PartitionState) -> Result<(), BoxError> {
        let mut current = self.current.lock().await;
        let next = lifecycle::advance(&current, to)?;
        self.persist(&current, &next).await?;
        *current = next;
        Ok(())
    }

    async fn persist(&self, from: &Partition, to: &Partition) -> Result<(), BoxError> {
        let saved = self.store.save_partition(to).await?;
        if !saved {
            debug!(partition = %to.storage_key(), state = %to.state, "Stale transition ignored by store");
        }
        self.store
            .append_wal(&WalEntry::Transition {
                run_id: self.run_id.to_string(),
                dataset: to.dataset.clone(),
                key: to.key,
                from: from.state,
                to: to.state,
                attempt: to.attempts,
                at: Utc::now(),
            })
            .await?;
        info!(
            dataset = %to.dataset,
            partition = %to.key,
            attempt = to.attempts,
            "{} -> {}",
            from.state,
            to.state
        );
        Ok(())
    }
}

#[async_trait]
impl StageObserver for PartitionTracker {
    async fn on_stage(&self, stage: PartitionState) -> Result<(), BoxError> {
        self.transition(stage).await
    }
}
