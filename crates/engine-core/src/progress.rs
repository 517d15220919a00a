use crate::{error::StateStoreError, state::StateStore};
use chrono::{DateTime, Utc};
use model::partition::{Partition, PartitionState};
use serde::Serialize;
use std::{fmt, sync::Arc};

/// Read-side view over the state store for status reporting.
#[derive(Clone)]
pub struct ProgressService {
    pub store: Arc<dyn StateStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressStage {
    Idle,
    Running,
    Done,
    Failed,
}

impl ProgressStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStage::Idle => "Idle",
            ProgressStage::Running => "Running",
            ProgressStage::Done => "Done",
            ProgressStage::Failed => "Failed",
        }
    }
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionStatus {
    pub key: String,
    pub state: PartitionState,
    pub attempts: u32,
    pub run_id: String,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Partition> for PartitionStatus {
    fn from(p: &Partition) -> Self {
        Self {
            key: p.key.to_string(),
            state: p.state,
            attempts: p.attempts,
            run_id: p.run_id.to_string(),
            last_error: p.last_error.clone(),
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetStatus {
    pub dataset: String,
    pub stage: ProgressStage,
    pub completed: usize,
    pub failed: usize,
    pub in_flight: usize,
    pub partitions: Vec<PartitionStatus>,
}

impl ProgressService {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        ProgressService { store }
    }

    pub async fn dataset_status(&self, dataset: &str) -> Result<DatasetStatus, StateStoreError> {
        let partitions = self.store.list_partitions(dataset).await?;

        let count = |pred: fn(&PartitionState) -> bool| {
            partitions.iter().filter(|p| pred(&p.state)).count()
        };
        let completed = count(|s| *s == PartitionState::Completed);
        let failed = count(|s| *s == PartitionState::Failed);
        let in_flight = count(|s| !s.is_terminal());

        let stage = if partitions.is_empty() {
            ProgressStage::Idle
        } else if in_flight > 0 {
            ProgressStage::Running
        } else if failed > 0 {
            ProgressStage::Failed
        } else {
            ProgressStage::Done
        };

        Ok(DatasetStatus {
            dataset: dataset.to_string(),
            stage,
            completed,
            failed,
            in_flight,
            partitions: partitions.iter().map(PartitionStatus::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::sled_store::SledStateStore;
    use model::{
        core::identifiers::RunId,
        partition::{Granularity, PartitionKey},
    };
    use tempfile::tempdir;

    async fn seed(store: &Arc<dyn StateStore>, month: &str, state: PartitionState) {
        let mut p = Partition::new(
            "green",
            PartitionKey::parse(Granularity::Monthly, month).unwrap(),
            RunId::new("run"),
        );
        p.state = state;
        p.attempts = 1;
        store.save_partition(&p).await.unwrap();
    }

    #[tokio::test]
    async fn reports_idle_for_unknown_dataset() {
        let dir = tempdir().unwrap();
        let store: Arc<dyn StateStore> = Arc::new(SledStateStore::open(dir.path()).expect("open sled"));
        let status = ProgressService::new(store).dataset_status("green").await.unwrap();
        assert_eq!(status.stage, ProgressStage::Idle);
        assert!(status.partitions.is_empty());
    }

    #[tokio::test]
    async fn summarises_partition_states() {
        let dir = tempdir().unwrap();
        let store: Arc<dyn StateStore> = Arc::new(SledStateStore::open(dir.path()).expect("open sled"));
        seed(&store, "2020-01", PartitionState::Completed).await;
        seed(&store, "2020-02", PartitionState::Failed).await;

        let service = ProgressService::new(store.clone());
        let status = service.dataset_status("green").await.unwrap();
        assert_eq!(status.stage, ProgressStage::Failed);
        assert_eq!((status.completed, status.failed, status.in_flight), (1, 1, 0));

        seed(&store, "2020-03", PartitionState::Loading).await;
        let status = service.dataset_status("green").await.unwrap();
        assert_eq!(status.stage, ProgressStage::Running);
        assert_eq!(status.partitions[2].key, "2020-03");
    }
}
