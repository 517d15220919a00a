use chrono::{DateTime, Utc};
use model::partition::{PartitionKey, PartitionState};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum WalEntry {
    RunStart {
        run_id: String,
        dataset: String,
        partitions: usize,
        at: DateTime<Utc>,
    },
    Transition {
        run_id: String,
        dataset: String,
        key: PartitionKey,
        from: PartitionState,
        to: PartitionState,
        attempt: u32,
        at: DateTime<Utc>,
    },
    RunDone {
        run_id: String,
        completed: usize,
        failed: usize,
        at: DateTime<Utc>,
    },
}

impl WalEntry {
    pub fn run_id(&self) -> &str {
        match self {
            WalEntry::RunStart { run_id, .. } => run_id,
            WalEntry::Transition { run_id, .. } => run_id,
            WalEntry::RunDone { run_id, .. } => run_id,
        }
    }
}
