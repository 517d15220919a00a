use crate::{core::identifiers::RunId, partition::key::PartitionKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionState {
    Pending,
    Downloading,
    Decoding,
    Loading,
    Completed,
    Failed,
}

impl PartitionState {
    /// Position in the forward chain. `Failed` shares the top rank with
    /// `Completed`: both end an attempt.
    pub fn rank(&self) -> u8 {
        match self {
            PartitionState::Pending => 0,
            PartitionState::Downloading => 1,
            PartitionState::Decoding => 2,
            PartitionState::Loading => 3,
            PartitionState::Completed | PartitionState::Failed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PartitionState::Completed | PartitionState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionState::Pending => "pending",
            PartitionState::Downloading => "downloading",
            PartitionState::Decoding => "decoding",
            PartitionState::Loading => "loading",
            PartitionState::Completed => "completed",
            PartitionState::Failed => "failed",
        }
    }
}

impl fmt::Display for PartitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub dataset: String,
    pub key: PartitionKey,
    pub state: PartitionState,
    /// Attempts started so far, counting the current one.
    pub attempts: u32,
    pub run_id: RunId,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Partition {
    pub fn new(dataset: impl Into<String>, key: PartitionKey, run_id: RunId) -> Self {
        Self {
            dataset: dataset.into(),
            key,
            state: PartitionState::Pending,
            attempts: 0,
            run_id,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    /// Storage key, `{dataset}/{key}`.
    pub fn storage_key(&self) -> String {
        storage_key(&self.dataset, &self.key)
    }
}

pub fn storage_key(dataset: &str, key: &PartitionKey) -> String {
    format!("{dataset}/{key}")
}
