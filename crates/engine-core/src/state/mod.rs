use crate::{error::StateStoreError, state::models::WalEntry};
use async_trait::async_trait;
use model::partition::{Partition, PartitionKey};

pub mod models;
pub mod sled_store;

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Persist `partition`. Returns `false` when the write was skipped
    /// because it would move the stored record backwards.
    async fn save_partition(&self, partition: &Partition) -> Result<bool, StateStoreError>;

    async fn load_partition(
        &self,
        dataset: &str,
        key: &PartitionKey,
    ) -> Result<Option<Partition>, StateStoreError>;

    /// Every stored partition of `dataset`, ascending by key.
    async fn list_partitions(&self, dataset: &str) -> Result<Vec<Partition>, StateStoreError>;

    async fn append_wal(&self, entry: &WalEntry) -> Result<(), StateStoreError>;

    async fn iter_wal(&self, run_id: &str) -> Result<Vec<WalEntry>, StateStoreError>;
}
