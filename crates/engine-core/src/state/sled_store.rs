use crate::{
    error::StateStoreError,
    state::{StateStore, models::WalEntry},
};
use async_trait::async_trait;
use model::partition::{Partition, PartitionKey, state::storage_key};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::Path;

pub struct SledStateStore {
    db: sled::Db,
}

impl SledStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateStoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    #[inline]
    fn part_key(dataset: &str, key: &PartitionKey) -> String {
        format!("part:{}", storage_key(dataset, key))
    }

    /// Whether `incoming` may replace `existing`. Within one attempt of one
    /// run the lifecycle only moves forward and a terminal state is final;
    /// a later attempt or another run may restart it.
    fn should_replace(existing: &Partition, incoming: &Partition) -> bool {
        if existing.run_id != incoming.run_id {
            return true;
        }
        if incoming.attempts != existing.attempts {
            return incoming.attempts > existing.attempts;
        }
        if existing.state.is_terminal() {
            return incoming.state == existing.state;
        }
        incoming.state.rank() >= existing.state.rank()
    }
}

#[async_trait]
impl StateStore for SledStateStore {
    async fn save_partition(&self, partition: &Partition) -> Result<bool, StateStoreError> {
        let key = Self::part_key(&partition.dataset, &partition.key);
        let new_bytes = bincode::serialize(partition)?;

        let result = self
            .db
            .transaction::<_, _, bincode::Error>(|tx_db| {
                if let Some(existing_bytes) = tx_db.get(&key)? {
                    let existing: Partition = bincode::deserialize(&existing_bytes)
                        .map_err(ConflictableTransactionError::Abort)?;

                    if !Self::should_replace(&existing, partition) {
                        return Ok(false);
                    }
                }

                tx_db.insert(key.as_bytes(), new_bytes.as_slice())?;
                Ok(true)
            });

        let applied = match result {
            Ok(applied) => applied,
            Err(TransactionError::Abort(e)) => return Err(e.into()),
            Err(TransactionError::Storage(e)) => return Err(e.into()),
        };
        self.db.flush_async().await?;
        Ok(applied)
    }

    async fn load_partition(
        &self,
        dataset: &str,
        key: &PartitionKey,
    ) -> Result<Option<Partition>, StateStoreError> {
        match self.db.get(Self::part_key(dataset, key))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn list_partitions(&self, dataset: &str) -> Result<Vec<Partition>, StateStoreError> {
        let prefix = format!("part:{dataset}/");
        let mut partitions = Vec::new();
        for item in self.db.scan_prefix(prefix) {
            let (_key, value) = item?;
            partitions.push(bincode::deserialize::<Partition>(&value)?);
        }
        partitions.sort_by_key(|p| p.key);
        Ok(partitions)
    }

    async fn append_wal(&self, entry: &WalEntry) -> Result<(), StateStoreError> {
        // generate_id is monotonic per database, so entries replay in order.
        let seq = self.db.generate_id()?;
        let key = format!("wal:{}:{:020}", entry.run_id(), seq);
        let value = bincode::serialize(entry)?;

        self.db.insert(key, value)?;
        Ok(())
    }

    async fn iter_wal(&self, run_id: &str) -> Result<Vec<WalEntry>, StateStoreError> {
        let prefix = format!("wal:{run_id}:");
        let mut entries = Vec::new();

        for item in self.db.scan_prefix(prefix) {
            let (_key, value) = item?;
            entries.push(bincode::deserialize(&value)?);
        }

        Ok(entries)
    }
}
