pub mod key;
pub mod state;

pub use key::{Granularity, PartitionKey};
pub use state::{Partition, PartitionState};
