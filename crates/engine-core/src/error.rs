use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("State storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("State encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("State store task failed: {0}")]
    Task(String),
}
