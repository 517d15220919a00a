use connectors::error::{SinkError, TransferError};
use engine_config::SettingsError;
use engine_core::{error::StateStoreError, lifecycle::LifecycleError};
use engine_processing::error::PipelineError;
use model::error::{FormatError, KeyError};
use thiserror::Error;

/// Top-level errors for scheduler and loader runs.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("State store error: {0}")]
    State(#[from] StateStoreError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Invalid partition range: {0}")]
    Key(#[from] KeyError),

    #[error("Unresolvable source: {0}")]
    Format(#[from] FormatError),

    #[error("Fetcher setup failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Load failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// This usually indicates that the task was cancelled or panicked.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
