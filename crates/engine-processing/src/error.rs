use connectors::error::{DecodeError, SinkError, StageError, TransferError};
use model::{error::FormatError, partition::PartitionState};
use serde::Serialize;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unresolvable source: {0}")]
    Format(#[from] FormatError),

    #[error("Fetch failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Staging failed: {0}")]
    Stage(#[from] StageError),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Sink write failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Failed to record stage {stage}: {source}")]
    Observer {
        stage: PartitionState,
        #[source]
        source: BoxError,
    },

    #[error("Decoder task failed: {0}")]
    Task(String),

    #[error("Load cancelled")]
    Cancelled,
}

/// Coarse classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Format,
    Transfer,
    Decode,
    Sink,
    Cancelled,
    Internal,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Format(_) => ErrorKind::Format,
            PipelineError::Transfer(_) | PipelineError::Stage(_) => ErrorKind::Transfer,
            PipelineError::Decode(_) => ErrorKind::Decode,
            PipelineError::Sink(_) => ErrorKind::Sink,
            PipelineError::Cancelled => ErrorKind::Cancelled,
            PipelineError::Observer { .. } | PipelineError::Task(_) => ErrorKind::Internal,
        }
    }
}
