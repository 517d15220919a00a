//! Pure transition functions for a partition's lifecycle.
//!
//! `Pending -> Downloading -> Decoding -> Loading -> Completed`, with any
//! non-terminal state allowed to drop to `Failed`. A new attempt restarts
//! at `Pending` from `Failed`, or from `Completed` on a forced rerun.

use chrono::Utc;
use model::{
    core::identifiers::RunId,
    partition::{Partition, PartitionState},
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("illegal partition transition {from} -> {to}")]
    IllegalTransition {
        from: PartitionState,
        to: PartitionState,
    },
}

/// The state that follows `state` on the success path.
pub fn successor(state: PartitionState) -> Option<PartitionState> {
    match state {
        PartitionState::Pending => Some(PartitionState::Downloading),
        PartitionState::Downloading => Some(PartitionState::Decoding),
        PartitionState::Decoding => Some(PartitionState::Loading),
        PartitionState::Loading => Some(PartitionState::Completed),
        PartitionState::Completed | PartitionState::Failed => None,
    }
}

/// Start a fresh attempt under `run_id`. Legal from `Pending` (first
/// attempt), `Failed`, or `Completed` when `force` is set.
pub fn begin_attempt(
    partition: &Partition,
    run_id: &RunId,
    force: bool,
) -> Result<Partition, LifecycleError> {
    let allowed = match partition.state {
        PartitionState::Pending | PartitionState::Failed => true,
        PartitionState::Completed => force,
        _ => partition.run_id != *run_id,
    };
    if !allowed {
        return Err(LifecycleError::IllegalTransition {
            from: partition.state,
            to: PartitionState::Pending,
        });
    }

    let mut next = partition.clone();
    next.state = PartitionState::Pending;
    next.attempts += 1;
    next.run_id = run_id.clone();
    next.updated_at = Utc::now();
    Ok(next)
}

/// Move one step along the success path.
pub fn advance(partition: &Partition, to: PartitionState) -> Result<Partition, LifecycleError> {
    if successor(partition.state) != Some(to) {
        return Err(LifecycleError::IllegalTransition {
            from: partition.state,
            to,
        });
    }

    let mut next = partition.clone();
    next.state = to;
    if to == PartitionState::Completed {
        next.last_error = None;
    }
    next.updated_at = Utc::now();
    Ok(next)
}

/// Settle the current attempt as failed.
pub fn fail(partition: &Partition, error: impl Into<String>) -> Result<Partition, LifecycleError> {
    if partition.state.is_terminal() {
        return Err(LifecycleError::IllegalTransition {
            from: partition.state,
            to: PartitionState::Failed,
        });
    }

    let mut next = partition.clone();
    next.state = PartitionState::Failed;
    next.last_error = Some(error.into());
    next.updated_at = Utc::now();
    Ok(next)
}
