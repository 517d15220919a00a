use crate::{
    error::{BoxError, PipelineError},
    loader::writer::SinkWriter,
    transform::normalize::SchemaNormalizer,
};
use async_trait::async_trait;
use connectors::{
    decode::{DEFAULT_CHUNK_SIZE, decode},
    error::DecodeError,
    fetch::Fetcher,
    sink::Sink,
    stage::Stager,
};
use engine_core::metrics::Metrics;
use model::{
    partition::PartitionState,
    records::chunk::Chunk,
    sink::{TableRef, WriteMode},
    source::{SourceDescriptor, SourceFormat},
};
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Chunks decoded ahead of the writer.
pub const DECODE_CHANNEL_CAPACITY: usize = 2;

/// Everything one load needs besides the shared collaborators.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub descriptor: SourceDescriptor,
    pub table: TableRef,
    pub mode: WriteMode,
    pub numeric_columns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    pub table: String,
    pub bytes: u64,
    pub rows: u64,
    pub chunks: u64,
    pub nulled: u64,
    pub staged: Option<String>,
}

/// Notified each time the load enters a new stage. The scheduler persists
/// these; a failure aborts the load.
#[async_trait]
pub trait StageObserver: Send + Sync {
    async fn on_stage(&self, stage: PartitionState) -> Result<(), BoxError>;
}

pub struct NoopObserver;

#[async_trait]
impl StageObserver for NoopObserver {
    async fn on_stage(&self, _stage: PartitionState) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Fetch, optionally stage, decode, normalize and write one source.
#[derive(Clone)]
pub struct PartitionPipeline {
    fetcher: Arc<dyn Fetcher>,
    stager: Option<Arc<dyn Stager>>,
    sink: Arc<dyn Sink>,
    chunk_size: usize,
    metrics: Metrics,
}

impl PartitionPipeline {
    pub fn new(fetcher: Arc<dyn Fetcher>, sink: Arc<dyn Sink>) -> Self {
        Self {
            fetcher,
            stager: None,
            sink,
            chunk_size: DEFAULT_CHUNK_SIZE,
            metrics: Metrics::new(),
        }
    }

    pub fn with_stager(mut self, stager: Option<Arc<dyn Stager>>) -> Self {
        self.stager = stager;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    pub async fn run(
        &self,
        request: &LoadRequest,
        observer: &dyn StageObserver,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome, PipelineError> {
        let descriptor = &request.descriptor;
        let mut outcome = LoadOutcome {
            table: request.table.to_string(),
            ..LoadOutcome::default()
        };

        enter(observer, PartitionState::Downloading, cancel).await?;
        let artifact = tokio::select! {
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            fetched = self.fetcher.fetch(descriptor) => fetched?,
        };
        outcome.bytes = artifact.size();
        self.metrics.increment_bytes(artifact.size());

        if let Some(stager) = &self.stager {
            let location = tokio::select! {
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                staged = stager.stage(&artifact, descriptor) => staged?,
            };
            info!(dataset = %descriptor.dataset, location = %location, "Artifact staged");
            outcome.staged = Some(location);
        }

        enter(observer, PartitionState::Decoding, cancel).await?;
        let (mut chunks, decoder) =
            spawn_decoder(artifact.path().to_path_buf(), descriptor.format, self.chunk_size);

        let normalizer = SchemaNormalizer::new(request.numeric_columns.clone());
        let mut writer = SinkWriter::new(self.sink.clone(), request.table.clone(), request.mode);
        let mut loading = false;

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                next = chunks.recv() => next,
            };
            let Some(decoded) = next else { break };
            let mut chunk = decoded?;

            if !loading {
                enter(observer, PartitionState::Loading, cancel).await?;
                loading = true;
            }

            let nulled = normalizer.normalize(&mut chunk) as u64;
            let written = writer.write(&chunk, outcome.chunks == 0).await?;

            outcome.chunks += 1;
            outcome.rows += written.rows_written;
            outcome.nulled += nulled;
            self.metrics.increment_chunks(1);
            self.metrics.increment_rows(written.rows_written);
            self.metrics.increment_nulled(nulled);
        }

        decoder
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))?;
        if !loading {
            enter(observer, PartitionState::Loading, cancel).await?;
        }
        drop(artifact);

        info!(
            dataset = %descriptor.dataset,
            table = %request.table,
            rows = outcome.rows,
            chunks = outcome.chunks,
            bytes = outcome.bytes,
            "Load finished"
        );
        Ok(outcome)
    }
}

async fn enter(
    observer: &dyn StageObserver,
    stage: PartitionState,
    cancel: &CancellationToken,
) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    observer
        .on_stage(stage)
        .await
        .map_err(|source| PipelineError::Observer { stage, source })
}

/// Decode on a blocking thread, handing chunks over a bounded channel. The
/// thread stops as soon as the receiver is dropped.
fn spawn_decoder(
    path: PathBuf,
    format: SourceFormat,
    chunk_size: usize,
) -> (mpsc::Receiver<Result<Chunk, DecodeError>>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(DECODE_CHANNEL_CAPACITY);
    let handle = tokio::task::spawn_blocking(move || {
        let stream = match decode(&path, format, chunk_size) {
            Ok(stream) => stream,
            Err(err) => {
                let _ = tx.blocking_send(Err(err));
                return;
            }
        };
        for item in stream {
            if tx.blocking_send(item).is_err() {
                debug!(path = %path.display(), "Chunk receiver dropped, decoder stopping");
                break;
            }
        }
    });
    (rx, handle)
}
