use async_trait::async_trait;
use engine_processing::{
    error::PipelineError,
    pipeline::{LoadOutcome, LoadRequest, PartitionPipeline, StageObserver},
};
use model::{partition::PartitionKey, sink::WriteMode, source::SourceResolver};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// One attempt at loading one partition of a dataset.
#[async_trait]
pub trait PartitionRunner: Send + Sync {
    async fn run(
        &self,
        dataset: &str,
        key: &PartitionKey,
        observer: &dyn StageObserver,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome, PipelineError>;
}

/// Resolves the partition's source and table, then runs the load pipeline.
pub struct PipelineRunner {
    pipeline: PartitionPipeline,
    resolver: SourceResolver,
    mode: WriteMode,
    numeric_columns: HashMap<String, Vec<String>>,
}

impl PipelineRunner {
    pub fn new(pipeline: PartitionPipeline, resolver: SourceResolver, mode: WriteMode) -> Self {
        Self {
            pipeline,
            resolver,
            mode,
            numeric_columns: HashMap::new(),
        }
    }

    pub fn with_numeric_columns(mut self, dataset: impl Into<String>, columns: Vec<String>) -> Self {
        self.numeric_columns.insert(dataset.into(), columns);
        self
    }

    pub fn request(&self, dataset: &str, key: &PartitionKey) -> Result<LoadRequest, PipelineError> {
        Ok(LoadRequest {
            descriptor: self.resolver.resolve(dataset, key)?,
            table: self.resolver.table(dataset, key)?,
            mode: self.mode,
            numeric_columns: self.numeric_columns.get(dataset).cloned().unwrap_or_default(),
        })
    }
}

#[async_trait]
impl PartitionRunner for PipelineRunner {
    async fn run(
        &self,
        dataset: &str,
        key: &PartitionKey,
        observer: &dyn StageObserver,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome, PipelineError> {
        let request = self.request(dataset, key)?;
        self.pipeline.run(&request, observer, cancel).await
    }
}
