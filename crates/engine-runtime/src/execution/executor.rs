use crate::{
    error::RuntimeError,
    execution::{
        backfill::{BackfillExecutor, BackfillReport, BackfillRequest},
        factory,
        oneshot::{self, OneShotLoad},
        runner::PipelineRunner,
    },
};
use chrono::NaiveDate;
use engine_config::LoaderConfig;
use engine_core::{
    metrics::Metrics,
    progress::{DatasetStatus, ProgressService},
};
use engine_processing::pipeline::LoadOutcome;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct BackfillOptions {
    pub dataset: String,
    pub until: NaiveDate,
    pub force: bool,
    /// Overrides `schedule.max_concurrency`.
    pub max_concurrency: Option<usize>,
}

/// Run the scheduler for one configured dataset.
pub async fn backfill(
    config: &LoaderConfig,
    options: BackfillOptions,
    cancel: CancellationToken,
) -> Result<BackfillReport, RuntimeError> {
    config.validate()?;
    let dataset = config.dataset(&options.dataset)?;

    let metrics = Metrics::new();
    let sink = factory::create_sink(config).await?;
    let store = factory::create_state_store(config)?;
    let pipeline = factory::create_pipeline(config, sink, metrics.clone())?;

    let runner = PipelineRunner::new(pipeline, config.resolver(), config.pipeline.write_mode)
        .with_numeric_columns(&dataset.name, config.numeric_columns(&dataset.name));
    let executor = BackfillExecutor::new(Arc::new(runner), store, cancel)
        .with_retry(config.retry_policy())
        .with_max_concurrency(
            options
                .max_concurrency
                .unwrap_or(config.schedule.max_concurrency),
        )
        .with_metrics(metrics);

    executor
        .execute(&BackfillRequest {
            dataset: dataset.name.clone(),
            start: config.schedule.start,
            until: options.until,
            granularity: config.schedule.granularity,
            force: options.force,
        })
        .await
}

/// Load one explicit source into one table.
pub async fn load(
    config: &LoaderConfig,
    load: &OneShotLoad,
    cancel: CancellationToken,
) -> Result<LoadOutcome, RuntimeError> {
    let sink = factory::create_sink(config).await?;
    let pipeline = factory::create_pipeline(config, sink, Metrics::new())?;
    oneshot::run_once(&pipeline, load, &config.retry_policy(), &cancel).await
}

pub async fn status(config: &LoaderConfig, dataset: &str) -> Result<DatasetStatus, RuntimeError> {
    let store = factory::create_state_store(config)?;
    Ok(ProgressService::new(store).dataset_status(dataset).await?)
}
