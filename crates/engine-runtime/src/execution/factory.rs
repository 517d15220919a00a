use crate::error::RuntimeError;
use connectors::{
    fetch::{Fetcher, HttpFetcher},
    scratch::ScratchDir,
    sink::{PgSink, Sink},
    stage::{LocalStager, S3Stager, Stager},
};
use engine_config::{LoaderConfig, settings::sections::StagingSettings};
use engine_core::{
    metrics::Metrics,
    state::{StateStore, sled_store::SledStateStore},
};
use engine_processing::pipeline::PartitionPipeline;
use std::sync::Arc;
use tracing::info;

pub fn create_fetcher(config: &LoaderConfig) -> Result<Arc<dyn Fetcher>, RuntimeError> {
    let scratch = ScratchDir::new(config.scratch_dir())?;
    let fetcher = HttpFetcher::new(scratch, config.fetch_timeout())?;
    Ok(Arc::new(fetcher))
}

pub fn create_stager(config: &LoaderConfig) -> Result<Option<Arc<dyn Stager>>, RuntimeError> {
    match &config.staging {
        None => Ok(None),
        Some(StagingSettings::Local { root }) => Ok(Some(Arc::new(LocalStager::new(root)))),
        Some(StagingSettings::S3 { .. }) => {
            let stager = config
                .s3_stager()?
                .map(|s3| Arc::new(S3Stager::new(s3)) as Arc<dyn Stager>);
            Ok(stager)
        }
    }
}

pub async fn create_sink(config: &LoaderConfig) -> Result<Arc<dyn Sink>, RuntimeError> {
    let sink = PgSink::connect(config.sink_url()?).await?;
    Ok(Arc::new(sink))
}

pub fn create_state_store(config: &LoaderConfig) -> Result<Arc<dyn StateStore>, RuntimeError> {
    let dir = config.state_dir();
    std::fs::create_dir_all(&dir)?;
    info!(path = %dir.display(), "Opening state store");
    Ok(Arc::new(SledStateStore::open(dir)?))
}

/// Pipeline wired with the configured fetcher, optional stager and chunk
/// size, writing into `sink`.
pub fn create_pipeline(
    config: &LoaderConfig,
    sink: Arc<dyn Sink>,
    metrics: Metrics,
) -> Result<PartitionPipeline, RuntimeError> {
    Ok(PartitionPipeline::new(create_fetcher(config)?, sink)
        .with_stager(create_stager(config)?)
        .with_chunk_size(config.pipeline.chunk_size)
        .with_metrics(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_is_optional() {
        let config = LoaderConfig::default();
        assert!(create_stager(&config).unwrap().is_none());
    }

    #[test]
    fn local_staging_from_toml() {
        let config = LoaderConfig::from_toml(
            r#"
            [staging]
            kind = "local"
            root = "/tmp/tripload-bucket"
            "#,
        )
        .unwrap();
        assert!(create_stager(&config).unwrap().is_some());
    }

    #[test]
    fn s3_staging_without_credentials_is_rejected() {
        let config = LoaderConfig::from_toml(
            r#"
            [staging]
            kind = "s3"
            bucket = "nyc-taxi"
            "#,
        )
        .unwrap();
        assert!(matches!(create_stager(&config), Err(RuntimeError::Settings(_))));
    }
}
