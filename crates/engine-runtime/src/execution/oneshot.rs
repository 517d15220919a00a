use crate::error::RuntimeError;
use async_trait::async_trait;
use engine_core::retry::RetryPolicy;
use engine_processing::{
    error::BoxError,
    pipeline::{LoadOutcome, LoadRequest, PartitionPipeline, StageObserver},
    retry::classify_pipeline_error,
};
use model::{
    partition::PartitionState,
    sink::{TableRef, WriteMode},
    source::SourceDescriptor,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A single unscheduled load of an explicit URL into an explicit table.
#[derive(Debug, Clone)]
pub struct OneShotLoad {
    pub url: String,
    pub table: TableRef,
    pub mode: WriteMode,
    pub numeric_columns: Vec<String>,
}

impl OneShotLoad {
    /// The table name doubles as the dataset name for staging paths.
    pub fn request(&self) -> Result<LoadRequest, RuntimeError> {
        Ok(LoadRequest {
            descriptor: SourceDescriptor::new(&self.table.name, &self.url, None)?,
            table: self.table.clone(),
            mode: self.mode,
            numeric_columns: self.numeric_columns.clone(),
        })
    }
}

struct StageLogger<'a> {
    table: &'a TableRef,
}

#[async_trait]
impl StageObserver for StageLogger<'_> {
    async fn on_stage(&self, stage: PartitionState) -> Result<(), BoxError> {
        debug!(table = %self.table, stage = %stage, "Load stage");
        Ok(())
    }
}

pub async fn run_once(
    pipeline: &PartitionPipeline,
    load: &OneShotLoad,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<LoadOutcome, RuntimeError> {
    let request = load.request()?;
    let observer = StageLogger { table: &load.table };

    info!(url = %load.url, table = %load.table, mode = %load.mode, "Starting load");
    let outcome = retry
        .run_until_cancelled(
            cancel,
            |_| pipeline.run(&request, &observer, cancel),
            classify_pipeline_error,
        )
        .await
        .map_err(|err| RuntimeError::Pipeline(err.into_inner()))?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::{fetch::HttpFetcher, scratch::ScratchDir, sink::MemorySink};
    use model::core::value::Value;
    use std::{sync::Arc, time::Duration};

    fn zones_csv(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("taxi+_zone_lookup.csv");
        std::fs::write(
            &path,
            "LocationID,Borough,Zone,service_zone\n\
             1,EWR,Newark Airport,EWR\n\
             2,Queens,Jamaica Bay,Boro Zone\n\
             NA,Unknown,NV,N/A\n",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn loads_zone_lookup_twice_with_same_result() {
        let dir = tempfile::tempdir().unwrap();
        let source = zones_csv(dir.path());
        let sink = MemorySink::new();
        let fetcher =
            HttpFetcher::new(ScratchDir::new(dir.path().join("scratch")).unwrap(), Duration::from_secs(5))
                .unwrap();
        let pipeline = PartitionPipeline::new(Arc::new(fetcher), Arc::new(sink.clone()));
        let load = OneShotLoad {
            url: format!("file://{}", source.display()),
            table: TableRef::new("public", "taxi_zone_lookup"),
            mode: WriteMode::CreateOrReplace,
            numeric_columns: vec!["LocationID".into()],
        };
        let retry = RetryPolicy::immediate(1);
        let cancel = CancellationToken::new();

        let first = run_once(&pipeline, &load, &retry, &cancel).await.unwrap();
        let after_first = sink.table(&load.table).unwrap();
        let second = run_once(&pipeline, &load, &retry, &cancel).await.unwrap();
        let after_second = sink.table(&load.table).unwrap();

        assert_eq!(first.rows, 3);
        assert_eq!(second.rows, 3);
        assert_eq!(after_first, after_second);
        assert_eq!(after_second.rows[2][0], Value::Null);
        assert_eq!(after_second.rows[0][0], Value::Int(1));
    }

    #[tokio::test]
    async fn unknown_format_fails_before_io() {
        let load = OneShotLoad {
            url: "https://example.test/zones.xlsx".into(),
            table: TableRef::new("public", "zones"),
            mode: WriteMode::CreateOrReplace,
            numeric_columns: Vec::new(),
        };
        assert!(matches!(load.request(), Err(RuntimeError::Format(_))));
    }
}
