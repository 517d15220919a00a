#![allow(dead_code)]

use arrow::{
    array::{Float64Array, Int64Array, StringArray, TimestampMicrosecondArray},
    datatypes::{DataType, Field, Schema, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use connectors::{fetch::HttpFetcher, scratch::ScratchDir, sink::Sink};
use engine_config::LoaderConfig;
use engine_core::{
    metrics::Metrics,
    retry::RetryPolicy,
    state::{StateStore, sled_store::SledStateStore},
};
use engine_processing::pipeline::PartitionPipeline;
use engine_runtime::execution::{
    backfill::{BackfillExecutor, BackfillRequest},
    runner::PipelineRunner,
};
use flate2::{Compression, write::GzEncoder};
use parquet::arrow::ArrowWriter;
use std::{io::Write, path::Path, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const TRIP_HEADER: &str =
    "VendorID,lpep_pickup_datetime,lpep_dropoff_datetime,PULocationID,DOLocationID,trip_distance,fare_amount";

/// A green-trip style CSV body with `rows` data rows.
pub fn trip_csv(rows: usize) -> String {
    let mut out = String::with_capacity(rows * 72 + TRIP_HEADER.len());
    out.push_str(TRIP_HEADER);
    out.push('\n');
    for i in 0..rows {
        let minute = i % 60;
        out.push_str(&format!(
            "{},2020-01-01 00:{minute:02}:00,2020-01-01 01:{minute:02}:30,{},{},{}.5,{}.25\n",
            i % 2 + 1,
            i % 265 + 1,
            (i * 7) % 265 + 1,
            i % 20,
            i % 50 + 3,
        ));
    }
    out
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// A yellow-trip style parquet file with `rows` rows.
pub fn parquet_trips(rows: usize) -> Vec<u8> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("VendorID", DataType::Int64, true),
        Field::new(
            "tpep_pickup_datetime",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        ),
        Field::new("fare_amount", DataType::Float64, true),
        Field::new("store_and_fwd_flag", DataType::Utf8, true),
    ]));

    let base = NaiveDate::from_ymd_opt(2021, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_micros();

    let vendor: Vec<Option<i64>> = (0..rows).map(|i| Some((i % 2) as i64 + 1)).collect();
    let pickup: Vec<Option<i64>> = (0..rows).map(|i| Some(base + i as i64 * 60_000_000)).collect();
    let fare: Vec<Option<f64>> = (0..rows).map(|i| Some(i as f64 * 0.5)).collect();
    let flag: Vec<Option<&str>> = (0..rows).map(|i| (i % 3 != 0).then_some("N")).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vendor)),
            Arc::new(TimestampMicrosecondArray::from(pickup)),
            Arc::new(Float64Array::from(fare)),
            Arc::new(StringArray::from(flag)),
        ],
    )
    .expect("record batch");

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, None).expect("parquet writer");
    writer.write(&batch).expect("parquet write");
    writer.close().expect("parquet close");
    buf
}

/// Serve `body` at `route` with status 200.
pub async fn serve(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Answer the next `times` requests to `route` with `status`.
pub async fn fail_times(server: &MockServer, route: &str, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(times)
        .with_priority(1)
        .mount(server)
        .await;
}

/// Config with a single dataset mirrored by `server`.
pub fn mirror_config(server: &MockServer, dataset: &str, extension: &str) -> LoaderConfig {
    LoaderConfig::from_toml(&format!(
        r#"
        [sink]
        url = "postgres://unused@localhost/unused"
        namespace = "trips"

        [schedule]
        start = "2020-01-01"
        max_attempts = 2
        retry_base_delay_ms = 0

        [[datasets]]
        name = "{dataset}"
        url_template = "{uri}/trip-data/{{dataset}}_tripdata_{{key}}.{extension}"
        "#,
        uri = server.uri(),
    ))
    .expect("test config")
}

pub fn pipeline(scratch: &Path, sink: Arc<dyn Sink>, chunk_size: usize) -> PartitionPipeline {
    let fetcher = HttpFetcher::new(ScratchDir::new(scratch).expect("scratch"), Duration::from_secs(10))
        .expect("fetcher");
    PartitionPipeline::new(Arc::new(fetcher), sink).with_chunk_size(chunk_size)
}

pub fn state_store(dir: &Path) -> Arc<dyn StateStore> {
    Arc::new(SledStateStore::open(dir).expect("open sled"))
}

/// Scheduler over `config`'s first dataset, writing into `sink`.
pub fn scheduler(
    config: &LoaderConfig,
    scratch: &Path,
    sink: Arc<dyn Sink>,
    store: Arc<dyn StateStore>,
) -> BackfillExecutor {
    let dataset = &config.datasets[0].name;
    let metrics = Metrics::new();
    let runner = PipelineRunner::new(
        pipeline(scratch, sink, config.pipeline.chunk_size).with_metrics(metrics.clone()),
        config.resolver(),
        config.pipeline.write_mode,
    )
    .with_numeric_columns(dataset, config.numeric_columns(dataset));

    BackfillExecutor::new(Arc::new(runner), store, CancellationToken::new())
        .with_retry(RetryPolicy::immediate(config.schedule.max_attempts))
        .with_max_concurrency(config.schedule.max_concurrency)
        .with_metrics(metrics)
}

pub fn backfill_until(config: &LoaderConfig, until: NaiveDate, force: bool) -> BackfillRequest {
    BackfillRequest {
        dataset: config.datasets[0].name.clone(),
        start: config.schedule.start,
        until,
        granularity: config.schedule.granularity,
        force,
    }
}
