use chrono::NaiveDate;
use model::{partition::Granularity, sink::WriteMode, source::resolver::DEFAULT_TABLE_TEMPLATE};
use serde::Deserialize;
use std::path::PathBuf;

pub const TLC_URL_TEMPLATE: &str = "https://github.com/DataTalksClub/nyc-tlc-data/releases/download/{dataset}/{dataset}_tripdata_{year}-{month}.csv.gz";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SinkSettings {
    /// Postgres connection string. Assembled from `PG*` variables when absent.
    pub url: Option<String>,
    pub namespace: String,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            url: None,
            namespace: "public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScratchSettings {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct StateSettings {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StagingSettings {
    Local {
        root: PathBuf,
    },
    S3 {
        bucket: String,
        #[serde(default = "default_region")]
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        path_style: bool,
        #[serde(default)]
        access_key: Option<String>,
        #[serde(default)]
        secret_key: Option<String>,
    },
}

fn default_region() -> String {
    "us-east-1".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleSettings {
    pub start: NaiveDate,
    pub granularity: Granularity,
    pub max_concurrency: usize,
    pub max_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            granularity: Granularity::Monthly,
            max_concurrency: 1,
            max_attempts: 2,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    pub chunk_size: usize,
    pub write_mode: WriteMode,
    pub fetch_timeout_secs: u64,
    /// Columns coerced to integers for every dataset.
    pub numeric_columns: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chunk_size: 100_000,
            write_mode: WriteMode::CreateOrReplace,
            fetch_timeout_secs: 120,
            numeric_columns: vec!["LocationID".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatasetSettings {
    pub name: String,
    pub url_template: String,
    #[serde(default = "default_table_template")]
    pub table_template: String,
    #[serde(default)]
    pub numeric_columns: Vec<String>,
}

impl DatasetSettings {
    pub fn tlc(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url_template: TLC_URL_TEMPLATE.to_string(),
            table_template: default_table_template(),
            numeric_columns: Vec::new(),
        }
    }
}

fn default_table_template() -> String {
    DEFAULT_TABLE_TEMPLATE.to_string()
}

pub(crate) fn default_datasets() -> Vec<DatasetSettings> {
    vec![DatasetSettings::tlc("green"), DatasetSettings::tlc("yellow")]
}
