use crate::{core::utils::file_name_of, error::FormatError, partition::PartitionKey};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    /// Gzip-compressed delimited text (`.csv.gz`).
    CsvGzip,
    /// Plain delimited text (`.csv`).
    Csv,
    /// Columnar (`.parquet`).
    Parquet,
}

impl SourceFormat {
    /// Dispatch on the location's suffix. Query strings and fragments are
    /// ignored; matching is case-insensitive.
    pub fn from_location(location: &str) -> Result<Self, FormatError> {
        let name = file_name_of(location).to_ascii_lowercase();
        if name.ends_with(".csv.gz") {
            Ok(SourceFormat::CsvGzip)
        } else if name.ends_with(".csv") {
            Ok(SourceFormat::Csv)
        } else if name.ends_with(".parquet") {
            Ok(SourceFormat::Parquet)
        } else {
            Err(FormatError::Unrecognized(location.to_string()))
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SourceFormat::CsvGzip => "csv.gz",
            SourceFormat::Csv => "csv",
            SourceFormat::Parquet => "parquet",
        };
        f.write_str(tag)
    }
}

/// Where one partition's data lives and how it is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub dataset: String,
    pub format: SourceFormat,
    pub url: String,
    pub filename: String,
    pub partition: Option<PartitionKey>,
}

impl SourceDescriptor {
    pub fn new(
        dataset: impl Into<String>,
        url: impl Into<String>,
        partition: Option<PartitionKey>,
    ) -> Result<Self, FormatError> {
        let url = url.into();
        let format = SourceFormat::from_location(&url)?;
        let filename = file_name_of(&url).to_string();
        Ok(Self {
            dataset: dataset.into(),
            format,
            url,
            filename,
            partition,
        })
    }

    /// Object-store path for the staged copy: `raw/{dataset}/{year}/{filename}`.
    /// Unpartitioned sources drop the year segment.
    pub fn staged_path(&self) -> String {
        match &self.partition {
            Some(key) => format!("raw/{}/{}/{}", self.dataset, key.year(), self.filename),
            None => format!("raw/{}/{}", self.dataset, self.filename),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Granularity;

    #[test]
    fn dispatches_on_suffix() {
        assert_eq!(
            SourceFormat::from_location("https://x/y/green_tripdata_2020-01.csv.gz").unwrap(),
            SourceFormat::CsvGzip
        );
        assert_eq!(
            SourceFormat::from_location("https://x/taxi+_zone_lookup.csv").unwrap(),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::from_location("s3://b/yellow_tripdata_2021-01.PARQUET?versionId=3").unwrap(),
            SourceFormat::Parquet
        );
    }

    #[test]
    fn unknown_suffix_is_a_format_error() {
        let err = SourceFormat::from_location("https://x/data.json").unwrap_err();
        assert_eq!(err, FormatError::Unrecognized("https://x/data.json".into()));
        assert!(SourceFormat::from_location("https://x/data.gz").is_err());
        assert!(SourceFormat::from_location("https://x/csv.gz/?q=.csv.gz").is_err());
    }

    #[test]
    fn staged_path_uses_partition_year() {
        let key = PartitionKey::parse(Granularity::Monthly, "2020-01").unwrap();
        let descriptor = SourceDescriptor::new(
            "green",
            "https://x/green/green_tripdata_2020-01.csv.gz",
            Some(key),
        )
        .unwrap();
        assert_eq!(descriptor.filename, "green_tripdata_2020-01.csv.gz");
        assert_eq!(
            descriptor.staged_path(),
            "raw/green/2020/green_tripdata_2020-01.csv.gz"
        );

        let zones = SourceDescriptor::new("zones", "file:///data/zones.csv", None).unwrap();
        assert_eq!(zones.staged_path(), "raw/zones/zones.csv");
    }
}
