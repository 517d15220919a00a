use crate::{
    error::FormatError,
    partition::PartitionKey,
    sink::TableRef,
    source::{descriptor::SourceDescriptor, template},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TABLE_TEMPLATE: &str = "{dataset}_tripdata_{compact}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub name: String,
    pub url_template: String,
    pub table_template: String,
}

impl DatasetSource {
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            table_template: DEFAULT_TABLE_TEMPLATE.to_string(),
        }
    }

    pub fn with_table_template(mut self, table_template: impl Into<String>) -> Self {
        self.table_template = table_template.into();
        self
    }
}

/// Maps a dataset and partition key to a concrete source and destination.
/// Pure: no I/O happens here, so every failure is fatal.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    datasets: Vec<DatasetSource>,
    namespace: String,
}

impl SourceResolver {
    pub fn new(datasets: Vec<DatasetSource>, namespace: impl Into<String>) -> Self {
        Self {
            datasets,
            namespace: namespace.into(),
        }
    }

    pub fn dataset(&self, name: &str) -> Result<&DatasetSource, FormatError> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| FormatError::UnknownDataset(name.to_string()))
    }

    pub fn resolve(&self, dataset: &str, key: &PartitionKey) -> Result<SourceDescriptor, FormatError> {
        let source = self.dataset(dataset)?;
        let url = template::render(&source.url_template, &source.name, key)?;
        SourceDescriptor::new(&source.name, url, Some(*key))
    }

    pub fn table(&self, dataset: &str, key: &PartitionKey) -> Result<TableRef, FormatError> {
        let source = self.dataset(dataset)?;
        let name = template::render(&source.table_template, &source.name, key)?;
        Ok(TableRef::new(&self.namespace, name))
    }
}
