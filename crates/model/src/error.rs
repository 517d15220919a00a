use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unrecognized source format for `{0}` (expected .csv.gz, .csv or .parquet)")]
    Unrecognized(String),

    #[error("unknown dataset `{0}`")]
    UnknownDataset(String),

    #[error("invalid source template: {0}")]
    Template(#[from] TemplateError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder `{{{0}}}`")]
    UnknownPlaceholder(String),

    #[error("unterminated placeholder in `{0}`")]
    Unterminated(String),

    #[error("placeholder `{{{placeholder}}}` needs a {needed} partition key")]
    GranularityMismatch {
        placeholder: String,
        needed: &'static str,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid partition key `{0}`")]
    Invalid(String),

    #[error("partition key out of range after `{0}`")]
    Overflow(String),

    #[error("unknown granularity `{0}`")]
    UnknownGranularity(String),
}
