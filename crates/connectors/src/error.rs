use thiserror::Error;

/// Failures moving bytes from a source into scratch storage.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported URL scheme in `{0}`")]
    UnsupportedScheme(String),
}

/// Structurally invalid payload. A fresh download may fix it.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("source has no header row")]
    MissingHeader,

    #[error("malformed payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("table {0} does not exist")]
    TableNotFound(String),

    #[error("column `{column}` is not present in {table}")]
    UnknownColumn { table: String, column: String },

    #[error("column `{column}` of {table} is {expected}, cannot write {found}")]
    IncompatibleColumn {
        table: String,
        column: String,
        expected: String,
        found: String,
    },

    #[error("unsupported column type `{column}`: {type_name}")]
    UnsupportedType { column: String, type_name: String },

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store upload to {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("missing staging credential: {0}")]
    MissingCredential(&'static str),
}
