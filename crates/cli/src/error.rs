use connectors::error::SinkError;
use engine_config::SettingsError;
use engine_runtime::error::RuntimeError;
use model::error::FormatError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    Config(String),

    #[error("Failed to run: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Unresolvable source: {0}")]
    Format(#[from] FormatError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
