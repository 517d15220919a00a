use thiserror::Error;

/// Errors raised when loading or validating loader configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is present but out of range or inconsistent.
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Missing setting: {0}")]
    Missing(String),

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),
}

impl SettingsError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
