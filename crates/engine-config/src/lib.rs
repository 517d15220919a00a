pub mod settings;

pub use settings::{LoaderConfig, error::SettingsError};
