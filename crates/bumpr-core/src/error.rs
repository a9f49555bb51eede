//! Error types for configuration loading.

use thiserror::Error;

/// Errors that can occur when resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A provider produced values that do not fit [`Config`](crate::Config).
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;
