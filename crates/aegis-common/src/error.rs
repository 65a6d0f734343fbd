//! Error types for Aegis.

use thiserror::Error;

/// Top-level error type for Aegis operations.
#[derive(Debug, Error)]
pub enum AegisError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading and saving errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value was outside its accepted range
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field
        field: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type alias for Aegis operations.
pub type AegisResult<T> = Result<T, AegisError>;
