//! Error types for tfplug

use crate::types::AttributePath;

/// Error type for tfplug operations
#[derive(Debug, thiserror::Error)]
pub enum TfplugError {
    #[error("Resource type not found: {0}")]
    ResourceNotFound(String),

    #[error("Data source type not found: {0}")]
    DataSourceNotFound(String),

    #[error("Provider not configured")]
    ProviderNotConfigured,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: AttributePath,
        expected: String,
        actual: String,
    },

    #[error("Attribute not found: {0}")]
    AttributeNotFound(AttributePath),

    #[error("Invalid list/set: too many elements: want 1, got {0}")]
    TooManyElements(usize),

    #[error("Invalid duration {0:?}")]
    InvalidDuration(String),

    #[error("{0}")]
    Custom(String),
}

/// Result type alias for tfplug operations
pub type Result<T> = std::result::Result<T, TfplugError>;

impl From<String> for TfplugError {
    fn from(s: String) -> Self {
        TfplugError::Custom(s)
    }
}

impl From<&str> for TfplugError {
    fn from(s: &str) -> Self {
        TfplugError::Custom(s.to_string())
    }
}

impl From<serde_json::Error> for TfplugError {
    fn from(e: serde_json::Error) -> Self {
        TfplugError::DecodingError(e.to_string())
    }
}
