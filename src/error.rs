//! Error types for Synheart Sense

use thiserror::Error;

/// Errors that can occur during signal processing
#[derive(Debug, Error)]
pub enum SenseError {
    #[error("Failed to parse signal payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Invalid state snapshot: {0}")]
    StateError(String),
}
