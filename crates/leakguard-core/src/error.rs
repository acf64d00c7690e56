//! leakguard error types

use thiserror::Error;

/// Errors raised while reading policy documents.
///
/// Scanning, evaluation and redaction never fail; malformed policy values
/// that do parse are resolved to defaults instead.
#[derive(Error, Debug)]
pub enum Error {
    /// JSON policy document could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML policy document could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for leakguard operations
pub type Result<T> = std::result::Result<T, Error>;
