//! Error types for the Quire documentation index.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors returned by library functions.
#[derive(Debug, Error)]
pub enum QuireError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Index build timed out after {0:?}")]
    Timeout(Duration),

    /// The index failed to build; the wrapped error is shared with every
    /// caller that waited on the same build.
    #[error("Documentation unavailable: {0}")]
    Unavailable(Arc<QuireError>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
