//! Error type for the retail EDA library.
//!
//! Only load-time failures are fatal. Analyzers never return errors for
//! degenerate data; they fall back to sentinels and zero-guarded ratios.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, EdaError>;

#[derive(Debug, Error)]
pub enum EdaError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("required columns missing from input: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("no usable records remain after cleaning")]
    EmptyDataset,
}

impl EdaError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EdaError::Io {
            path: path.into(),
            source,
        }
    }
}
