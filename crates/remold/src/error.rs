//! Error types for the Remold library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Remold operations.
#[derive(Debug, Error)]
pub enum RemoldError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export root directory does not exist or is not a directory.
    #[error("export root not found: {0}")]
    MissingRoot(PathBuf),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Table has no headers or no data rows; skipped, never fatal to a run.
    #[error("empty table: {0}")]
    EmptyTable(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Remold operations.
pub type Result<T> = std::result::Result<T, RemoldError>;
