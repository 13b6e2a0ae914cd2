use std::path::PathBuf;

use crate::cuts::CutsError;
use crate::table::TableError;

/// Errors raised while reading mocks, sampling models and building targets
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// Required parameter missing or an environment placeholder is unresolved
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Referenced mock file or directory does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Unrecognised mock format tag
    #[error("Unsupported mock format: {0}")]
    UnsupportedFormat(String),

    /// Cross-referenced inputs disagree
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Table shapes or required columns do not line up
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Column store error
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Selection cut error
    #[error("Selection error: {0}")]
    Cuts(#[from] CutsError),
}

impl MockError {
    /// Shorthand for a [`MockError::ContractViolation`]
    pub fn violation(msg: impl Into<String>) -> Self {
        MockError::ContractViolation(msg.into())
    }

    /// Shorthand for a [`MockError::Consistency`]
    pub fn consistency(msg: impl Into<String>) -> Self {
        MockError::Consistency(msg.into())
    }
}
