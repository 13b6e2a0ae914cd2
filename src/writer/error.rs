use std::path::PathBuf;

/// Errors raised while writing output catalogs
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// Creating, writing or flushing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A finished temporary file could not be moved into place
    #[error("Cannot move finished file to {path}: {source}")]
    Persist {
        /// Destination of the file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Arrow rejected a record batch
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet encoding failed
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// A table could not be converted to a record batch
    #[error("Table error: {0}")]
    Table(#[from] crate::table::TableError),

    /// Footer metadata could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rows or columns that do not fit the file being written
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
