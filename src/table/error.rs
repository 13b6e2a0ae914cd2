/// Errors raised by the in-memory column store
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Requested column does not exist
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Column exists but holds a different element type
    #[error("Column {column} has type {found}, expected {expected}")]
    TypeMismatch {
        /// Column name
        column: String,
        /// Type the caller asked for
        expected: String,
        /// Type actually stored
        found: String,
    },

    /// Column length disagrees with the table row count
    #[error("Column {column} has {found} rows, expected {expected}")]
    LengthMismatch {
        /// Column name
        column: String,
        /// Row count of the table
        expected: usize,
        /// Row count of the offending column
        found: usize,
    },

    /// Error from the Arrow library during conversion
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
