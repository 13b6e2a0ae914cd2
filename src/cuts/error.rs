use crate::table::TableError;

/// Errors raised by the selection engine
#[derive(Debug, thiserror::Error)]
pub enum CutsError {
    /// Cuts are only defined for imaging releases from DR6 on
    #[error("Selection cuts require RELEASE >= 6000, found {0}")]
    UnsupportedRelease(i64),

    /// Pre-DR7 input without Gaia proper motions
    #[error("No object has a proper motion; pre-DR7 input must be Gaia-matched")]
    MissingProperMotions,

    /// Random-forest model file is absent
    #[error("Random-forest model not found: {0}")]
    MissingForest(&'static str),

    /// Random-forest model file could not be parsed
    #[error("Invalid random-forest model {name}: {reason}")]
    InvalidForest {
        /// Model file name
        name: &'static str,
        /// Parser message
        reason: String,
    },

    /// Required input column missing or mistyped
    #[error("Table error: {0}")]
    Table(#[from] TableError),
}
