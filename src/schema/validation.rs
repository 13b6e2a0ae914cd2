use super::specs::{ColumnSpec, TARGETS_COLUMNS, TRUTH_COLUMNS};
use crate::table::Table;

/// Validates that a table carries every fixed-schema column with its declared type.
fn validate(table: &Table, specs: &[ColumnSpec]) -> Result<(), SchemaValidationError> {
    for spec in specs {
        match table.get(spec.name) {
            Some(column) => {
                if column.kind() != spec.kind {
                    return Err(SchemaValidationError::TypeMismatch {
                        column: spec.name.to_string(),
                        expected: spec.kind.to_string(),
                        found: column.kind().to_string(),
                    });
                }
            }
            None => return Err(SchemaValidationError::MissingColumn(spec.name.to_string())),
        }
    }
    Ok(())
}

/// Check a targets table against the fixed targets schema
pub fn validate_targets(table: &Table) -> Result<(), SchemaValidationError> {
    validate(table, TARGETS_COLUMNS)
}

/// Check a truth table against the fixed truth schema
pub fn validate_truth(table: &Table) -> Result<(), SchemaValidationError> {
    validate(table, TRUTH_COLUMNS)
}

/// Errors that can occur during schema validation
#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    /// A required column is missing from the table
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A column has an incorrect data type
    #[error("Type mismatch for column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the column with the type mismatch
        column: String,
        /// Expected data type
        expected: String,
        /// Actual data type found
        found: String,
    },
}
