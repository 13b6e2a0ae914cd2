//! Parquet input: whole-file reads with upper-cased column names and footer metadata.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::MockError;
use crate::table::Table;

const BATCH_SIZE: usize = 65_536;

/// A Parquet file loaded into memory with its key-value metadata
#[derive(Debug, Clone, Default)]
pub struct ParquetTable {
    /// Table contents, column names upper-cased
    pub table: Table,
    /// Footer key-value metadata
    pub metadata: HashMap<String, String>,
}

impl ParquetTable {
    /// Decode a JSON array of floats stored under `key`
    pub fn json_f64(&self, key: &str) -> Result<Vec<f64>, MockError> {
        let raw = self
            .metadata
            .get(key)
            .ok_or_else(|| MockError::violation(format!("missing {} metadata", key)))?;
        Ok(serde_json::from_str(raw)?)
    }
}

/// Read a whole Parquet file, upper-casing column names
pub fn read_parquet(path: &Path) -> Result<ParquetTable, MockError> {
    if !path.exists() {
        return Err(MockError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(BATCH_SIZE);

    let metadata = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .map(|kvs| {
            kvs.iter()
                .filter_map(|kv| kv.value.as_ref().map(|v| (kv.key.clone(), v.clone())))
                .collect()
        })
        .unwrap_or_default();

    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    let mut table = if batches.is_empty() {
        Table::from_record_batch(&RecordBatch::new_empty(schema))?
    } else {
        Table::from_record_batches(&batches)?
    };
    table.uppercase_names();
    log::debug!("Read {} rows from {}", table.len(), path.display());

    Ok(ParquetTable { table, metadata })
}

/// Number of rows in a Parquet file, from the footer only
pub fn parquet_num_rows(path: &Path) -> Result<usize, MockError> {
    if !path.exists() {
        return Err(MockError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    Ok(builder.metadata().file_metadata().num_rows() as usize)
}
