use std::collections::HashMap;
use std::io::Write;

use arrow::datatypes::SchemaRef;
use parquet::arrow::ArrowWriter;

use crate::table::Table;

use super::config::WriterConfig;
use super::error::WriterError;
use super::stats::WriterStats;

/// Streaming Parquet writer for tables of one fixed schema
///
/// The schema is taken from the first table written; every later table must
/// have the same column names and types in the same order.
pub struct CatalogWriter<W: Write + Send> {
    writer: ArrowWriter<W>,
    schema: SchemaRef,
    rows_written: usize,
}

impl<W: Write + Send> CatalogWriter<W> {
    /// Create a writer and write `first`
    pub fn new(
        writer: W,
        first: &Table,
        metadata: &HashMap<String, String>,
        config: &WriterConfig,
    ) -> Result<Self, WriterError> {
        let batch = first.to_record_batch()?;
        let schema = batch.schema();
        let props = config.to_writer_properties(first, metadata);
        let arrow_writer = ArrowWriter::try_new(writer, schema.clone(), Some(props))?;

        let mut writer = Self {
            writer: arrow_writer,
            schema,
            rows_written: 0,
        };
        if batch.num_rows() > 0 {
            writer.writer.write(&batch)?;
            writer.rows_written += batch.num_rows();
        }
        Ok(writer)
    }

    /// Append the rows of `table`
    pub fn write_table(&mut self, table: &Table) -> Result<(), WriterError> {
        if table.is_empty() {
            return Ok(());
        }
        let batch = table.to_record_batch()?;
        if batch.schema().fields() != self.schema.fields() {
            return Err(WriterError::InvalidData(format!(
                "table columns [{}] do not match the file schema",
                table.names().join(", ")
            )));
        }
        self.writer.write(&batch)?;
        self.rows_written += batch.num_rows();
        Ok(())
    }

    /// Rows written so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Write the footer and close the file
    pub fn finish(self) -> Result<WriterStats, WriterError> {
        let footer = self.writer.close()?;
        let bytes = footer.row_groups.iter().map(|rg| rg.total_byte_size as u64).sum();
        Ok(WriterStats {
            rows_written: self.rows_written,
            row_groups_written: footer.row_groups.len(),
            file_size_bytes: bytes,
        })
    }
}
