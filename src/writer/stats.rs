use std::fmt;
use std::path::PathBuf;

/// Statistics from a completed write operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriterStats {
    /// Number of rows written to the file
    pub rows_written: usize,
    /// Number of Parquet row groups written
    pub row_groups_written: usize,
    /// Total uncompressed size of the row groups in bytes
    pub file_size_bytes: u64,
}

impl fmt::Display for WriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} rows in {} row groups",
            self.rows_written, self.row_groups_written
        )
    }
}

/// Statistics of every file in an output directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputStats {
    /// Written files in write order
    pub files: Vec<(PathBuf, WriterStats)>,
}

impl OutputStats {
    /// Rows written to the file named `name`
    pub fn rows_in(&self, name: &str) -> Option<usize> {
        self.files
            .iter()
            .find(|(path, _)| path.file_name().is_some_and(|f| f == name))
            .map(|(_, stats)| stats.rows_written)
    }
}

impl fmt::Display for OutputStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wrote {} files", self.files.len())?;
        for (path, stats) in &self.files {
            write!(f, "\n  {}: {}", path.display(), stats)?;
        }
        Ok(())
    }
}
