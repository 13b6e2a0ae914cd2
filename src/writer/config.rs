use std::collections::HashMap;
use std::str::FromStr;

use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties, WriterPropertiesBuilder};
use parquet::format::KeyValue;
use parquet::schema::types::ColumnPath;

use crate::table::{ColumnKind, Table};

/// Compression codec of the output catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// ZSTD at the given level (1-22)
    Zstd(i32),
    /// Snappy
    Snappy,
    /// Stored as is
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::balanced()
    }
}

impl CompressionType {
    /// Highest ZSTD level
    pub fn max_compression() -> Self {
        Self::Zstd(22)
    }

    /// ZSTD level 3
    pub fn balanced() -> Self {
        Self::Zstd(3)
    }

    /// Snappy
    pub fn fast() -> Self {
        Self::Snappy
    }

    /// Compression named `name` (`zstd`, `snappy` or `none`), ZSTD at `level`
    pub fn from_name(name: &str, level: i32) -> Result<Self, String> {
        match name.to_lowercase().as_str() {
            "zstd" => Ok(Self::Zstd(level)),
            "snappy" => Ok(Self::Snappy),
            "none" | "uncompressed" => Ok(Self::Uncompressed),
            other => Err(format!(
                "Unknown compression {}; valid options are zstd, snappy, none",
                other
            )),
        }
    }

    fn codec(self) -> Compression {
        match self {
            Self::Zstd(level) => Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default()),
            Self::Snappy => Compression::SNAPPY,
            Self::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

impl FromStr for CompressionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s, 3)
    }
}

/// Layout and encoding options shared by every catalog file
///
/// Encodings follow the column types of the table being written: scalar
/// float columns (fluxes, inverse variances, coordinates) are byte-stream
/// split, string columns (class labels, brick names) are dictionary encoded.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Compression codec
    pub compression: CompressionType,
    /// Maximum rows per row group
    pub row_group_size: usize,
    /// Data page size limit in bytes
    pub data_page_size: usize,
    /// Write per-chunk min/max statistics
    pub write_statistics: bool,
    /// BYTE_STREAM_SPLIT for scalar float columns
    pub split_floats: bool,
    /// Dictionary encoding for string columns
    pub dictionary_strings: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::balanced(),
            row_group_size: 100_000,
            data_page_size: 1024 * 1024,
            write_statistics: true,
            split_floats: true,
            dictionary_strings: true,
        }
    }
}

impl WriterConfig {
    /// Smallest files: ZSTD 22 and large row groups
    pub fn max_compression() -> Self {
        Self {
            compression: CompressionType::max_compression(),
            row_group_size: 500_000,
            data_page_size: 2 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Quickest writes: Snappy, small row groups and plain floats
    pub fn fast_write() -> Self {
        Self {
            compression: CompressionType::fast(),
            row_group_size: 50_000,
            data_page_size: 512 * 1024,
            split_floats: false,
            ..Self::default()
        }
    }

    /// The default configuration
    pub fn balanced() -> Self {
        Self::default()
    }

    /// This configuration with another codec
    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Writer properties for `table` with `metadata` in the footer
    pub(super) fn to_writer_properties(
        &self,
        table: &Table,
        metadata: &HashMap<String, String>,
    ) -> WriterProperties {
        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };
        let mut builder = WriterProperties::builder()
            .set_compression(self.compression.codec())
            .set_data_page_size_limit(self.data_page_size)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size);

        for (name, column) in table.iter() {
            builder = self.column_encoding(builder, name, column.kind());
        }

        let mut footer: Vec<KeyValue> = metadata
            .iter()
            .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
            .collect();
        footer.sort_by(|a, b| a.key.cmp(&b.key));
        builder.set_key_value_metadata(Some(footer)).build()
    }

    fn column_encoding(
        &self,
        builder: WriterPropertiesBuilder,
        name: &str,
        kind: ColumnKind,
    ) -> WriterPropertiesBuilder {
        let path = ColumnPath::new(vec![name.to_string()]);
        match kind {
            ColumnKind::Float32 | ColumnKind::Float64 if self.split_floats => builder
                .set_column_dictionary_enabled(path.clone(), false)
                .set_column_encoding(path, Encoding::BYTE_STREAM_SPLIT),
            ColumnKind::Utf8 => builder.set_column_dictionary_enabled(path, self.dictionary_strings),
            _ => builder,
        }
    }
}
