//! # Catalog Writer Module
//!
//! This module writes the tables produced by a pipeline run to Parquet.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`CatalogWriter`] | Streams tables of one schema into a single file |
//! | [`write_output`] | Writes targets, truth, object truth and spectra into a directory |
//! | [`WriterConfig`] | Compression, row group and encoding settings |
//! | [`RunMetadata`] | Provenance stored in every file footer |
//!
//! ## Design Principles
//!
//! 1. **Self-Contained Files**: The creator, creation time, seed and run
//!    configuration live in the Parquet footer's key_value_metadata. The
//!    spectra file also carries its wavelength grid there.
//!
//! 2. **Atomic Output**: Each file is written to a temporary file in the
//!    output directory and renamed into place once closed.
//!
//! 3. **Column-Aware Encoding**: Label columns are dictionary encoded; flux
//!    columns use BYTE_STREAM_SPLIT.
//!
//! 4. **Configurable Compression**: Supports ZSTD (default), Snappy, and uncompressed.

mod bundle;
mod config;
mod error;
mod metadata;
mod stats;
mod writer_impl;

#[cfg(test)]
mod tests;

pub use bundle::{
    objtruth_file, spectra_table, write_output, write_table_atomic, SPECTRA_FILE, TARGETS_FILE,
    TRUTH_FILE,
};
pub use config::{CompressionType, WriterConfig};
pub use error::WriterError;
pub use metadata::{RunMetadata, KEY_CONFIG, KEY_CREATED, KEY_CREATOR, KEY_SEED, KEY_WAVELENGTH};
pub use stats::{OutputStats, WriterStats};
pub use writer_impl::CatalogWriter;
