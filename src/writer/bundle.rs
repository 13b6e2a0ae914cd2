use std::collections::HashMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, info};
use ndarray::Array2;
use tempfile::NamedTempFile;

use crate::pipeline::PipelineOutput;
use crate::schema::{columns, empty_targets_table, empty_truth_table};
use crate::table::{Column, Table};

use super::{CatalogWriter, OutputStats, RunMetadata, WriterConfig, WriterError, WriterStats};

/// Targets file name
pub const TARGETS_FILE: &str = "targets.parquet";
/// Truth file name
pub const TRUTH_FILE: &str = "truth.parquet";
/// Spectra file name
pub const SPECTRA_FILE: &str = "spectra.parquet";

/// Object truth file name of `class`
pub fn objtruth_file(class: &str) -> String {
    format!("objtruth-{}.parquet", class.to_lowercase())
}

/// Write `table` to `path` through a temporary file in the same directory
///
/// The file only appears at `path` once it is complete.
pub fn write_table_atomic(
    path: &Path,
    table: &Table,
    metadata: &HashMap<String, String>,
    config: &WriterConfig,
) -> Result<WriterStats, WriterError> {
    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let temp = NamedTempFile::new_in(dir)?;
    let buffered = BufWriter::new(temp.reopen()?);
    let stats = CatalogWriter::new(buffered, table, metadata, config)?.finish()?;
    temp.persist(path).map_err(|e| WriterError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    debug!("{}: {}", path.display(), stats);
    Ok(stats)
}

/// One row per spectrum: `TARGETID` and a fixed-width `FLUX` list
pub fn spectra_table(targetid: &[i64], flux: &Array2<f32>) -> Result<Table, WriterError> {
    if targetid.len() != flux.nrows() {
        return Err(WriterError::InvalidData(format!(
            "{} spectra for {} targets",
            flux.nrows(),
            targetid.len()
        )));
    }
    let mut table = Table::new();
    table.push(columns::TARGETID, targetid.to_vec())?;
    table.push(
        "FLUX",
        Column::Float32List {
            width: flux.ncols(),
            values: flux.iter().copied().collect(),
        },
    )?;
    Ok(table)
}

/// Write a run's catalogs into `dir`
///
/// Produces `targets.parquet`, `truth.parquet`, one `objtruth-{class}.parquet`
/// per class with object truth, and `spectra.parquet` when spectra were made.
pub fn write_output(
    dir: &Path,
    output: &PipelineOutput,
    run: &RunMetadata,
    config: &WriterConfig,
) -> Result<OutputStats, WriterError> {
    fs::create_dir_all(dir)?;
    let metadata = run.to_parquet_metadata();
    let mut stats = OutputStats::default();
    let mut write = |name: String, table: &Table, metadata: &HashMap<String, String>| {
        let path: PathBuf = dir.join(name);
        let written = write_table_atomic(&path, table, metadata, config)?;
        stats.files.push((path, written));
        Ok::<(), WriterError>(())
    };

    // An empty run still produces files with the full column set
    if output.targets.num_columns() == 0 {
        write(TARGETS_FILE.to_string(), &empty_targets_table(0), &metadata)?;
        write(TRUTH_FILE.to_string(), &empty_truth_table(0, "").0, &metadata)?;
    } else {
        write(TARGETS_FILE.to_string(), &output.targets, &metadata)?;
        write(TRUTH_FILE.to_string(), &output.truth, &metadata)?;
    }
    for (class, table) in &output.objtruth {
        if table.num_columns() > 0 {
            write(objtruth_file(class), table, &metadata)?;
        }
    }
    if let Some(flux) = &output.flux {
        let targetid = if output.targets.is_empty() {
            Vec::new()
        } else {
            output.targets.i64(columns::TARGETID)?.to_vec()
        };
        let spectra = spectra_table(&targetid, flux)?;
        write(SPECTRA_FILE.to_string(), &spectra, &run.to_spectra_metadata(&output.wave)?)?;
    }

    info!("{}", stats);
    Ok(stats)
}
