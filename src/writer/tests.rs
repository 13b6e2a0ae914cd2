use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use ndarray::Array2;
use tempfile::tempdir;

use super::*;
use crate::mock::io::read_parquet;
use crate::pipeline::{PipelineOutput, PipelineStats};
use crate::schema::{empty_targets_table, empty_truth_table, validate_targets};
use crate::table::Table;

fn targets(ids: &[i64]) -> Table {
    let mut table = empty_targets_table(ids.len());
    table.assign("TARGETID", &ids.to_vec().into()).unwrap();
    table
}

fn output(ids: &[i64], with_spectra: bool) -> PipelineOutput {
    let targets = targets(ids);
    let (mut truth, _) = empty_truth_table(ids.len(), "");
    truth.assign("TARGETID", &ids.to_vec().into()).unwrap();

    let mut wd = Table::new();
    wd.push("TARGETID", ids.to_vec()).unwrap();
    wd.push("TEFF", vec![12_000.0f32; ids.len()]).unwrap();
    let mut objtruth = BTreeMap::new();
    objtruth.insert("WD".to_string(), wd);

    let wave = Arc::new(vec![4000.0, 4001.0, 4002.0]);
    let flux = with_spectra.then(|| Array2::from_elem((ids.len(), wave.len()), 1.5f32));
    PipelineOutput {
        targets,
        truth,
        objtruth,
        flux,
        wave,
        stats: PipelineStats::default(),
    }
}

#[test]
fn test_write_output_files() -> Result<(), WriterError> {
    let dir = tempdir()?;
    let run = RunMetadata::new(7).with_config("[survey]\nnside = 16\n");
    let stats = write_output(dir.path(), &output(&[10, 11, 12], true), &run, &WriterConfig::default())?;

    assert_eq!(stats.files.len(), 4);
    assert_eq!(stats.rows_in(TARGETS_FILE), Some(3));
    assert_eq!(stats.rows_in(TRUTH_FILE), Some(3));
    assert_eq!(stats.rows_in("objtruth-wd.parquet"), Some(3));
    assert_eq!(stats.rows_in(SPECTRA_FILE), Some(3));

    let read = read_parquet(&dir.path().join(TARGETS_FILE)).unwrap();
    assert_eq!(read.table.i64("TARGETID").unwrap(), &[10, 11, 12]);
    validate_targets(&read.table).unwrap();
    assert_eq!(read.metadata.get(KEY_SEED).map(String::as_str), Some("7"));
    assert!(read.metadata.get(KEY_CREATOR).unwrap().starts_with("mocktarget v"));
    assert!(read.metadata.get(KEY_CONFIG).unwrap().contains("nside = 16"));
    assert!(chrono::DateTime::parse_from_rfc3339(read.metadata.get(KEY_CREATED).unwrap()).is_ok());
    Ok(())
}

#[test]
fn test_spectra_file_carries_wavelength() -> Result<(), WriterError> {
    let dir = tempdir()?;
    write_output(dir.path(), &output(&[1, 2], true), &RunMetadata::new(1), &WriterConfig::fast_write())?;

    let read = read_parquet(&dir.path().join(SPECTRA_FILE)).unwrap();
    assert_eq!(read.json_f64(KEY_WAVELENGTH).unwrap(), vec![4000.0, 4001.0, 4002.0]);
    let (width, values) = read.table.list("FLUX").unwrap();
    assert_eq!(width, 3);
    assert!(values.iter().all(|&v| v == 1.5));
    assert_eq!(read.table.i64("TARGETID").unwrap(), &[1, 2]);
    Ok(())
}

#[test]
fn test_no_spectra_file_without_flux() -> Result<(), WriterError> {
    let dir = tempdir()?;
    let stats = write_output(dir.path(), &output(&[1], false), &RunMetadata::new(1), &WriterConfig::default())?;
    assert_eq!(stats.files.len(), 3);
    assert!(!dir.path().join(SPECTRA_FILE).exists());
    Ok(())
}

#[test]
fn test_empty_run_writes_full_schema() -> Result<(), WriterError> {
    let dir = tempdir()?;
    let empty = PipelineOutput {
        targets: Table::new(),
        truth: Table::new(),
        objtruth: BTreeMap::new(),
        flux: Some(Array2::zeros((0, 3))),
        wave: Arc::new(vec![1.0, 2.0, 3.0]),
        stats: PipelineStats::default(),
    };
    let stats = write_output(dir.path(), &empty, &RunMetadata::new(1), &WriterConfig::default())?;
    assert_eq!(stats.rows_in(TARGETS_FILE), Some(0));

    let read = read_parquet(&dir.path().join(TARGETS_FILE)).unwrap();
    assert!(read.table.is_empty());
    assert!(read.table.contains("TARGETID"));
    assert!(read.table.contains("DESI_TARGET"));
    Ok(())
}

#[test]
fn test_spectra_table_row_mismatch() {
    let flux = Array2::<f32>::zeros((2, 4));
    let result = spectra_table(&[1], &flux);
    assert!(matches!(result, Err(WriterError::InvalidData(_))));
}

#[test]
fn test_catalog_writer_appends() -> Result<(), WriterError> {
    let buffer = Cursor::new(Vec::new());
    let mut writer = CatalogWriter::new(buffer, &targets(&[1, 2]), &Default::default(), &WriterConfig::default())?;
    writer.write_table(&targets(&[3]))?;
    writer.write_table(&Table::new())?;
    assert_eq!(writer.rows_written(), 3);
    let stats = writer.finish()?;
    assert_eq!(stats.rows_written, 3);
    assert!(stats.row_groups_written >= 1);
    Ok(())
}

#[test]
fn test_catalog_writer_rejects_other_schema() -> Result<(), WriterError> {
    let buffer = Cursor::new(Vec::new());
    let mut writer = CatalogWriter::new(buffer, &targets(&[1]), &Default::default(), &WriterConfig::default())?;
    let mut other = Table::new();
    other.push("TARGETID", vec![5i64]).unwrap();
    let result = writer.write_table(&other);
    assert!(matches!(result, Err(WriterError::InvalidData(_))));
    Ok(())
}

#[test]
fn test_compression_names() {
    assert_eq!("zstd".parse::<CompressionType>(), Ok(CompressionType::Zstd(3)));
    assert_eq!(CompressionType::from_name("ZSTD", 9), Ok(CompressionType::Zstd(9)));
    assert_eq!("snappy".parse::<CompressionType>(), Ok(CompressionType::Snappy));
    assert_eq!("none".parse::<CompressionType>(), Ok(CompressionType::Uncompressed));
    assert!("lz4".parse::<CompressionType>().is_err());
    assert_eq!(CompressionType::default(), CompressionType::balanced());
}

#[test]
fn test_config_presets() {
    let max = WriterConfig::max_compression();
    assert_eq!(max.compression, CompressionType::Zstd(22));
    assert!(max.row_group_size > WriterConfig::default().row_group_size);
    let fast = WriterConfig::fast_write().with_compression(CompressionType::Uncompressed);
    assert_eq!(fast.compression, CompressionType::Uncompressed);
    assert_eq!(fast.row_group_size, 50_000);
    assert!(!fast.split_floats);
}

#[test]
fn test_objtruth_file_name() {
    assert_eq!(objtruth_file("MWS_STAR"), "objtruth-mws_star.parquet");
}
