//! Integration tests for reading mock catalogs against file-backed survey maps

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use mocktarget::mock::{
    median, mock_density, GaussianFieldReader, MockReader, ReadRequest, SurveyContext,
};
use mocktarget::sampling::ModelRegistry;
use mocktarget::sky::{
    healpix, ConstantDust, DustMap, HealpixDustMap, HealpixWeightMap, PixelWeights,
};
use mocktarget::table::Table;
use mocktarget::writer::{write_table_atomic, WriterConfig};
use tempfile::tempdir;

fn write(path: &Path, table: &Table, metadata: &[(&str, &str)]) {
    let metadata: HashMap<String, String> = metadata
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    write_table_atomic(path, table, &metadata, &WriterConfig::fast_write()).unwrap();
}

/// Three objects; only the first lies in the weighted cell
fn write_mock(path: &Path) {
    let mut mock = Table::new();
    mock.push("ra", vec![10.0, 10.0, 350.0]).unwrap();
    mock.push("dec", vec![10.0, 40.0, -5.0]).unwrap();
    mock.push("z_cosmo", vec![1.0, 1.5, 2.0]).unwrap();
    mock.push("dz_rsd", vec![0.001, 0.0, 0.0]).unwrap();
    write(path, &mock, &[]);
}

/// Weight map at nside 16 with `weight` in the cell of (10, 10) and zero elsewhere
fn write_weights(path: &Path, weight: f64) {
    let mut map = Table::new();
    map.push("HEALPIX", vec![healpix::ang2pix(16, 10.0, 10.0)]).unwrap();
    map.push("WEIGHT", vec![weight]).unwrap();
    write(path, &map, &[("nside", "16")]);
}

fn context(weights: &Path) -> SurveyContext {
    let weights = Arc::new(HealpixWeightMap::from_parquet(weights).unwrap());
    SurveyContext::new(
        weights.clone(),
        weights,
        Arc::new(ConstantDust(0.0)),
        ModelRegistry::new("gmm"),
    )
}

#[test]
fn test_single_weighted_cell() {
    let dir = tempdir().unwrap();
    let mockfile = dir.path().join("qso.parquet");
    let weights = dir.path().join("weights.parquet");
    write_mock(&mockfile);
    write_weights(&weights, 0.5);

    let ctx = context(&weights);
    let request = ReadRequest::new(mockfile.display().to_string(), "QSO");
    let records = GaussianFieldReader::new().read(&ctx, &request).unwrap().unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records.table.numeric("WEIGHT").unwrap(), vec![2.0]);
    assert_eq!(records.table.numeric("RA").unwrap(), vec![10.0]);
    assert_eq!(records.table.utf8("BRICKNAME").unwrap()[0], ctx.bricks.brickname(10.0, 10.0));
    assert_eq!(records.table.i64("HEALPIX").unwrap()[0], healpix::ang2pix(16, 10.0, 10.0));
    let z = records.table.numeric("Z").unwrap()[0];
    assert!((z - 1.001).abs() < 1e-6);
}

#[test]
fn test_zmax_removes_everything() {
    let dir = tempdir().unwrap();
    let mockfile = dir.path().join("qso.parquet");
    let weights = dir.path().join("weights.parquet");
    write_mock(&mockfile);
    write_weights(&weights, 1.0);

    let mut request = ReadRequest::new(mockfile.display().to_string(), "QSO");
    request.zmax_qso = Some(0.5);
    let records = GaussianFieldReader::new().read(&context(&weights), &request).unwrap();
    assert!(records.is_none());
}

#[test]
fn test_density_with_weight_map() {
    let dir = tempdir().unwrap();
    let mockfile = dir.path().join("qso.parquet");
    let weights = dir.path().join("weights.parquet");
    write_mock(&mockfile);
    write_weights(&weights, 0.5);

    let map = HealpixWeightMap::from_parquet(&weights).unwrap();
    let density = mock_density(&mockfile, 16, &map).unwrap();
    assert_eq!(density.len(), 1);
    let expected = 2.0 / healpix::nside2pixarea(16);
    assert!((median(&density).unwrap() - expected).abs() < 1e-9);

    // degraded lookups average the children
    let coarse = map.weights(8);
    assert!((coarse[healpix::ang2pix(8, 10.0, 10.0) as usize] - 0.125).abs() < 1e-12);
}

#[test]
fn test_mock_density_recorded_on_request() {
    let dir = tempdir().unwrap();
    let mockfile = dir.path().join("qso.parquet");
    let weights = dir.path().join("weights.parquet");
    write_mock(&mockfile);
    write_weights(&weights, 0.5);

    let mut request = ReadRequest::new(mockfile.display().to_string(), "QSO");
    request.mock_density = true;
    let records = GaussianFieldReader::new()
        .read(&context(&weights), &request)
        .unwrap()
        .unwrap();
    let expected = 2.0 / healpix::nside2pixarea(16);
    assert!((records.mock_density.unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_dust_map_from_parquet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ebv.parquet");
    let npix = healpix::nside2npix(2);
    let mut map = Table::new();
    map.push("HEALPIX", (0..npix).collect::<Vec<i64>>()).unwrap();
    map.push("EBV", vec![0.1; npix as usize]).unwrap();
    write(&path, &map, &[]);

    let dust = HealpixDustMap::from_parquet(&path).unwrap();
    let ebv = dust.ebv(&[10.0, 200.0], &[10.0, -50.0]);
    assert!(ebv.iter().all(|&e| (e - 0.1).abs() < 1e-12));
}
