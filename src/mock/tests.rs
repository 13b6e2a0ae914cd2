use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use parquet::arrow::ArrowWriter;
use tempfile::tempdir;

use super::*;
use crate::sampling::ModelRegistry;
use crate::sky::{healpix, ConstantDust, HealpixMap, HealpixWeightMap};
use crate::table::{Column, Table};

fn write_mock(path: &Path, table: &Table) {
    let batch = table.to_record_batch().unwrap();
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn three_objects() -> Table {
    let mut table = Table::new();
    table.push("RA", vec![10.0, 10.0, 350.0]).unwrap();
    table.push("DEC", vec![10.0, 40.0, -5.0]).unwrap();
    table
}

/// Context whose only non-zero completeness is `weight` in the nside-16 cell at (ra, dec)
fn single_cell_context(ra: f64, dec: f64, weight: f64) -> SurveyContext {
    let mut values = vec![0.0; healpix::nside2npix(16) as usize];
    values[healpix::ang2pix(16, ra, dec) as usize] = weight;
    let map = Arc::new(HealpixWeightMap::from_map(HealpixMap::new(16, values).unwrap()));
    SurveyContext::new(
        map.clone(),
        map,
        Arc::new(ConstantDust(0.0)),
        ModelRegistry::new("unused"),
    )
}

#[test]
fn test_resolve_path() {
    std::env::set_var("MOCKTARGET_TEST_ROOT", "/data/mocks");
    let path = resolve_path("{MOCKTARGET_TEST_ROOT}/qso.parquet").unwrap();
    assert_eq!(path, Path::new("/data/mocks/qso.parquet"));

    let literal = resolve_path("a{{b}}c").unwrap();
    assert_eq!(literal, Path::new("a{b}c"));

    let err = resolve_path("{MOCKTARGET_TEST_UNSET_VARIABLE}/x").unwrap_err();
    assert!(matches!(err, MockError::Configuration(_)));
    assert!(matches!(resolve_path("{open"), Err(MockError::Configuration(_))));
}

#[test]
fn test_targetid_bits() {
    let id = encode_targetid(5, 3, 0, 1, 0).unwrap();
    assert_eq!(id, 5i64 | (3i64 << 22) | (1i64 << 58));
    let decoded = decode_targetid(id);
    assert_eq!(decoded.objid, 5);
    assert_eq!(decoded.brickid, 3);
    assert_eq!(decoded.mock, 1);
    assert_eq!(decoded.sky, 0);

    assert!(encode_targetid(1 << 22, 0, 0, 0, 0).is_err());
    assert!(encode_targetid(0, 0, 0, 2, 0).is_err());
    assert!(encode_targetid(-1, 0, 0, 0, 0).is_err());
}

#[test]
fn test_median() {
    assert_eq!(median(&[]), None);
    assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
}

#[test]
fn test_mock_density() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sky.parquet");
    write_mock(&path, &three_objects());

    let ctx = single_cell_context(10.0, 10.0, 0.5);
    let density = mock_density(&path, 16, ctx.weights.as_ref()).unwrap();
    assert_eq!(density.len(), 1);
    let expected = 2.0 / healpix::nside2pixarea(16);
    assert!((density[0] - expected).abs() < 1e-9);
}

#[test]
fn test_footprint_single_cell() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sky.parquet");
    write_mock(&path, &three_objects());

    let ctx = single_cell_context(10.0, 10.0, 0.5);
    let request = ReadRequest::new(path.display().to_string(), "SKY");
    let records = UniformSkyReader::new().read(&ctx, &request).unwrap().unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records.table.f64("WEIGHT").unwrap(), &[2.0]);
    assert_eq!(records.table.f64("RA").unwrap(), &[10.0]);
    assert_eq!(
        records.table.utf8("BRICKNAME").unwrap()[0],
        ctx.bricks.brickname(10.0, 10.0)
    );
    assert_eq!(records.table.i64("MOCKID").unwrap(), &[0]);
    assert_eq!(records.south().unwrap(), vec![true]);
    assert!(records.table.contains("MW_TRANSMISSION_W2"));
    assert!(records.table.contains("PSFDEPTH_Z"));
}

#[test]
fn test_footprint_weight_per_cell() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sky.parquet");
    let mut table = Table::new();
    table.push("RA", vec![10.0, 200.0]).unwrap();
    table.push("DEC", vec![10.0, -30.0]).unwrap();
    write_mock(&path, &table);

    let mut values = vec![0.0; healpix::nside2npix(16) as usize];
    values[healpix::ang2pix(16, 10.0, 10.0) as usize] = 0.25;
    values[healpix::ang2pix(16, 200.0, -30.0) as usize] = 0.8;
    let map = Arc::new(HealpixWeightMap::from_map(HealpixMap::new(16, values).unwrap()));
    let ctx = SurveyContext::new(map.clone(), map, Arc::new(ConstantDust(0.0)), ModelRegistry::new("unused"));

    let request = ReadRequest::new(path.display().to_string(), "SKY");
    let records = UniformSkyReader::new().read(&ctx, &request).unwrap().unwrap();
    assert_eq!(records.table.f64("WEIGHT").unwrap(), &[4.0, 1.0 / 0.8]);
}

#[test]
fn test_empty_footprint_is_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sky.parquet");
    write_mock(&path, &three_objects());

    let ctx = single_cell_context(10.0, 10.0, 0.5);
    let far = healpix::ang2pix(16, 180.0, 60.0);
    let request = ReadRequest::new(path.display().to_string(), "SKY").with_healpixels(16, vec![far]);
    assert!(UniformSkyReader::new().read(&ctx, &request).unwrap().is_none());
}

#[test]
fn test_missing_file_and_nside() {
    let ctx = SurveyContext::uniform("unused");
    let request = ReadRequest::new("/nonexistent/mock.parquet", "SKY");
    assert!(matches!(
        UniformSkyReader::new().read(&ctx, &request),
        Err(MockError::NotFound(_))
    ));

    let mut request = ReadRequest::new("/nonexistent/mock.parquet", "SKY");
    request.healpixels = Some(vec![0]);
    let dir = tempdir().unwrap();
    let path = dir.path().join("sky.parquet");
    write_mock(&path, &three_objects());
    request.mockfile = Some(path.display().to_string());
    assert!(matches!(
        UniformSkyReader::new().read(&ctx, &request),
        Err(MockError::Configuration(_))
    ));
}

#[test]
fn test_gaussianfield_zmax_is_strict() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("qso.parquet");
    let mut table = Table::new();
    table.push("RA", vec![10.0, 10.1, 10.2]).unwrap();
    table.push("DEC", vec![10.0, 10.1, 10.2]).unwrap();
    table.push("Z_COSMO", vec![1.0, 2.0, 1.5]).unwrap();
    table.push("DZ_RSD", vec![0.0, 0.1, 0.01]).unwrap();
    write_mock(&path, &table);

    let ctx = SurveyContext::uniform("unused");
    let mut request = ReadRequest::new(path.display().to_string(), "QSO");
    request.zmax_qso = Some(2.1);
    let records = GaussianFieldReader::new().read(&ctx, &request).unwrap().unwrap();
    assert_eq!(records.table.i64("MOCKID").unwrap(), &[0, 2]);
    let z = records.table.f32("Z").unwrap();
    assert!((z[1] - 1.51).abs() < 1e-6);
    assert_eq!(records.table.f32("Z_NORSD").unwrap(), &[1.0, 1.5]);

    request.zmax_qso = Some(0.5);
    assert!(GaussianFieldReader::new().read(&ctx, &request).unwrap().is_none());
}

#[test]
fn test_gaussianfield_zmax_compares_stored_precision() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("qso.parquet");
    let mut table = Table::new();
    table.push("RA", vec![10.0, 10.1]).unwrap();
    table.push("DEC", vec![10.0, 10.1]).unwrap();
    table.push("Z_COSMO", vec![2.0, 2.1 - 1e-9]).unwrap();
    table.push("DZ_RSD", vec![0.0, 0.0]).unwrap();
    write_mock(&path, &table);

    let ctx = SurveyContext::uniform("unused");
    let mut request = ReadRequest::new(path.display().to_string(), "QSO");
    request.zmax_qso = Some(2.1);
    let records = GaussianFieldReader::new().read(&ctx, &request).unwrap().unwrap();
    assert_eq!(records.table.i64("MOCKID").unwrap(), &[0]);
    assert!(records.table.f32("Z").unwrap().iter().all(|&z| z < 2.1f32));
}

#[test]
fn test_gaussianfield_sky_has_zero_redshift() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sky.parquet");
    let mut table = three_objects();
    table.push("Z_COSMO", vec![1.0, 2.0, 3.0]).unwrap();
    table.push("DZ_RSD", vec![0.1, 0.1, 0.1]).unwrap();
    write_mock(&path, &table);

    let ctx = SurveyContext::uniform("unused");
    let request = ReadRequest::new(path.display().to_string(), "SKY");
    let records = GaussianFieldReader::new().read(&ctx, &request).unwrap().unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.table.f32("Z").unwrap().iter().all(|&z| z == 0.0));
    assert!(records.table.f32("Z_NORSD").unwrap().iter().all(|&z| z == 0.0));
}

#[test]
fn test_reader_cache_reused() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sky.parquet");
    write_mock(&path, &three_objects());

    let ctx = SurveyContext::uniform("unused");
    let reader = UniformSkyReader::new();
    let request = ReadRequest::new(path.display().to_string(), "SKY");
    let first = reader.read(&ctx, &request).unwrap().unwrap();

    // the cached coordinates survive the file disappearing
    std::fs::write(&path, b"not parquet").unwrap();
    let second = reader.read(&ctx, &request).unwrap().unwrap();
    assert_eq!(first.table, second.table);
}

#[test]
fn test_wd_subtypes_and_redshift() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wd.parquet");
    let mut table = Table::new();
    table.push("RA", vec![10.0, 20.0]).unwrap();
    table.push("DEC", vec![10.0, 50.0]).unwrap();
    table.push("RADIALVELOCITY", vec![C_LIGHT * 1e-4, 0.0]).unwrap();
    table.push("G_SDSS", vec![18.0, 19.0]).unwrap();
    table.push("TEFF", vec![12000.0, 20000.0]).unwrap();
    table.push("LOGG", vec![8.0, 7.9]).unwrap();
    table
        .push("SPECTRALTYPE", Column::Utf8(vec!["da".to_string(), "DB ".to_string()]))
        .unwrap();
    write_mock(&path, &table);

    let ctx = SurveyContext::uniform("unused");
    let request = ReadRequest::new(path.display().to_string(), "WD");
    let records = MwsWdReader::new().read(&ctx, &request).unwrap().unwrap();
    assert_eq!(records.table.utf8("TEMPLATESUBTYPE").unwrap(), &["DA", "DB"]);
    assert!((records.table.f32("Z").unwrap()[0] - 1e-4).abs() < 1e-9);
    assert_eq!(records.table.utf8("MAGFILTER").unwrap()[0], "sdss2010-g");
    assert_eq!(records.south().unwrap(), vec![true, false]);
}

#[test]
fn test_gama_requires_healpixels() {
    let ctx = SurveyContext::uniform("unused");
    let request = ReadRequest::new("/nonexistent/gama.parquet", "BGS");
    assert!(matches!(
        GamaReader::new().read(&ctx, &request),
        Err(MockError::Configuration(_))
    ));
}

#[test]
fn test_galaxia_requires_nside() {
    let dir = tempdir().unwrap();
    let ctx = SurveyContext::uniform("unused");
    let mut request = ReadRequest::new(dir.path().display().to_string(), "MWS_MAIN");
    assert!(matches!(
        GalaxiaReader::new().read(&ctx, &request),
        Err(MockError::Configuration(_))
    ));
    request.nside_galaxia = Some(8);
    assert!(matches!(
        GalaxiaReader::new().read(&ctx, &request),
        Err(MockError::NotFound(_))
    ));
}

#[test]
fn test_galaxia_faintstar_fallback() {
    let dir = tempdir().unwrap();
    let nside_galaxia = 8;
    let pixnum = healpix::ang2pix(nside_galaxia, 10.0, 10.0);
    let pixdir = dir
        .path()
        .join(nside_galaxia.to_string())
        .join((pixnum / 100).to_string())
        .join(pixnum.to_string());
    std::fs::create_dir_all(&pixdir).unwrap();

    let mut table = Table::new();
    table.push("RA", vec![10.0, 10.01]).unwrap();
    table.push("DEC", vec![10.0, 10.01]).unwrap();
    table.push("V_HELIO", vec![0.0, C_LIGHT * 1e-4]).unwrap();
    table.push("SDSSR_TRUE_NODUST", vec![19.0, 21.0]).unwrap();
    table.push("SDSSR_OBS", vec![19.1, 21.1]).unwrap();
    table.push("TEFF", vec![3.7, 3.8]).unwrap();
    table.push("LOGG", vec![4.5, 4.4]).unwrap();
    table.push("FEH", vec![0.0, -0.5]).unwrap();
    let name = format!(
        "mock_superfaint_allsky_galaxia_desi_b10_cap_south-{}-{}.parquet",
        nside_galaxia, pixnum
    );
    write_mock(&pixdir.join(name), &table);

    let ctx = SurveyContext::uniform("unused");
    let cell = healpix::ang2pix(16, 10.0, 10.0);
    let mut request = ReadRequest::new(dir.path().display().to_string(), "FAINTSTAR")
        .with_healpixels(16, vec![cell]);
    request.nside_galaxia = Some(nside_galaxia);
    request.magcut = Some(20.0);
    let records = GalaxiaReader::new().read(&ctx, &request).unwrap().unwrap();

    assert_eq!(records.len(), 1);
    let mockid = records.table.i64("MOCKID").unwrap()[0];
    let decoded = decode_targetid(mockid);
    assert_eq!((decoded.objid, decoded.brickid, decoded.mock), (0, pixnum, 1));
    assert_eq!(records.table.i64("REF_ID").unwrap()[0], mockid);
    assert_eq!(records.table.f32("PARALLAX").unwrap()[0], 20.0);
    assert!((records.table.f32("TEFF").unwrap()[0] - 10f32.powf(3.7)).abs() < 1e-2);
    assert_eq!(records.table.utf8("TYPE").unwrap()[0], "PSF");
}

#[test]
fn test_unsupported_format() {
    let err = "fits_catalog".parse::<MockFormat>().unwrap_err();
    assert!(matches!(err, MockError::UnsupportedFormat(_)));
    assert_eq!("GaussianField".parse::<MockFormat>().unwrap(), MockFormat::GaussianField);
    assert_eq!(reader_for(MockFormat::MwsWd).format(), MockFormat::MwsWd);
}
