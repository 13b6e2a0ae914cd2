use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use ndarray::Array2;
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use tempfile::tempdir;

use super::*;
use crate::masks::{bgs_mask, contam_mask, desi_mask, mws_mask};
use crate::photometry::{add_imaging_depth, add_mw_transmission, FilterSet};
use crate::sky::ConstantDust;
use crate::table::{Column, Table};
use crate::templates::{BasisLibrary, TemplateRegistry};

const C_ANGSTROM: f64 = 2.997_924_58e18;

fn flat_fnu(wave: &[f64], scale: f64) -> Vec<f32> {
    wave.iter()
        .map(|w| (scale * 3.631e-20 * C_ANGSTROM / (w * w)) as f32)
        .collect()
}

fn basewave() -> Vec<f64> {
    (0..4000).map(|i| 1000.0 + i as f64 * 15.0).collect()
}

/// Flat f_nu basis with one template per row of `params`
fn library(name: &str, params: Table) -> BasisLibrary {
    let wave = basewave();
    let n = params.len();
    let mut flux = Vec::with_capacity(n * wave.len());
    for t in 0..n {
        flux.extend(flat_fnu(&wave, 1.0 + t as f64));
    }
    let flux = Array2::from_shape_vec((n, wave.len()), flux).unwrap();
    BasisLibrary::from_parts(name, wave, params, flux).unwrap()
}

fn registry() -> TemplateRegistry {
    let registry = TemplateRegistry::with_filters("unused", FilterSet::approximate());

    let mut star = Table::new();
    star.push("TEMPLATEID", vec![0i32, 1, 2]).unwrap();
    star.push("TEFF", vec![4000.0f32, 5500.0, 7000.0]).unwrap();
    star.push("LOGG", vec![4.5f32, 4.0, 3.5]).unwrap();
    star.push("FEH", vec![-1.0f32, 0.0, 0.2]).unwrap();
    registry.insert_library("star", library("star", star)).unwrap();

    for (name, teff) in [("wd_da", vec![10_000.0f32, 20_000.0]), ("wd_db", vec![12_000.0f32, 25_000.0])] {
        let mut wd = Table::new();
        wd.push("TEMPLATEID", vec![0i32, 1]).unwrap();
        wd.push("TEFF", teff).unwrap();
        wd.push("LOGG", vec![7.5f32, 8.5]).unwrap();
        registry.insert_library(name, library(name, wd)).unwrap();
    }

    let mut qso = Table::new();
    qso.push("TEMPLATEID", vec![0i32, 1]).unwrap();
    registry.insert_library("qso", library("qso", qso)).unwrap();

    let mut lrg = Table::new();
    lrg.push("TEMPLATEID", vec![0i32, 1]).unwrap();
    lrg.push("D4000", vec![1.6f32, 1.9]).unwrap();
    registry.insert_library("lrg", library("lrg", lrg)).unwrap();

    let mut elg = Table::new();
    elg.push("TEMPLATEID", vec![0i32, 1, 2]).unwrap();
    elg.push("Z", vec![0.8f32, 1.2, 1.5]).unwrap();
    elg.push("DECAM_G", vec![23.0f32, 23.5, 23.2]).unwrap();
    elg.push("DECAM_R", vec![22.5f32, 23.0, 23.0]).unwrap();
    elg.push("DECAM_Z", vec![22.0f32, 22.0, 22.9]).unwrap();
    registry.insert_library("elg", library("elg", elg)).unwrap();

    let mut bgs = Table::new();
    bgs.push("TEMPLATEID", vec![0i32, 1]).unwrap();
    bgs.push("Z", vec![0.1f32, 0.3]).unwrap();
    bgs.push(
        "SDSS_UGRIZ_ABSMAG_Z01",
        Column::Float32List {
            width: 5,
            values: vec![-18.0, -19.0, -20.0, -20.5, -21.0, -19.0, -20.5, -21.0, -21.5, -22.0],
        },
    )
    .unwrap();
    registry.insert_library("bgs", library("bgs", bgs)).unwrap();
    registry
}

/// Coarse output grid covering the optical bands
fn wave() -> Vec<f64> {
    (0..160).map(|i| 3600.0 + i as f64 * 40.0).collect()
}

fn context() -> MakerContext {
    MakerContext::new(Arc::new(SurveyContext::uniform("unused")), registry()).with_wave(wave())
}

/// Catalog rows alternating between the south and the north
fn records(n: usize) -> Table {
    let mut table = Table::new();
    table.push("MOCKID", (0..n as i64).map(|i| 1000 + i).collect::<Vec<_>>()).unwrap();
    table.push("RA", (0..n).map(|i| 150.0 + i as f64 * 0.01).collect::<Vec<_>>()).unwrap();
    table
        .push("DEC", (0..n).map(|i| if i % 2 == 0 { 10.0 } else { 40.0 }).collect::<Vec<_>>())
        .unwrap();
    table.push("SOUTH", (0..n).map(|i| i % 2 == 0).collect::<Vec<_>>()).unwrap();
    table.push("Z", vec![0.0f64; n]).unwrap();
    table.push("WEIGHT", vec![1.0f64; n]).unwrap();
    table.push("BRICKNAME", vec!["1500p100".to_string(); n]).unwrap();
    add_mw_transmission(&mut table, &ConstantDust(0.0)).unwrap();
    add_imaging_depth(&mut table).unwrap();
    table
}

fn source(target_name: &str, format: MockFormat, table: Table) -> SourceRecords {
    SourceRecords {
        target_name: target_name.to_string(),
        mockformat: format,
        nside: 64,
        table,
        mock_density: None,
    }
}

fn maker(class: MakerClass, ctx: MakerContext, settings: MakerSettings) -> Box<dyn TargetMaker> {
    make_maker(class, ctx, &settings).unwrap()
}

fn with_column(mut table: Table, name: &str, column: impl Into<Column>) -> Table {
    table.push(name, column.into()).unwrap();
    table
}

fn star_records(mags: &[f64], filter: &str) -> SourceRecords {
    let n = mags.len();
    let mut table = records(n);
    table.push("MAG", mags.to_vec()).unwrap();
    table.push("MAGFILTER", vec![filter.to_string(); n]).unwrap();
    table.push("TEFF", vec![5400.0f64; n]).unwrap();
    table.push("LOGG", vec![4.1f64; n]).unwrap();
    table.push("FEH", vec![0.1f64; n]).unwrap();
    source("MWS_MAIN", MockFormat::Galaxia, table)
}

/// Magnitude implied by an observed or true nanomaggy flux
fn mag_of(flux: f64) -> f64 {
    22.5 - 2.5 * flux.log10()
}

#[test]
fn test_class_names_parse() {
    for class in MakerClass::ALL {
        assert_eq!(class.name().parse::<MakerClass>().unwrap(), class);
        assert!(class.formats().contains(&class.default_format()));
    }
    assert_eq!("mws_nearby".parse::<MakerClass>().unwrap(), MakerClass::MwsNearby);
    assert!(matches!("QUASAR".parse::<MakerClass>(), Err(MockError::Configuration(_))));
    assert!(MakerClass::FaintStar.is_stellar());
    assert!(!MakerClass::Wd.is_stellar());
}

#[test]
fn test_unsupported_format_rejected() {
    let settings = MakerSettings {
        format: Some(MockFormat::Galaxia),
        ..MakerSettings::default()
    };
    let result = make_maker(MakerClass::Sky, context(), &settings);
    assert!(matches!(result, Err(MockError::UnsupportedFormat(_))));

    let settings = MakerSettings {
        format: Some(MockFormat::Gama),
        ..MakerSettings::default()
    };
    let bgs = make_maker(MakerClass::Bgs, context(), &settings).unwrap();
    assert_eq!(bgs.class(), MakerClass::Bgs);
    assert_eq!(bgs.base().format(), MockFormat::Gama);
}

#[test]
fn test_sky_has_zero_spectra_and_sky_bit() {
    let sky = maker(MakerClass::Sky, context(), MakerSettings::default());
    let data = source("SKY", MockFormat::UniformSky, records(4));

    let mut out = sky.make_spectra(&data, None, 7, false).unwrap();
    assert_eq!(out.len(), 4);
    assert_eq!(out.flux.dim(), (4, wave().len()));
    assert!(out.flux.iter().all(|&f| f == 0.0));
    assert!(out.truth.utf8("TRUESPECTYPE").unwrap().iter().all(|s| s == "SKY"));
    assert_eq!(out.truth.i64("MOCKID").unwrap(), &[1000, 1001, 1002, 1003]);

    sky.select_targets(&mut out.targets, &mut out.truth).unwrap();
    assert!(out
        .targets
        .i64("DESI_TARGET")
        .unwrap()
        .iter()
        .all(|&bits| bits & desi_mask::SKY != 0));
}

#[test]
fn test_no_spectra_drops_flux() {
    let sky = maker(MakerClass::Sky, context(), MakerSettings::default());
    let data = source("SKY", MockFormat::UniformSky, records(3));
    let out = sky.make_spectra(&data, Some(&[2, 0]), 7, true).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out.flux.nrows(), 0);
    assert!(!out.has_spectra());
    assert_eq!(out.truth.i64("MOCKID").unwrap(), &[1002, 1000]);
}

#[test]
fn test_empty_indices_give_empty_output() {
    let sky = maker(MakerClass::Sky, context(), MakerSettings::default());
    let data = source("SKY", MockFormat::UniformSky, records(3));
    let out = sky.make_spectra(&data, Some(&[]), 7, false).unwrap();
    assert!(out.is_empty());

    let bad = sky.make_spectra(&data, Some(&[5]), 7, false);
    assert!(bad.is_err());
}

#[test]
fn test_qso_uniform_magnitudes_are_reproducible() {
    let settings = MakerSettings {
        use_simqso: false,
        ..MakerSettings::default()
    };
    let qso = maker(MakerClass::Qso, context(), settings);
    let mut table = records(6);
    table.assign("Z", &Column::from(vec![2.0f64; 6])).unwrap();
    let data = source("QSO", MockFormat::GaussianField, table);

    let a = qso.make_spectra(&data, None, 11, false).unwrap();
    let b = qso.make_spectra(&data, None, 11, false).unwrap();
    assert_eq!(a.targets, b.targets);
    assert_eq!(a.truth, b.truth);
    assert_eq!(a.flux, b.flux);

    let mag = a.truth.numeric("MAG").unwrap();
    let filters = a.truth.utf8("MAGFILTER").unwrap();
    let truez = a.truth.numeric("TRUEZ").unwrap();
    let fluxr = a.truth.numeric("FLUX_R").unwrap();
    for i in 0..6 {
        assert!((20.0..22.5).contains(&mag[i]), "{}", mag[i]);
        let expected = if i % 2 == 0 { "decam2014-r" } else { "BASS-r" };
        assert_eq!(filters[i], expected);
        assert!((truez[i] - 2.0).abs() < 1e-6);
        assert!((mag_of(fluxr[i]) - mag[i]).abs() < 0.02);
    }
    assert!(a.truth.utf8("TRUESPECTYPE").unwrap().iter().all(|s| s == "QSO"));
}

#[test]
fn test_rows_keep_input_order_across_partitions() {
    let lrg = maker(MakerClass::Lrg, context(), MakerSettings::default());
    let mut table = records(5);
    table.assign("Z", &Column::from(vec![0.5, 0.6, 0.7, 0.8, 0.9])).unwrap();
    let table = with_column(table, "MAG", vec![20.0f64, 20.5, 21.0, 21.5, 22.0]);
    let table = with_column(table, "MAGFILTER", vec!["decam2014-z".to_string(); 5]);
    let data = source("LRG", MockFormat::GaussianField, table);

    let mut out = lrg.make_spectra(&data, Some(&[4, 1, 2]), 3, false).unwrap();
    assert_eq!(out.truth.i64("MOCKID").unwrap(), &[1004, 1001, 1002]);
    let truez = out.truth.numeric("TRUEZ").unwrap();
    for (got, want) in truez.iter().zip([0.9, 0.6, 0.7]) {
        assert!((got - want).abs() < 1e-6);
    }
    assert_eq!(out.targets.utf8("PHOTSYS").unwrap(), &["S", "N", "S"]);
    assert!(out.objtruth.numeric("VDISP").unwrap().iter().all(|&v| v > 0.0));
    assert!(out.truth.utf8("TEMPLATETYPE").unwrap().iter().all(|s| s == "LRG"));
    assert!(out.truth.utf8("TRUESPECTYPE").unwrap().iter().all(|s| s == "GALAXY"));

    lrg.select_targets(&mut out.targets, &mut out.truth).unwrap();
}

#[test]
fn test_elg_matched_on_redshift_and_colours() {
    let elg = maker(MakerClass::Elg, context(), MakerSettings::default());
    let mut table = records(2);
    table.assign("Z", &Column::from(vec![1.21, 1.49])).unwrap();
    let table = with_column(table, "GR", vec![0.49f64, 0.2]);
    let table = with_column(table, "RZ", vec![0.98f64, 0.1]);
    let table = with_column(table, "MAG", vec![22.5f64, 22.8]);
    let table = with_column(table, "MAGFILTER", vec!["decam2014-r".to_string(); 2]);
    let data = source("ELG", MockFormat::GaussianField, table);

    let out = elg.make_spectra(&data, None, 5, false).unwrap();
    assert_eq!(out.truth.i32("TEMPLATEID").unwrap(), &[1, 2]);
    let mag = out.truth.numeric("MAG").unwrap();
    let fluxr = out.truth.numeric("FLUX_R").unwrap();
    for i in 0..2 {
        assert!((mag_of(fluxr[i]) - mag[i]).abs() < 0.05);
    }
}

#[test]
fn test_bgs_matched_on_absolute_magnitude() {
    let settings = MakerSettings {
        format: Some(MockFormat::Mxxl),
        ..MakerSettings::default()
    };
    let bgs = maker(MakerClass::Bgs, context(), settings);
    let mut table = records(2);
    table.assign("Z", &Column::from(vec![0.29, 0.11])).unwrap();
    let table = with_column(table, "SDSS_ABSMAG_R01", vec![-21.1f64, -19.9]);
    let table = with_column(table, "SDSS_01GR", vec![0.45f64, 0.95]);
    let table = with_column(table, "MAG", vec![19.0f64, 19.3]);
    let table = with_column(table, "MAGFILTER", vec!["sdss2010-r".to_string(); 2]);
    let data = source("BGS", MockFormat::Mxxl, table);

    let mut out = bgs.make_spectra(&data, None, 9, false).unwrap();
    assert_eq!(out.truth.i32("TEMPLATEID").unwrap(), &[1, 0]);
    assert!(out.truth.utf8("TEMPLATETYPE").unwrap().iter().all(|s| s == "BGS"));

    bgs.select_targets(&mut out.targets, &mut out.truth).unwrap();
    let bits = out.targets.i64("BGS_TARGET").unwrap();
    assert!(bits.iter().all(|&b| b & bgs_mask::BGS_BRIGHT != 0), "{:?}", bits);
}

#[test]
fn test_mws_main_nearest_stellar_template() {
    let mws = maker(MakerClass::MwsMain, context(), MakerSettings::default());
    let data = star_records(&[18.0, 18.5], "sdss2010-r");

    let mut out = mws.make_spectra(&data, None, 21, false).unwrap();
    assert_eq!(out.truth.i32("TEMPLATEID").unwrap(), &[1, 1]);
    assert!(out.truth.utf8("TRUESPECTYPE").unwrap().iter().all(|s| s == "STAR"));
    assert_eq!(out.flux.nrows(), 2);

    mws.select_targets(&mut out.targets, &mut out.truth).unwrap();
    assert!(out.truth.i64("CONTAM_TARGET").unwrap().iter().all(|&c| c == 0));
}

#[test]
fn test_bright_star_flagged_as_bgs_contaminant() {
    let ctx = context().with_contaminants(true);
    let mws = maker(MakerClass::MwsMain, ctx, MakerSettings::default());
    let data = star_records(&[19.7], "sdss2010-r");

    let mut out = mws.make_spectra(&data, None, 21, true).unwrap();
    mws.select_targets(&mut out.targets, &mut out.truth).unwrap();
    let contam = out.truth.i64("CONTAM_TARGET").unwrap()[0];
    assert_ne!(contam & contam_mask::BGS_IS_STAR, 0);
    assert_ne!(out.targets.i64("BGS_TARGET").unwrap()[0] & bgs_mask::BGS_FAINT, 0);
    assert_ne!(out.targets.i64("DESI_TARGET").unwrap()[0] & desi_mask::BGS_ANY, 0);
}

#[test]
fn test_template_photometry_needs_known_filter() {
    let mws = maker(MakerClass::MwsMain, context(), MakerSettings::default());
    let data = star_records(&[18.0], "bessell-V");
    let result = mws.make_spectra(&data, None, 1, true);
    assert!(matches!(result, Err(MockError::Configuration(_))));
}

#[test]
fn test_faint_stars_dropped_without_contaminants() {
    let faint = maker(MakerClass::FaintStar, context(), MakerSettings::default());
    let data = star_records(&[19.7, 25.0], "sdss2010-r");
    let out = faint.make_spectra(&data, None, 4, false).unwrap();
    assert!(out.is_empty());
    assert_eq!(out.flux.nrows(), 0);
}

#[test]
fn test_faint_stars_keep_only_contaminants() {
    let faint = maker(MakerClass::FaintStar, context().with_contaminants(true), MakerSettings::default());
    let data = star_records(&[25.0, 19.7, 25.5], "sdss2010-r");

    let out = faint.make_spectra(&data, None, 4, false).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out.flux.nrows(), 1);
    assert_eq!(out.truth.i64("MOCKID").unwrap(), &[1001]);
    assert_ne!(out.truth.i64("CONTAM_TARGET").unwrap()[0] & contam_mask::BGS_IS_STAR, 0);
    let fluxr = out.targets.numeric("FLUX_R").unwrap()[0];
    assert!((mag_of(fluxr) - 19.7).abs() < 0.05);
}

#[test]
fn test_faint_star_targets_carry_depths_and_wise_noise() {
    let faint = maker(MakerClass::FaintStar, context().with_contaminants(true), MakerSettings::default());
    let data = star_records(&[19.5, 19.7], "sdss2010-r");

    let out = faint.make_spectra(&data, None, 9, true).unwrap();
    assert_eq!(out.len(), 2);
    for band in ["G", "R", "Z"] {
        let depth = out.targets.numeric(&format!("PSFDEPTH_{band}")).unwrap();
        assert!(depth.iter().all(|&d| d > 0.0));
    }
    let ivar = out.targets.numeric("FLUX_IVAR_W1").unwrap();
    assert!(ivar.iter().all(|&v| v > 0.0 && v.is_finite()));
}

#[test]
fn test_mws_nearby_selects_everything() {
    let nearby = maker(MakerClass::MwsNearby, context(), MakerSettings::default());
    let mut data = star_records(&[12.0, 14.0, 15.0], "sdss2010-g");
    data.mockformat = MockFormat::Mws100pc;
    data.table
        .push(
            "TEMPLATESUBTYPE",
            vec!["K".to_string(), "M".to_string(), "WD".to_string()],
        )
        .unwrap();

    let mut out = nearby.make_spectra(&data, None, 2, true).unwrap();
    assert_eq!(out.truth.utf8("TEMPLATESUBTYPE").unwrap(), &["K", "M", "WD"]);
    nearby.select_targets(&mut out.targets, &mut out.truth).unwrap();
    for (&desi, &mws) in out
        .targets
        .i64("DESI_TARGET")
        .unwrap()
        .iter()
        .zip(out.targets.i64("MWS_TARGET").unwrap())
    {
        assert_ne!(desi & desi_mask::MWS_ANY, 0);
        assert_ne!(mws & mws_mask::MWS_NEARBY, 0);
    }
}

fn wd_records() -> SourceRecords {
    let mut table = records(4);
    table.push("MAG", vec![16.0f64, 19.5, 21.0, 17.0]).unwrap();
    table.push("MAGFILTER", vec!["sdss2010-g".to_string(); 4]).unwrap();
    table.push("TEFF", vec![11_000.0f64, 24_000.0, 19_000.0, 30_000.0]).unwrap();
    table.push("LOGG", vec![7.6f64, 8.4, 8.0, 8.0]).unwrap();
    table
        .push(
            "TEMPLATESUBTYPE",
            vec!["DA".to_string(), "DB".to_string(), "DA".to_string(), "DC".to_string()],
        )
        .unwrap();
    source("WD", MockFormat::MwsWd, table)
}

#[test]
fn test_wd_subtypes_and_selection() {
    let wd = maker(MakerClass::Wd, context(), MakerSettings::default());
    let data = wd_records();

    let mut out = wd.make_spectra(&data, None, 8, false).unwrap();
    assert_eq!(out.len(), 4);
    assert_eq!(out.truth.utf8("TEMPLATESUBTYPE").unwrap(), &["DA", "DB", "DA", "DC"]);
    let tid = out.truth.i32("TEMPLATEID").unwrap();
    assert_eq!(&tid[..3], &[0, 1, 1]);
    assert!(out.flux.row(3).iter().all(|&f| f == 0.0));
    assert!(out.flux.row(0).iter().any(|&f| f > 0.0));

    wd.select_targets(&mut out.targets, &mut out.truth).unwrap();
    let desi = out.targets.i64("DESI_TARGET").unwrap();
    let mws = out.targets.i64("MWS_TARGET").unwrap();
    assert_eq!(
        mws.iter().map(|&b| b & mws_mask::MWS_WD != 0).collect::<Vec<_>>(),
        vec![true, true, false, true]
    );
    assert_eq!(
        desi.iter().map(|&b| b & desi_mask::STD_WD != 0).collect::<Vec<_>>(),
        vec![true, false, false, true]
    );
}

#[test]
fn test_wd_calib_only_skips_mws() {
    let settings = MakerSettings {
        calib_only: true,
        ..MakerSettings::default()
    };
    let wd = maker(MakerClass::Wd, context(), settings);
    let mut out = wd.make_spectra(&wd_records(), None, 8, true).unwrap();
    wd.select_targets(&mut out.targets, &mut out.truth).unwrap();
    assert!(out.targets.i64("MWS_TARGET").unwrap().iter().all(|&b| b == 0));
    assert_ne!(out.targets.i64("DESI_TARGET").unwrap()[0] & desi_mask::STD_WD, 0);
}

#[test]
fn test_wd_template_photometry() {
    let templates = WdTemplates::load(&context()).unwrap();
    let data = wd_records();
    let (meta, objmeta) = templates
        .wd_template_photometry(&data.table, &[0, 2], &[1, 2], "DA", true)
        .unwrap();
    assert_eq!(meta.utf8("SUBTYPE").unwrap(), &["DA", "DA"]);
    assert_eq!(meta.i32("TEMPLATEID").unwrap(), &[0, 1]);
    assert_eq!(objmeta.numeric("TEFF").unwrap(), vec![11_000.0, 19_000.0]);
    let mags = [16.0, 21.0];
    for band in ["FLUX_G", "FLUX_R", "FLUX_Z", "FLUX_W1", "FLUX_W2"] {
        let flux = meta.numeric(band).unwrap();
        for (f, m) in flux.iter().zip(mags) {
            assert!((mag_of(*f) - m).abs() < 0.02, "{} {}", band, f);
        }
    }

    let unknown = templates.wd_template_photometry(&data.table, &[3], &[1], "DC", true);
    assert!(matches!(unknown, Err(MockError::Configuration(_))));
}

fn write_skewers(path: &Path, mockid: Vec<i64>, z: Vec<f64>, ra: Vec<f64>, dec: Vec<f64>) {
    let n = mockid.len();
    let mut table = Table::new();
    table.push("MOCKID", mockid).unwrap();
    table.push("Z", z).unwrap();
    table.push("RA", ra).unwrap();
    table.push("DEC", dec).unwrap();
    table
        .push("TRANSMISSION", Column::Float32List { width: 2, values: vec![0.0; 2 * n] })
        .unwrap();
    let batch = table.to_record_batch().unwrap();
    let props = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![KeyValue::new(
            "wavelength".to_string(),
            "[3000.0, 4750.0]".to_string(),
        )]))
        .build();
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

#[test]
fn test_lya_spectra_absorbed_by_skewers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("transmission-16-0.parquet");

    let mut table = records(2);
    table.assign("Z", &Column::from(vec![2.5, 2.6])).unwrap();
    write_skewers(
        &path,
        vec![1001, 1000],
        vec![2.6, 2.5],
        table.numeric("RA").unwrap().into_iter().rev().collect(),
        table.numeric("DEC").unwrap().into_iter().rev().collect(),
    );
    table
        .push("LYAFILES", vec![path.to_string_lossy().into_owned(); 2])
        .unwrap();
    let data = source("LYA", MockFormat::CoLoRe, table);

    let settings = MakerSettings {
        use_simqso: false,
        ..MakerSettings::default()
    };
    let lya = maker(MakerClass::Lya, context(), settings);
    let out = lya.make_spectra(&data, None, 13, false).unwrap();

    assert_eq!(out.truth.utf8("TEMPLATESUBTYPE").unwrap(), &["LYA", "LYA"]);
    let g = out.truth.numeric("FLUX_G").unwrap();
    let r = out.truth.numeric("FLUX_R").unwrap();
    for i in 0..2 {
        assert!(g[i] < 0.7 * r[i], "g={} r={}", g[i], r[i]);
    }
    let wave = wave();
    let blue = wave.iter().position(|&w| w > 4000.0).unwrap();
    assert!(out.flux.column(blue).iter().all(|&f| f == 0.0));
}
