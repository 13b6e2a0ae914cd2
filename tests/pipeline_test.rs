//! End-to-end tests: Parquet mocks, maps and templates in, catalogs out

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mocktarget::makers::{make_maker, MakerClass, MakerContext, MakerSettings, WdTemplates};
use mocktarget::masks::{desi_mask, mws_mask};
use mocktarget::mock::io::read_parquet;
use mocktarget::mock::{decode_targetid, ReadRequest, SurveyContext};
use mocktarget::photometry::{FilterSet, PhotSystem};
use mocktarget::pipeline::{Pipeline, PipelineOptions, SourceSpec};
use mocktarget::sampling::ModelRegistry;
use mocktarget::schema::{validate_targets, validate_truth};
use mocktarget::sky::{healpix, ConstantDust, HealpixWeightMap};
use mocktarget::table::{Column, Table};
use mocktarget::templates::TemplateRegistry;
use mocktarget::writer::{
    write_output, write_table_atomic, RunMetadata, WriterConfig, KEY_SEED, KEY_WAVELENGTH,
    SPECTRA_FILE, TARGETS_FILE, TRUTH_FILE,
};
use tempfile::{tempdir, TempDir};

const NPIX_OUT: usize = 100;

fn write(path: &Path, table: &Table, metadata: &[(&str, String)]) {
    let metadata: HashMap<String, String> = metadata
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    write_table_atomic(path, table, &metadata, &WriterConfig::fast_write()).unwrap();
}

fn basewave() -> Vec<f64> {
    (0..2000).map(|i| 2000.0 + i as f64 * 30.0).collect()
}

/// Template `k` of a library: a power law f_lambda ~ lambda^-(k+1)
fn template_flux(k: usize) -> Vec<f64> {
    basewave().iter().map(|w| (w / 5000.0).powi(-(k as i32 + 1))).collect()
}

fn write_library(dir: &Path, name: &str, teff: [f32; 2]) {
    let wave = basewave();
    let mut table = Table::new();
    table.push("TEMPLATEID", vec![0i32, 1]).unwrap();
    table.push("TEFF", teff.to_vec()).unwrap();
    table.push("LOGG", vec![8.0f32, 8.0]).unwrap();
    let values: Vec<f32> = (0..2).flat_map(template_flux).map(|v| v as f32).collect();
    table
        .push("FLUX", Column::Float32List { width: wave.len(), values })
        .unwrap();
    let basewave = serde_json::to_string(&wave).unwrap();
    write(&dir.join(format!("{}.parquet", name)), &table, &[("basewave", basewave)]);
}

fn cells() -> [i64; 2] {
    [healpix::ang2pix(16, 10.0, 10.0), healpix::ang2pix(16, 200.0, 50.0)]
}

struct Survey {
    dir: TempDir,
    sky: PathBuf,
    wd: PathBuf,
}

/// Sky and white dwarf mocks, a two-cell weight map and WD templates
fn survey() -> Survey {
    let dir = tempdir().unwrap();

    let sky = dir.path().join("sky.parquet");
    let mut table = Table::new();
    table.push("RA", vec![10.0, 10.1, 200.0, 100.0]).unwrap();
    table.push("DEC", vec![10.0, 10.1, 50.0, -60.0]).unwrap();
    write(&sky, &table, &[]);

    let wd = dir.path().join("wd.parquet");
    let mut table = Table::new();
    table.push("RA", vec![10.05, 200.0]).unwrap();
    table.push("DEC", vec![10.05, 50.0]).unwrap();
    table.push("RADIALVELOCITY", vec![0.0, 0.0]).unwrap();
    table.push("G_SDSS", vec![18.0, 19.5]).unwrap();
    table.push("TEFF", vec![11_000.0, 24_000.0]).unwrap();
    table.push("LOGG", vec![8.0, 8.0]).unwrap();
    table
        .push("SPECTRALTYPE", Column::Utf8(vec!["DA".to_string(), "DB".to_string()]))
        .unwrap();
    write(&wd, &table, &[]);

    let mut weights = Table::new();
    weights.push("HEALPIX", cells().to_vec()).unwrap();
    weights.push("WEIGHT", vec![1.0, 0.8]).unwrap();
    write(&dir.path().join("weights.parquet"), &weights, &[("nside", "16".to_string())]);

    let templates = dir.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    write_library(&templates, "wd_da", [10_000.0, 25_000.0]);
    write_library(&templates, "wd_db", [12_000.0, 25_000.0]);

    Survey { dir, sky, wd }
}

impl Survey {
    fn context(&self) -> MakerContext {
        let weights =
            Arc::new(HealpixWeightMap::from_parquet(&self.dir.path().join("weights.parquet")).unwrap());
        let survey = SurveyContext::new(
            weights.clone(),
            weights,
            Arc::new(ConstantDust(0.0)),
            ModelRegistry::new(self.dir.path().join("gmm")),
        );
        let templates = TemplateRegistry::new(self.dir.path().join("templates")).unwrap();
        let wave: Vec<f64> = (0..NPIX_OUT).map(|i| 3600.0 + i as f64 * 60.0).collect();
        MakerContext::new(Arc::new(survey), templates).with_wave(wave)
    }

    fn sources(&self) -> Vec<SourceSpec> {
        vec![
            SourceSpec::new(MakerClass::Sky, self.sky.display().to_string()),
            SourceSpec::new(MakerClass::Wd, self.wd.display().to_string()),
        ]
    }
}

#[test]
fn test_run_and_write_catalogs() {
    let survey = survey();
    let options = PipelineOptions {
        seed: 7,
        ..PipelineOptions::default()
    };
    let output = Pipeline::new(survey.context(), survey.sources(), options)
        .unwrap()
        .run()
        .unwrap();
    // the sky position at dec -60 lies outside the weighted footprint
    assert_eq!(output.len(), 5);
    assert_eq!(output.stats.pixels_processed, 2);

    let out = survey.dir.path().join("out");
    let stats = write_output(&out, &output, &RunMetadata::new(7), &WriterConfig::default()).unwrap();
    assert_eq!(stats.rows_in(TARGETS_FILE), Some(5));
    assert!(out.join("objtruth-wd.parquet").exists());
    assert!(!out.join("objtruth-sky.parquet").exists());

    let targets = read_parquet(&out.join(TARGETS_FILE)).unwrap();
    let truth = read_parquet(&out.join(TRUTH_FILE)).unwrap().table;
    validate_targets(&targets.table).unwrap();
    validate_truth(&truth).unwrap();
    assert_eq!(targets.metadata.get(KEY_SEED).map(String::as_str), Some("7"));

    let targetid = targets.table.i64("TARGETID").unwrap();
    assert_eq!(targetid, truth.i64("TARGETID").unwrap());
    assert_eq!(targetid.iter().collect::<HashSet<_>>().len(), 5);
    let hpx = targets.table.i64("HPXPIXEL").unwrap();
    for (&id, &pix) in targetid.iter().zip(hpx) {
        assert!(cells().contains(&pix));
        assert_eq!(decode_targetid(id).brickid, pix);
    }

    let spectype = truth.utf8("TRUESPECTYPE").unwrap();
    let desi = targets.table.i64("DESI_TARGET").unwrap();
    let mws = targets.table.i64("MWS_TARGET").unwrap();
    for i in 0..spectype.len() {
        if spectype[i] == "SKY" {
            assert_ne!(desi[i] & desi_mask::SKY, 0);
        } else {
            assert_eq!(spectype[i], "WD");
            assert_ne!(mws[i] & mws_mask::MWS_WD, 0);
        }
    }

    let spectra = read_parquet(&out.join(SPECTRA_FILE)).unwrap();
    assert_eq!(spectra.json_f64(KEY_WAVELENGTH).unwrap().len(), NPIX_OUT);
    assert_eq!(spectra.table.i64("TARGETID").unwrap(), targetid);
    let (width, flux) = spectra.table.list("FLUX").unwrap();
    assert_eq!(width, NPIX_OUT);
    for (i, row) in flux.chunks(width).enumerate() {
        if spectype[i] == "SKY" {
            assert!(row.iter().all(|&f| f == 0.0));
        } else {
            assert!(row.iter().any(|&f| f > 0.0));
        }
    }
}

#[test]
fn test_wd_photometry_reproduces_input_magnitude() {
    let survey = survey();
    let ctx = survey.context();
    let maker = make_maker(MakerClass::Wd, ctx.clone(), &MakerSettings::default()).unwrap();
    let request = ReadRequest::new(survey.wd.display().to_string(), "WD").with_healpixels(16, vec![cells()[0]]);
    let records = maker.read(&request).unwrap().unwrap();
    assert_eq!(records.len(), 1);

    let templates = WdTemplates::load(&ctx).unwrap();
    let (meta, _) = templates
        .wd_template_photometry(&records.table, &[0], &[1], "DA", true)
        .unwrap();
    assert_eq!(meta.numeric("TEMPLATEID").unwrap(), vec![0.0]);

    // band flux / template maggies in the band == object flux in SDSS g / template maggies in SDSS g
    let filters = FilterSet::approximate();
    let wave = basewave();
    let flux = template_flux(0);
    let norm = filters.get("sdss2010-g").unwrap().ab_maggies(&wave, &flux);
    let maggies = filters.maggies(&PhotSystem::South.filters(), &wave, &flux).unwrap();
    let object_g = 10f64.powf(-0.4 * (18.0 - 22.5));
    for (band, m) in ["FLUX_G", "FLUX_R", "FLUX_Z", "FLUX_W1", "FLUX_W2"].iter().zip(maggies) {
        let got = meta.numeric(band).unwrap()[0];
        let expected = object_g * m / norm;
        assert!(
            ((got - expected) / expected).abs() < 1e-3,
            "{}: {} vs {}",
            band,
            got,
            expected
        );
    }
}

#[test]
fn test_empty_footprint_writes_empty_catalogs() {
    let survey = survey();
    let empty_cell = healpix::ang2pix(16, 100.0, -60.0);
    let options = PipelineOptions {
        healpixels: Some(vec![empty_cell]),
        ..PipelineOptions::default()
    };
    let output = Pipeline::new(survey.context(), survey.sources(), options)
        .unwrap()
        .run()
        .unwrap();
    assert!(output.is_empty());

    let out = survey.dir.path().join("out");
    write_output(&out, &output, &RunMetadata::new(1), &WriterConfig::default()).unwrap();
    let targets = read_parquet(&out.join(TARGETS_FILE)).unwrap().table;
    assert!(targets.is_empty());
    validate_targets(&targets).unwrap();
}
