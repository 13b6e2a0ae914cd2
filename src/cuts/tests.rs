use std::sync::Arc;

use proptest::prelude::*;

use super::*;
use crate::masks::{bgs_mask, desi_mask, mws_mask};
use crate::schema::{columns, empty_targets_table};
use crate::sky::is_south;
use crate::table::{Column, Table};

/// A passing one-pass LRG
const LRG: Fluxes = Fluxes { g: 1.0, r: 5.0, z: 20.0, w1: 50.0, w2: 30.0 };
/// A passing ELG in both systems
const ELG: Fluxes = Fluxes { g: 1.0, r: 1.0, z: 2.0, w1: 0.0, w2: 0.0 };
/// A passing colour-selected quasar
const QSO: Fluxes = Fluxes { g: 3.0, r: 3.0, z: 3.0, w1: 5.0, w2: 5.0 };

fn pick(fluxes: &[Fluxes], band: impl Fn(&Fluxes) -> f64) -> Column {
    Column::from(fluxes.iter().map(band).collect::<Vec<f64>>())
}

fn targets(fluxes: &[Fluxes], dec: &[f64]) -> Table {
    let n = fluxes.len();
    let mut t = empty_targets_table(n);
    t.assign("FLUX_G", &pick(fluxes, |f| f.g)).unwrap();
    t.assign("FLUX_R", &pick(fluxes, |f| f.r)).unwrap();
    t.assign("FLUX_Z", &pick(fluxes, |f| f.z)).unwrap();
    t.assign("FLUX_W1", &pick(fluxes, |f| f.w1)).unwrap();
    t.assign("FLUX_W2", &pick(fluxes, |f| f.w2)).unwrap();
    for band in columns::BANDS {
        t.fill(&columns::mw_transmission(band), 1.0).unwrap();
        t.fill(&columns::flux_ivar(band), 100.0).unwrap();
    }
    t.fill(columns::RELEASE, 9999.0).unwrap();
    t.fill_str(columns::TYPE, "EXP").unwrap();
    t.assign(columns::RA, &Column::from(vec![150.0; n])).unwrap();
    t.assign(columns::DEC, &Column::from(dec.to_vec())).unwrap();
    let photsys: Vec<String> = dec
        .iter()
        .map(|&d| if is_south(d) { "S" } else { "N" }.to_string())
        .collect();
    t.assign(columns::PHOTSYS, &Column::from(photsys)).unwrap();
    t
}

fn single_tree(threshold: f64) -> RandomForest {
    let json = format!(
        r#"{{"trees": [{{"feature": [10, -2, -2], "threshold": [{}, 0, 0],
            "left": [1, -1, -1], "right": [2, -1, -1], "value": [0.5, 1.0, 0.0]}}]}}"#,
        threshold
    );
    RandomForest::from_json_str(DR5_FOREST, &json).unwrap()
}

#[test]
fn test_complex_pow_real() {
    assert!((complex_pow_real(8.0, 1.0 / 3.0) - 2.0).abs() < 1e-12);
    assert_eq!(complex_pow_real(0.0, 1.7), 0.0);
    // (-8)^(1/3) on the principal branch is 1 + i sqrt(3), not -2
    assert!((complex_pow_real(-8.0, 1.0 / 3.0) - 1.0).abs() < 1e-12);
    let expected = (0.7 * std::f64::consts::PI).cos();
    assert!((complex_pow_real(-1.0, 0.7) - expected).abs() < 1e-12);
}

#[test]
fn test_lrg_scenario_fails_z_bright_limit() {
    let f = Fluxes::new(0.0, 100.0, 120.0, 50.0, 10.0);
    // z = 17.3 is brighter than z = 18, and r - z = 0.2 is bluer than 0.8
    assert!(f.z > 10f64.powf(0.4 * 2.1));
    assert!(f.z >= 10f64.powf(0.4 * (22.5 - 18.0)));
    assert!(f.z <= 10f64.powf(0.4 * 0.8) * f.r);
    assert!(!is_lrg_colors(&f, true));
    assert!(!is_lrg_colors(&f, false));
}

#[test]
fn test_lrg_pass_split() {
    let quality = LrgQuality { rsnr: 10.0, zsnr: 10.0, w1snr: 10.0, gflux_ivar: 1.0 };
    assert!(is_lrg_colors(&LRG, true));
    assert_eq!(is_lrg_pass(&LRG, &quality), (true, true, false));

    let faint = Fluxes { z: 9.0, r: 2.0, ..LRG };
    assert!(faint.z > 10f64.powf(0.84) && faint.z <= 10.0);
    assert_eq!(is_lrg_pass(&faint, &quality), (true, false, true));

    let noisy = LrgQuality { w1snr: 3.0, ..quality };
    assert!(!is_lrg(&LRG, &noisy));
}

#[test]
fn test_elg_north_requires_clean_pixels() {
    assert!(is_elg_south(&ELG));
    assert!(is_elg_north(&ELG, &AllMask::default()));
    let masked = AllMask { g: 0.0, r: 2.0, z: 0.0 };
    assert!(!is_elg_north(&ELG, &masked));
    assert!(is_elg(&ELG, &masked, true));
    assert!(!is_elg(&ELG, &masked, false));
}

#[test]
fn test_qso_colors_and_cuts() {
    assert!(is_qso_colors(&QSO, false));
    let no_wise = Fluxes { w1: 0.0, w2: 0.0, ..QSO };
    assert!(!is_qso_colors(&no_wise, false));
    assert!(is_qso_colors(&no_wise, true));

    let quality = QsoQuality { w1snr: 5.0, w2snr: 3.0, delta_chi2: 0.0, release: 9999, psflike: true };
    assert!(is_qso_cuts(&QSO, &quality, false));
    assert!(!is_qso_cuts(&QSO, &QsoQuality { psflike: false, ..quality }, false));
    assert!(!is_qso_cuts(&QSO, &QsoQuality { release: 4000, ..quality }, false));
    assert!(is_qso_cuts(&QSO, &QsoQuality { release: 4000, delta_chi2: 50.0, ..quality }, false));
}

#[test]
fn test_forest_features_and_thresholds() {
    let (features, r, ok) = forest_features(&Fluxes::new(10.0, 10.0, 10.0, 10.0, 10.0));
    assert!(ok);
    assert!((r - 20.0).abs() < 1e-12);
    assert!(features[..10].iter().all(|c| c.abs() < 1e-12));
    let (_, _, ok) = forest_features(&Fluxes::new(-1.0, 10.0, 10.0, 10.0, 10.0));
    assert!(!ok);

    assert_eq!(dr3_threshold(19.0), 0.95);
    assert!((dr3_threshold(21.0) - 0.87).abs() < 1e-12);
    assert_eq!(dr5_threshold(20.0), 0.88);
    assert!((dr5_threshold(21.0) - 0.875).abs() < 1e-12);
    assert!((dr5_threshold(22.0) - 0.8375).abs() < 1e-12);
    assert!((dr5_threshold(22.5) - 0.7165).abs() < 1e-12);
    assert!((dr5_highz_threshold(21.5) - 0.525).abs() < 1e-12);
}

#[test]
fn test_random_forest_selection() {
    let bright = Fluxes::new(10.0, 10.0, 10.0, 10.0, 10.0);
    let quality = QsoQuality { w1snr: 5.0, w2snr: 3.0, delta_chi2: 0.0, release: 9999, psflike: true };

    let empty = QsoForests::default();
    assert!(matches!(
        is_qso_randomforest(&bright, &quality, &empty),
        Err(CutsError::MissingForest(DR5_FOREST))
    ));
    // objects failing the preselection never need a forest
    let extended = QsoQuality { psflike: false, ..quality };
    assert!(!is_qso_randomforest(&bright, &extended, &empty).unwrap());

    let mut forests = QsoForests::default();
    forests.insert(DR5_FOREST, single_tree(21.0)).unwrap();
    forests.insert(DR5_HIGHZ_FOREST, single_tree(0.0)).unwrap();
    assert!(is_qso_randomforest(&bright, &quality, &forests).unwrap());
    let faint = Fluxes::new(3.0, 3.0, 3.0, 3.0, 3.0);
    assert!(!is_qso_randomforest(&faint, &quality, &forests).unwrap());
}

#[test]
fn test_malformed_forest_rejected() {
    let json = r#"{"trees": [{"feature": [10], "threshold": [1.0], "left": [4], "right": [5], "value": [0.0]}]}"#;
    assert!(matches!(
        RandomForest::from_json_str(DR3_FOREST, json),
        Err(CutsError::InvalidForest { .. })
    ));
    assert!(RandomForest::from_json_str(DR3_FOREST, r#"{"trees": []}"#).is_err());
}

#[test]
fn test_forests_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    let json = r#"{"trees": [{"feature": [-2], "threshold": [0.0], "left": [-1], "right": [-1], "value": [0.25]}]}"#;
    std::fs::write(dir.path().join(DR3_FOREST), json).unwrap();
    let forests = QsoForests::from_dir(dir.path()).unwrap();
    assert_eq!(forests.get(DR3_FOREST).unwrap().predict_proba(&[0.0; NFEATURES]), 0.25);
    assert!(matches!(forests.get(DR5_FOREST), Err(CutsError::MissingForest(_))));
}

#[test]
fn test_star_selections() {
    assert!(is_std_colors(&Fluxes::new(1.0, 1.1, 1.1, 0.0, 0.0)));
    assert!(!is_std_colors(&Fluxes::new(1.0, 0.9, 0.9, 0.0, 0.0)));
    assert!(is_mwsstar_colors(&Fluxes::new(1.0, 1.1, 0.0, 0.0, 0.0)));
    assert!(!is_mwsstar_colors(&Fluxes::new(1.1, 1.0, 0.0, 0.0, 0.0)));

    let wd = GaiaRow {
        matched: true,
        pmra: 60.0,
        pmdec: 80.0,
        parallax: 50.0,
        parallax_over_error: 10.0,
        gmag: 15.0,
        bpmag: 15.0,
        rpmag: 15.0,
        galb: 45.0,
        params_solved: 31,
        ..GaiaRow::default()
    };
    assert!(is_mws_wd(&wd));
    assert!(is_mws_nearby(&wd));
    assert!(!is_mws_wd(&GaiaRow { galb: 10.0, ..wd }));
    assert!(!is_mws_wd(&GaiaRow { matched: false, ..wd }));
    assert!(!is_mws_nearby(&GaiaRow { parallax: 5.0, ..wd }));

    let halo = GaiaRow { parallax: 0.5, pmra: 3.0, pmdec: 0.0, gmag: 18.5, ..wd };
    let f = Fluxes::new(1.0, 1.1, 1.1, 0.0, 0.0);
    assert!(is_std_gaia(&halo));
    assert!(!is_std_gaia(&GaiaRow { duplicated: true, ..halo }));
    let quality = BandQuality {
        fracflux: [0.0; 3],
        flux_ivar: [1.0; 3],
        nobs: [2; 3],
        fracmasked: [0.1; 3],
    };
    assert!(is_std(&f, &quality, &halo, true, false));
    assert!(!is_std(&f, &quality, &halo, true, true));
    assert!(!is_std(&f, &quality, &halo, false, false));
    assert!(!is_std(&f, &BandQuality { fracmasked: [0.0; 3], ..quality }, &halo, true, false));

    let main_star = Fluxes::new(50.0, 100.0, 100.0, 0.0, 0.0);
    let (main, red, blue) = is_mws_main(&main_star, 100.0, &halo, true);
    assert!(main && red && !blue);
    let (main, _, _) = is_mws_main(&main_star, 1.0, &halo, true);
    assert!(!main);
}

#[test]
fn test_bgs_selection() {
    let faint = 10f64.powf((22.5 - 19.7) / 2.5);
    assert!(is_bgs_faint(faint, false));
    assert!(!is_bgs_bright(faint, false));
    assert!(is_bgs_bright(100.0, false));
    assert!(!is_bgs_bright(100.0, true));
    assert!(!is_bgs_faint(faint, true));
}

#[test]
fn test_shift_photo_north() {
    assert_eq!(shift_photo_north(0.0, 0.0, 0.0), (0.0, 0.0, 0.0));
    let complex = shift_photo_north(2.0, 3.0, 4.0);
    let pure = shift_photo_north_pure(2.0, 3.0, 4.0);
    assert!((complex.0 - pure.0).abs() < 1e-12);
    assert!((complex.1 - pure.1).abs() < 1e-12);
    assert!((complex.2 - pure.2).abs() < 1e-12);
    // a negative colour stays finite in the complex form only
    assert!(shift_photo_north(-2.0, 3.0, 4.0).0.is_finite());
    assert!(shift_photo_north_pure(-2.0, 3.0, 4.0).0.is_nan());
}

#[test]
fn test_apply_cuts_rejects_old_releases() {
    let mut t = targets(&[LRG], &[0.0]);
    t.fill(columns::RELEASE, 5000.0).unwrap();
    assert!(matches!(
        apply_cuts(&t, &CutOptions::default()),
        Err(CutsError::UnsupportedRelease(5000))
    ));
    t.fill(columns::RELEASE, 6500.0).unwrap();
    assert!(matches!(
        apply_cuts(&t, &CutOptions::default()),
        Err(CutsError::MissingProperMotions)
    ));
    t.fill("PMRA", 1.0).unwrap();
    let options = CutOptions::new(&[TargetClass::Lrg]);
    assert!(apply_cuts(&t, &options).is_ok());
}

#[test]
fn test_apply_cuts_bits() {
    let mut t = targets(&[LRG, ELG, ELG], &[0.0, 50.0, 0.0]);
    t.fill("ALLMASK_R", 1.0).unwrap();
    let options = CutOptions::new(&[TargetClass::Lrg, TargetClass::Elg, TargetClass::Bgs]);
    let bits = apply_cuts(&t, &options).unwrap();

    let lrg = bits.desi_target[0];
    for name in ["LRG", "LRG_NORTH", "LRG_SOUTH", "LRG_1PASS", "LRG_1PASS_SOUTH"] {
        assert_ne!(lrg & desi_mask::mask(name).unwrap(), 0, "{}", name);
    }
    assert_eq!(lrg & desi_mask::LRG_2PASS, 0);

    // masked north pixels fail the north ELG cut, so the north object is not an ELG
    assert_eq!(bits.desi_target[1] & desi_mask::ELG, 0);
    assert_ne!(bits.desi_target[1] & desi_mask::ELG_SOUTH, 0);
    assert_eq!(bits.desi_target[1] & desi_mask::ELG_NORTH, 0);
    assert_ne!(bits.desi_target[2] & desi_mask::ELG, 0);

    assert!(bits.bgs_target.iter().all(|&b| b == 0));
    assert!(bits.mws_target.iter().all(|&m| m == 0));
}

#[test]
fn test_bgs_any_and_or_into() {
    let bright = Fluxes::new(50.0, 100.0, 150.0, 10.0, 10.0);
    let mut t = targets(&[bright], &[0.0]);
    let bits = apply_cuts(&t, &CutOptions::new(&[TargetClass::Bgs])).unwrap();
    assert_eq!(
        bits.bgs_target[0],
        bgs_mask::BGS_BRIGHT | bgs_mask::BGS_BRIGHT_NORTH | bgs_mask::BGS_BRIGHT_SOUTH
    );
    assert_eq!(bits.desi_target[0], desi_mask::BGS_ANY);

    t.fill(columns::DESI_TARGET, desi_mask::SKY as f64).unwrap();
    bits.or_into(&mut t).unwrap();
    assert_eq!(t.i64(columns::DESI_TARGET).unwrap()[0], desi_mask::SKY | desi_mask::BGS_ANY);
    assert_eq!(t.i64(columns::BGS_TARGET).unwrap()[0], bits.bgs_target[0]);

    let short = TargetBits::zeros(2);
    assert!(short.or_into(&mut t).is_err());
}

#[test]
fn test_mws_bits_from_table() {
    let star = Fluxes::new(50.0, 100.0, 100.0, 0.0, 0.0);
    let mut t = targets(&[star], &[40.0]);
    t.fill_str(columns::TYPE, "PSF").unwrap();
    t.fill(columns::REF_ID, 12.0).unwrap();
    t.fill("PARALLAX", 0.5).unwrap();
    t.fill("PMRA", 3.0).unwrap();
    t.fill("GAIA_PHOT_G_MEAN_MAG", 17.0).unwrap();
    let bits = apply_cuts(&t, &CutOptions::new(&[TargetClass::Mws])).unwrap();
    let expected = mws_mask::MWS_MAIN
        | mws_mask::MWS_MAIN_NORTH
        | mws_mask::MWS_MAIN_SOUTH
        | mws_mask::MWS_MAIN_RED
        | mws_mask::MWS_MAIN_RED_NORTH
        | mws_mask::MWS_MAIN_RED_SOUTH;
    assert_eq!(bits.mws_target[0], expected);
    assert_eq!(bits.desi_target[0], desi_mask::MWS_ANY);
}

#[test]
fn test_apply_cuts_random_forest_option() {
    let t = {
        let mut t = targets(&[Fluxes::new(10.0, 10.0, 10.0, 10.0, 10.0)], &[0.0]);
        t.fill_str(columns::TYPE, "PSF").unwrap();
        t
    };
    let options = CutOptions::new(&[TargetClass::Qso]);
    assert!(matches!(apply_cuts(&t, &options), Err(CutsError::MissingForest(_))));

    let mut forests = QsoForests::default();
    forests.insert(DR5_FOREST, single_tree(21.0)).unwrap();
    forests.insert(DR5_HIGHZ_FOREST, single_tree(0.0)).unwrap();
    let bits = apply_cuts(&t, &options.clone().with_forests(Arc::new(forests))).unwrap();
    assert_ne!(bits.desi_target[0] & desi_mask::QSO, 0);

    let colors = options.with_qso_selection(QsoSelection::ColorCuts);
    assert!(apply_cuts(&t, &colors).is_ok());
}

#[test]
fn test_target_class_names() {
    assert_eq!("qso".parse::<TargetClass>().unwrap(), TargetClass::Qso);
    assert!("nope".parse::<TargetClass>().is_err());
    assert_eq!("colorcuts".parse::<QsoSelection>().unwrap(), QsoSelection::ColorCuts);
    assert_eq!(CutOptions::default().tcnames.len(), 6);
    assert!(apply_cuts(&empty_targets_table(0), &CutOptions::default()).unwrap().is_empty());
}

proptest! {
    /// The combined ELG bit follows the variant of the object's own system
    #[test]
    fn elg_north_south_exclusive(
        g in 0.0f64..5.0,
        r in 0.0f64..5.0,
        z in 0.0f64..10.0,
        dec in -30.0f64..80.0,
        masked in any::<bool>(),
    ) {
        // the table stores fluxes as f32
        let f = Fluxes::new(g as f32 as f64, r as f32 as f64, z as f32 as f64, 0.0, 0.0);
        let mut t = targets(&[f], &[dec]);
        if masked {
            t.fill("ALLMASK_G", 1.0).unwrap();
        }
        let bits = apply_cuts(&t, &CutOptions::new(&[TargetClass::Elg])).unwrap();
        let allmask = AllMask { g: if masked { 1.0 } else { 0.0 }, r: 0.0, z: 0.0 };
        let expected = if is_south(dec) { is_elg_south(&f) } else { is_elg_north(&f, &allmask) };
        prop_assert_eq!(bits.desi_target[0] & desi_mask::ELG != 0, expected);
    }

    /// The principal-branch power agrees with powf on positive bases
    #[test]
    fn complex_pow_matches_powf(x in 1e-6f64..1e6, p in -3.0f64..3.0) {
        let a = complex_pow_real(x, p);
        let b = x.powf(p);
        prop_assert!((a - b).abs() <= 1e-12 * b.abs().max(1.0));
    }
}
