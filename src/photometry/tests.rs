use super::*;
use crate::sky::ConstantDust;
use crate::table::Table;

fn records(n: usize) -> Table {
    let mut data = Table::new();
    data.push("RA", vec![10.0f64; n]).unwrap();
    data.push("DEC", vec![10.0f64; n]).unwrap();
    add_imaging_depth(&mut data).unwrap();
    data
}

fn truth_and_targets(n: usize) -> (Table, Table) {
    let (mut truth, _) = crate::schema::empty_truth_table(n, "");
    for band in Band::ALL {
        truth.fill(&format!("FLUX_{}", band.name()), 10.0).unwrap();
    }
    (truth, crate::schema::empty_targets_table(n))
}

#[test]
fn test_mw_transmission() {
    assert_eq!(mw_transmission(0.0, Band::G), 1.0);
    let expected = 10f64.powf(-0.4 * 3.214 * 0.1);
    assert!((mw_transmission(0.1, Band::G) - expected).abs() < 1e-12);

    let mut data = records(2);
    add_mw_transmission(&mut data, &ConstantDust(0.05)).unwrap();
    assert_eq!(data.f64("EBV").unwrap(), &[0.05, 0.05]);
    let w2 = data.f64("MW_TRANSMISSION_W2").unwrap()[0];
    assert!((w2 - 10f64.powf(-0.4 * 0.113 * 0.05)).abs() < 1e-12);
}

#[test]
fn test_imaging_depth_values() {
    let data = records(1);
    let psf_r = data.f64("PSFDEPTH_R").unwrap()[0];
    assert!((psf_r - (1.0 / mag_to_nanomaggies(23.61)).powi(2)).abs() / psf_r < 1e-12);
    let w1 = data.f64("PSFDEPTH_W1").unwrap()[0];
    assert!((w1 - 1.0 / (5.0 * mag_to_nanomaggies(22.3)).powi(2)).abs() / w1 < 1e-12);
    assert!(!data.contains("GALDEPTH_W1"));
}

#[test]
fn test_scatter_reproducible() {
    let data = records(5);
    let indices: Vec<usize> = (0..5).collect();
    let (truth, mut a) = truth_and_targets(5);
    let (_, mut b) = truth_and_targets(5);
    let (_, mut c) = truth_and_targets(5);
    scatter_photometry(&data, &truth, &mut a, &indices, true, 7).unwrap();
    scatter_photometry(&data, &truth, &mut b, &indices, true, 7).unwrap();
    scatter_photometry(&data, &truth, &mut c, &indices, true, 8).unwrap();
    assert_eq!(a.f32("FLUX_R").unwrap(), b.f32("FLUX_R").unwrap());
    assert_ne!(a.f32("FLUX_R").unwrap(), c.f32("FLUX_R").unwrap());
}

#[test]
fn test_scatter_ivar_matches_depth() {
    let data = records(3);
    let (truth, mut targets) = truth_and_targets(2);
    scatter_photometry(&data, &truth, &mut targets, &[2, 0], false, 1).unwrap();
    let galdepth_g = data.f64("GALDEPTH_G").unwrap()[0];
    let ivar = targets.f32("FLUX_IVAR_G").unwrap()[0] as f64;
    assert!((ivar - 25.0 * galdepth_g).abs() / ivar < 1e-5);
    let psfdepth_w1 = data.f64("PSFDEPTH_W1").unwrap()[0];
    let ivar_w1 = targets.f32("FLUX_IVAR_W1").unwrap()[1] as f64;
    assert!((ivar_w1 - 25.0 * psfdepth_w1).abs() / ivar_w1 < 1e-5);
}

#[test]
fn test_scatter_shape_mismatch() {
    let data = records(3);
    let (truth, mut targets) = truth_and_targets(2);
    let err = scatter_photometry(&data, &truth, &mut targets, &[0], true, 1).unwrap_err();
    assert!(matches!(err, crate::mock::MockError::ContractViolation(_)));
}

#[test]
fn test_flat_fnu_is_one_maggy() {
    let wave: Vec<f64> = (0..20_000).map(|i| 3000.0 + i as f64 * 3.0).collect();
    let flux: Vec<f64> = wave.iter().map(|w| 3.631e-20 * 2.997_924_58e18 / (w * w)).collect();
    let filters = FilterSet::approximate();
    let maggies = filters
        .maggies(&PhotSystem::South.filters()[..3], &wave, &flux)
        .unwrap();
    for m in maggies {
        assert!((m - 1.0).abs() < 1e-3, "maggies = {}", m);
    }
    assert!(filters.get("nope").is_err());
}

#[test]
fn test_magnitudes() {
    assert!((mag_to_nanomaggies(22.5) - 1.0).abs() < 1e-12);
    assert!((nanomaggies_to_mag(100.0) - 17.5).abs() < 1e-12);
    assert!(nanomaggies_to_mag(-1.0).is_nan());
    assert_eq!(PhotSystem::from_dec(40.0), PhotSystem::North);
    assert_eq!(PhotSystem::from_dec(32.125).code(), "S");
}
