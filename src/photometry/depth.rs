use crate::schema::columns;
use crate::table::{Table, TableError};

/// 5-sigma point-source depth in g, r, z (AB mag)
pub const PSF_DEPTH_MAG: [f64; 3] = [24.65, 23.61, 22.84];
/// 5-sigma extended-source depth in g, r, z (AB mag)
pub const GAL_DEPTH_MAG: [f64; 3] = [24.7, 23.9, 23.0];
/// 1-sigma depth in W1, W2 (AB mag)
pub const WISE_DEPTH_MAG: [f64; 2] = [22.3, 23.8];

fn five_sigma_ivar(mag: f64) -> f64 {
    (1.0 / 10f64.powf(-0.4 * (mag - 22.5))).powi(2)
}

fn wise_ivar(mag: f64) -> f64 {
    1.0 / (5.0 * 10f64.powf(-0.4 * (mag - 22.5))).powi(2)
}

/// Add constant `PSFDEPTH_*` and `GALDEPTH_*` columns (5-sigma inverse variance)
///
/// The depths are fixed placeholders, not a per-pixel model.
pub fn add_imaging_depth(data: &mut Table) -> Result<(), TableError> {
    let nobj = data.len();
    for (ii, band) in columns::OPTICAL_BANDS.iter().enumerate() {
        data.push(columns::psfdepth(band), vec![five_sigma_ivar(PSF_DEPTH_MAG[ii]); nobj])?;
        data.push(columns::galdepth(band), vec![five_sigma_ivar(GAL_DEPTH_MAG[ii]); nobj])?;
    }
    for (ii, band) in ["W1", "W2"].iter().enumerate() {
        data.push(columns::psfdepth(band), vec![wise_ivar(WISE_DEPTH_MAG[ii]); nobj])?;
    }
    Ok(())
}
