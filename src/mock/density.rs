use std::path::Path;

use super::io::read_parquet;
use super::MockError;
use crate::schema::columns;
use crate::sky::{healpix, PixelWeights};

/// Weighted target density (per deg²) of every occupied cell at `nside`
///
/// Each object counts `1 / completeness` of its cell; objects in cells with
/// zero completeness count nothing. Empty cells are dropped.
pub fn mock_density(
    mockfile: &Path,
    nside: u32,
    weights: &dyn PixelWeights,
) -> Result<Vec<f64>, MockError> {
    if !healpix::is_valid_nside(nside) {
        return Err(MockError::Configuration(format!("invalid nside {}", nside)));
    }
    let table = read_parquet(mockfile)?.table;
    let ra = table.numeric(columns::RA)?;
    let dec = table.numeric(columns::DEC)?;
    let pixweight = weights.weights(nside);
    let areaperpix = healpix::nside2pixarea(nside);

    let mut counts = vec![0.0; healpix::nside2npix(nside) as usize];
    for pix in healpix::ang2pix_many(nside, &ra, &dec) {
        let w = pixweight[pix as usize];
        if w != 0.0 {
            counts[pix as usize] += 1.0 / w;
        }
    }
    Ok(counts
        .into_iter()
        .filter(|&c| c != 0.0)
        .map(|c| c / areaperpix)
        .collect())
}

/// Median of a set of values (mean of the middle pair for even counts)
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}
