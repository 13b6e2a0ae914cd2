use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::mock::MockError;
use crate::sky::healpix;

/// Log-normal velocity-dispersion population for one galaxy class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VdispModel {
    /// Mean of log10(sigma / km/s)
    pub mean: f64,
    /// Scatter of log10(sigma / km/s)
    pub sigma: f64,
    /// Fraction of a cell's objects that get a distinct dispersion
    pub frac: f64,
    /// Cap on the number of distinct dispersions per cell
    pub max_distinct: f64,
}

impl VdispModel {
    /// Population with the default one-value-per-cell sampling
    pub fn new(mean: f64, sigma: f64) -> Self {
        Self {
            mean,
            sigma,
            frac: 0.1,
            max_distinct: 1.0,
        }
    }

    /// Number of distinct dispersions drawn for `n` objects
    pub fn ndistinct(&self, n: usize) -> usize {
        let nvdisp = (n as f64 * self.frac).round().min(self.max_distinct).max(1.0);
        nvdisp as usize
    }

    /// Assign dispersions so that objects sharing a HEALPix cell at
    /// `nside` draw from the same small population
    pub fn sample(&self, ra: &[f64], dec: &[f64], nside: u32, seed: u64) -> Result<Vec<f64>, MockError> {
        if ra.len() != dec.len() {
            return Err(MockError::violation(format!(
                "vdisp: {} RA values for {} Dec values",
                ra.len(),
                dec.len()
            )));
        }
        let normal = Normal::new(self.mean, self.sigma)
            .map_err(|e| MockError::Configuration(format!("velocity dispersion model: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(seed);

        let pixels = healpix::ang2pix_many(nside, ra, dec);
        let mut members: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &pix) in pixels.iter().enumerate() {
            members.entry(pix).or_default().push(i);
        }

        let mut vdisp = vec![0.0; ra.len()];
        for rows in members.values() {
            let population: Vec<f64> = (0..self.ndistinct(rows.len()))
                .map(|_| 10f64.powf(normal.sample(&mut rng)))
                .collect();
            for &row in rows {
                vdisp[row] = population[rng.gen_range(0..population.len())];
            }
        }
        Ok(vdisp)
    }
}
