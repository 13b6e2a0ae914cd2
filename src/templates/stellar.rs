use super::BasisLibrary;
use crate::mock::MockError;
use crate::photometry::{FilterSet, PhotSystem};

/// Rest-frame g, r, z, W1, W2 maggies of every template, divided by the
/// template's maggies in a normalisation filter
///
/// Multiplying a row by the nanomaggies of an object's magnitude in that
/// filter gives the object's noiseless photometry without building a
/// spectrum.
#[derive(Debug, Clone)]
pub struct NormalizedMaggies {
    normfilter: String,
    north: [Vec<f64>; 5],
    south: [Vec<f64>; 5],
}

impl NormalizedMaggies {
    /// Synthesize the table for `library` at zero redshift
    pub fn compute(library: &BasisLibrary, filters: &FilterSet, normfilter: &str) -> Result<Self, MockError> {
        let wave = library.basewave();
        let norm = filters.get(normfilter)?;
        let mut north: [Vec<f64>; 5] = Default::default();
        let mut south: [Vec<f64>; 5] = Default::default();
        for template in 0..library.len() {
            let flux: Vec<f64> = library.flux(template).iter().map(|&v| v as f64).collect();
            let normmaggies = norm.ab_maggies(wave, &flux);
            for (system, out) in [(PhotSystem::North, &mut north), (PhotSystem::South, &mut south)] {
                let maggies = filters.maggies(&system.filters(), wave, &flux)?;
                for (k, m) in maggies.into_iter().enumerate() {
                    out[k].push(if normmaggies > 0.0 { m / normmaggies } else { 0.0 });
                }
            }
        }
        log::debug!(
            "Synthesized {}-normalised photometry for {} {} templates",
            normfilter,
            library.len(),
            library.name()
        );
        Ok(Self {
            normfilter: normfilter.to_string(),
            north,
            south,
        })
    }

    /// Filter the table is normalised to
    pub fn normfilter(&self) -> &str {
        &self.normfilter
    }

    /// Relative maggies of `template` in band `band` (index into g, r, z, W1, W2)
    pub fn ratio(&self, band: usize, template: usize, south: bool) -> f64 {
        let table = if south { &self.south } else { &self.north };
        table[band][template]
    }

    /// Nanomaggies in all five bands for an object of magnitude `mag` in the
    /// normalisation filter matched to `template`
    pub fn fluxes(&self, template: usize, mag: f64, south: bool) -> [f64; 5] {
        let normflux = 1e9 * 10f64.powf(-0.4 * mag);
        let mut out = [0.0; 5];
        for (band, v) in out.iter_mut().enumerate() {
            *v = self.ratio(band, template, south) * normflux;
        }
        out
    }
}
