use std::path::Path;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::NativeTemplates;
use crate::mock::io::read_parquet;
use crate::mock::MockError;

/// Broad absorption line templates: rest-frame transmission curves
///
/// Stored as Parquet with one `FLUX` list row per template and the
/// rest-frame wavelengths as JSON under the `wavelength` metadata key.
#[derive(Debug, Clone)]
pub struct BalLibrary {
    restwave: Vec<f64>,
    templates: Array2<f32>,
}

impl BalLibrary {
    /// Assemble a library; `templates` must have one column per wavelength
    pub fn new(restwave: Vec<f64>, templates: Array2<f32>) -> Result<Self, MockError> {
        if templates.ncols() != restwave.len() {
            return Err(MockError::violation(format!(
                "BAL templates have {} pixels for {} wavelengths",
                templates.ncols(),
                restwave.len()
            )));
        }
        Ok(Self { restwave, templates })
    }

    /// Read a BAL template file
    pub fn from_parquet(path: &Path) -> Result<Self, MockError> {
        let loaded = read_parquet(path)?;
        let restwave = loaded.json_f64("wavelength")?;
        let (width, values) = loaded.table.list("FLUX")?;
        let templates = Array2::from_shape_vec((loaded.table.len(), width), values.to_vec())
            .map_err(|e| MockError::violation(format!("{}: {}", path.display(), e)))?;
        log::info!("Read {} BAL templates from {}", templates.nrows(), path.display());
        Self::new(restwave, templates)
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.templates.nrows()
    }

    /// True if the library has no templates
    pub fn is_empty(&self) -> bool {
        self.templates.nrows() == 0
    }

    /// Absorb each quasar with probability `balprob`
    ///
    /// Returns the BAL template of every row, -1 where none was inserted.
    /// Outside a template's wavelength range the spectrum is untouched.
    pub fn insert_bals(&self, spectra: &mut NativeTemplates, seed: u64, balprob: f64) -> Vec<i32> {
        let nobj = spectra.flux.nrows();
        let mut chosen = vec![-1; nobj];
        if self.is_empty() || balprob <= 0.0 {
            return chosen;
        }
        let (Some(&lo), Some(&hi)) = (self.restwave.first(), self.restwave.last()) else {
            return chosen;
        };
        let mut rng = StdRng::seed_from_u64(seed);
        for (row, slot) in chosen.iter_mut().enumerate() {
            let draw: f64 = rng.gen();
            if draw >= balprob {
                continue;
            }
            let template = rng.gen_range(0..self.len());
            *slot = template as i32;

            // native pixels sit at restwave * (1 + z), so pixel k is restwave[k] at rest
            let curve: Vec<f64> = self.templates.row(template).iter().map(|&v| v as f64).collect();
            for (f, &w) in spectra.flux.row_mut(row).iter_mut().zip(spectra.restwave.iter()) {
                if w >= lo && w <= hi {
                    *f = (*f as f64 * crate::wave::interp(w, &self.restwave, &curve)) as f32;
                }
            }
        }
        chosen
    }
}
