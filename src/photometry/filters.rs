use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::mock::MockError;

/// Speed of light in Angstrom per second
const C_ANGSTROM: f64 = 2.997_924_58e18;
/// AB zero point in erg/s/cm^2/Hz
const AB_ZEROPOINT: f64 = 3.631e-20;

/// Photometric calibration regime of the imaging surveys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotSystem {
    /// BASS + MzLS (Dec > 32.125)
    North,
    /// DECaLS (Dec <= 32.125)
    South,
}

impl PhotSystem {
    /// System for a declination
    pub fn from_dec(dec: f64) -> Self {
        if crate::sky::is_south(dec) {
            PhotSystem::South
        } else {
            PhotSystem::North
        }
    }

    /// One-letter `PHOTSYS` code
    pub fn code(&self) -> &'static str {
        match self {
            PhotSystem::North => "N",
            PhotSystem::South => "S",
        }
    }

    /// Filter names for g, r, z, W1, W2
    pub fn filters(&self) -> [&'static str; 5] {
        match self {
            PhotSystem::North => ["BASS-g", "BASS-r", "MzLS-z", "wise2010-W1", "wise2010-W2"],
            PhotSystem::South => [
                "decam2014-g",
                "decam2014-r",
                "decam2014-z",
                "wise2010-W1",
                "wise2010-W2",
            ],
        }
    }
}

/// Transmission curve of one filter
#[derive(Debug, Clone, Deserialize)]
pub struct FilterCurve {
    /// Wavelength in Angstrom, ascending
    pub wave: Vec<f64>,
    /// Dimensionless response at each wavelength
    pub response: Vec<f64>,
}

fn interp_linear(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    if xp.is_empty() || x < xp[0] || x > xp[xp.len() - 1] {
        return 0.0;
    }
    let hi = xp.partition_point(|&v| v < x).min(xp.len() - 1);
    if hi == 0 {
        return fp[0];
    }
    let lo = hi - 1;
    let dx = xp[hi] - xp[lo];
    if dx <= 0.0 {
        return fp[hi];
    }
    fp[lo] + (fp[hi] - fp[lo]) * (x - xp[lo]) / dx
}

impl FilterCurve {
    /// Top-hat filter between two wavelengths, sampled every ~5 A
    pub fn tophat(lo: f64, hi: f64) -> Self {
        let eps = (hi - lo) * 1e-3;
        let nstep = (((hi - lo) / 5.0).ceil() as usize).max(1);
        let mut wave = Vec::with_capacity(nstep + 3);
        let mut response = Vec::with_capacity(nstep + 3);
        wave.push(lo - eps);
        response.push(0.0);
        for i in 0..=nstep {
            wave.push(lo + (hi - lo) * i as f64 / nstep as f64);
            response.push(1.0);
        }
        wave.push(hi + eps);
        response.push(0.0);
        Self { wave, response }
    }

    /// Response-weighted mean wavelength
    pub fn effective_wavelength(&self) -> f64 {
        let mut num = 0.0;
        let mut den = 0.0;
        for i in 1..self.wave.len() {
            let dw = self.wave[i] - self.wave[i - 1];
            let r = 0.5 * (self.response[i] + self.response[i - 1]);
            let w = 0.5 * (self.wave[i] + self.wave[i - 1]);
            num += r * w * dw;
            den += r * dw;
        }
        if den > 0.0 {
            num / den
        } else {
            0.0
        }
    }

    /// AB maggies of a spectrum given in erg/s/cm^2/A
    ///
    /// The spectrum is interpolated onto the filter grid; filter wavelengths
    /// outside the spectrum see zero flux.
    pub fn ab_maggies(&self, wave: &[f64], flux: &[f64]) -> f64 {
        let mut num = 0.0;
        let mut den = 0.0;
        let mut prev: Option<(f64, f64, f64)> = None;
        for (&w, &r) in self.wave.iter().zip(self.response.iter()) {
            let f = interp_linear(w, wave, flux);
            let n = f * r * w;
            let d = r * C_ANGSTROM / w;
            if let Some((pw, pn, pd)) = prev {
                let dw = w - pw;
                num += 0.5 * (n + pn) * dw;
                den += 0.5 * (d + pd) * dw;
            }
            prev = Some((w, n, d));
        }
        if den > 0.0 {
            num / den / AB_ZEROPOINT
        } else {
            0.0
        }
    }
}

/// Named collection of filter curves
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: HashMap<String, FilterCurve>,
}

impl FilterSet {
    /// Load `{name: {wave, response}}` from a JSON file
    pub fn from_json(path: &Path) -> Result<Self, MockError> {
        if !path.exists() {
            return Err(MockError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let filters: HashMap<String, FilterCurve> = serde_json::from_str(&content)?;
        for (name, curve) in &filters {
            if curve.wave.len() != curve.response.len() || curve.wave.len() < 2 {
                return Err(MockError::violation(format!(
                    "filter {} has {} wavelengths and {} responses",
                    name,
                    curve.wave.len(),
                    curve.response.len()
                )));
            }
        }
        log::info!("Loaded {} filter curves from {}", filters.len(), path.display());
        Ok(Self { filters })
    }

    /// Top-hat approximations of every filter the pipeline references
    pub fn approximate() -> Self {
        let bands: [(&str, f64, f64); 16] = [
            ("decam2014-g", 4000.0, 5500.0),
            ("decam2014-r", 5600.0, 7150.0),
            ("decam2014-z", 8500.0, 10_000.0),
            ("BASS-g", 4000.0, 5400.0),
            ("BASS-r", 5600.0, 6950.0),
            ("MzLS-z", 8450.0, 10_050.0),
            ("wise2010-W1", 28_000.0, 38_500.0),
            ("wise2010-W2", 41_000.0, 52_000.0),
            ("sdss2010-u", 3200.0, 3900.0),
            ("sdss2010-g", 4000.0, 5500.0),
            ("sdss2010-r", 5550.0, 6900.0),
            ("sdss2010-i", 6900.0, 8250.0),
            ("sdss2010-z", 8250.0, 10_000.0),
            ("bessell-U", 3300.0, 3950.0),
            ("bessell-B", 3900.0, 4900.0),
            ("bessell-V", 5000.0, 5900.0),
        ];
        let filters = bands
            .iter()
            .map(|&(name, lo, hi)| (name.to_string(), FilterCurve::tophat(lo, hi)))
            .collect();
        Self { filters }
    }

    /// Add or replace a curve
    pub fn insert(&mut self, name: impl Into<String>, curve: FilterCurve) {
        self.filters.insert(name.into(), curve);
    }

    /// Look up a curve by name
    pub fn get(&self, name: &str) -> Result<&FilterCurve, MockError> {
        self.filters
            .get(name)
            .ok_or_else(|| MockError::Configuration(format!("unknown filter {}", name)))
    }

    /// AB maggies of a spectrum through each named filter
    pub fn maggies(&self, names: &[&str], wave: &[f64], flux: &[f64]) -> Result<Vec<f64>, MockError> {
        names
            .iter()
            .map(|name| Ok(self.get(name)?.ab_maggies(wave, flux)))
            .collect()
    }
}
