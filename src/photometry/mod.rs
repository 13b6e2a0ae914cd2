//! # Photometry
//!
//! Broadband photometry helpers shared by readers, makers and the selection
//! engine: Galactic extinction, the fixed imaging-depth model, noise injection
//! and synthetic AB photometry through filter curves.
//!
//! ## Design Principles
//!
//! 1. **Nanomaggies everywhere**: Fluxes use the AB 22.5 zero point, so
//!    `mag = 22.5 - 2.5 log10(flux)`.
//!
//! 2. **Explicit seeds**: Noise injection takes a seed and draws from its own
//!    generator; equal seeds give bit-identical output.

mod depth;
mod extinction;
mod filters;
mod scatter;

#[cfg(test)]
mod tests;

pub use depth::{add_imaging_depth, GAL_DEPTH_MAG, PSF_DEPTH_MAG, WISE_DEPTH_MAG};
pub use extinction::{add_mw_transmission, mw_transmission, unextinct_fluxes};
pub use filters::{FilterCurve, FilterSet, PhotSystem};
pub use scatter::scatter_photometry;

/// Photometric bands of the targets table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// Optical g
    G,
    /// Optical r
    R,
    /// Optical z
    Z,
    /// WISE 3.4 micron
    W1,
    /// WISE 4.6 micron
    W2,
}

impl Band {
    /// All bands in table order
    pub const ALL: [Band; 5] = [Band::G, Band::R, Band::Z, Band::W1, Band::W2];

    /// Optical bands with depth and quality columns
    pub const OPTICAL: [Band; 3] = [Band::G, Band::R, Band::Z];

    /// Upper-case column suffix
    pub fn name(&self) -> &'static str {
        match self {
            Band::G => "G",
            Band::R => "R",
            Band::Z => "Z",
            Band::W1 => "W1",
            Band::W2 => "W2",
        }
    }

    /// Extinction coefficient A_band / E(B-V)
    pub fn ext_coeff(&self) -> f64 {
        match self {
            Band::G => 3.214,
            Band::R => 2.165,
            Band::Z => 1.221,
            Band::W1 => 0.184,
            Band::W2 => 0.113,
        }
    }

    /// Position in [`Band::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Band::G => 0,
            Band::R => 1,
            Band::Z => 2,
            Band::W1 => 3,
            Band::W2 => 4,
        }
    }
}

/// AB magnitude to nanomaggies
pub fn mag_to_nanomaggies(mag: f64) -> f64 {
    10f64.powf(-0.4 * (mag - 22.5))
}

/// Nanomaggies to AB magnitude (NaN for non-positive flux)
pub fn nanomaggies_to_mag(flux: f64) -> f64 {
    if flux > 0.0 {
        22.5 - 2.5 * flux.log10()
    } else {
        f64::NAN
    }
}
