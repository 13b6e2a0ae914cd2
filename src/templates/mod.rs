//! # Spectral Template Services
//!
//! File-backed stand-ins for the spectral-template generators each maker
//! calls: a basis library of rest-frame spectra is redshifted, broadened,
//! normalised to a requested magnitude and resampled onto the output grid.
//!
//! ## Components
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`TemplateService`] | `make_templates` contract shared by every class |
//! | [`BasisLibrary`] | Rest-frame template fluxes plus physical parameters |
//! | [`BasisTemplates`] | [`TemplateService`] over one basis library |
//! | [`NormalizedMaggies`] | Per-template photometry relative to a normalisation filter |
//! | [`Skewers`] | Lyman-alpha transmission skewers gathered from per-pixel files |
//! | [`BalLibrary`] | Broad absorption line templates for quasars |
//! | [`TemplateRegistry`] | Lazy, shared cache of libraries and filter curves |
//!
//! ## Design Principles
//!
//! 1. **Per-object seeds**: Each output row is generated from its own `SEED`,
//!    so a row's spectrum does not depend on which partition it was made in.
//!
//! 2. **Native first, resample last**: Services produce spectra on the
//!    redshifted basis grid; resampling to the output grid is a separate step
//!    so callers can modify the native spectrum (forest absorption, BALs).
//!
//! 3. **Units**: Spectra are in 1e-17 erg/s/cm²/Å, `FLUX_*` metadata in
//!    nanomaggies.

mod bal;
mod basis;
mod broaden;
mod lya;
mod registry;
mod stellar;


use ndarray::Array2;

pub use bal::BalLibrary;
pub use basis::{BasisLibrary, BasisTemplates};
pub use broaden::broaden;
pub use lya::{apply_transmission, SkewerFile, Skewers};
pub use registry::TemplateRegistry;
pub use stellar::NormalizedMaggies;

use crate::mock::MockError;
use crate::table::Table;
use crate::wave::resample;

/// Flux unit of generated spectra, in erg/s/cm²/Å
pub const FLUX_UNIT: f64 = 1e-17;

/// Inputs of one `make_templates` call
#[derive(Debug, Clone, Copy)]
pub struct TemplateRequest<'a> {
    /// Spectral metadata rows: `TEMPLATEID` (-1 picks one at random),
    /// `SEED`, `REDSHIFT`, `MAG` and `MAGFILTER`
    pub meta: &'a Table,
    /// Velocity dispersion per row in km/s
    pub vdisp: Option<&'a [f64]>,
    /// Synthesize photometry in the southern system
    pub south: bool,
}

impl<'a> TemplateRequest<'a> {
    /// Request without velocity broadening
    pub fn new(meta: &'a Table, south: bool) -> Self {
        Self {
            meta,
            vdisp: None,
            south,
        }
    }

    /// Broaden each row by its velocity dispersion
    pub fn with_vdisp(mut self, vdisp: &'a [f64]) -> Self {
        self.vdisp = Some(vdisp);
        self
    }
}

/// Spectra on the redshifted basis grid, one row per object
#[derive(Debug, Clone)]
pub struct NativeTemplates {
    /// Rest-frame basis wavelengths in Angstrom
    pub restwave: Vec<f64>,
    /// Redshift of each row
    pub redshift: Vec<f64>,
    /// Observed-frame flux density, `nobj x restwave.len()`
    pub flux: Array2<f32>,
    /// Spectral metadata (`META_COLUMNS`)
    pub meta: Table,
    /// Family-specific metadata; no columns for families without extras
    pub objmeta: Table,
}

impl NativeTemplates {
    /// Observed wavelengths of row `row`
    pub fn observed_wave(&self, row: usize) -> Vec<f64> {
        let zfactor = 1.0 + self.redshift[row];
        self.restwave.iter().map(|w| w * zfactor).collect()
    }

    /// Resample every row onto `outwave`, zero outside each row's coverage
    pub fn resample(&self, outwave: &[f64]) -> Array2<f32> {
        let mut out = Array2::<f32>::zeros((self.flux.nrows(), outwave.len()));
        for (row, mut dst) in out.rows_mut().into_iter().enumerate() {
            let wave = self.observed_wave(row);
            let flux: Vec<f64> = self.flux.row(row).iter().map(|&v| v as f64).collect();
            for (d, v) in dst.iter_mut().zip(resample(&wave, &flux, outwave)) {
                *d = v as f32;
            }
        }
        out
    }
}

/// Spectra resampled onto a common output grid
#[derive(Debug, Clone)]
pub struct TemplateOutput {
    /// Flux density, `nobj x wave.len()`
    pub flux: Array2<f32>,
    /// Output wavelengths in Angstrom
    pub wave: Vec<f64>,
    /// Spectral metadata (`META_COLUMNS`)
    pub meta: Table,
    /// Family-specific metadata
    pub objmeta: Table,
}

/// Generates spectra and their metadata for one object class
pub trait TemplateService: Send + Sync {
    /// Template family (`ELG`, `LRG`, `BGS`, `QSO`, `STAR`, `WD`)
    fn objtype(&self) -> &str;

    /// Spectra on the native, redshifted basis grid
    fn make_native(&self, request: &TemplateRequest<'_>) -> Result<NativeTemplates, MockError>;

    /// Spectra resampled onto `outwave`
    fn make_templates(
        &self,
        request: &TemplateRequest<'_>,
        outwave: &[f64],
    ) -> Result<TemplateOutput, MockError> {
        let native = self.make_native(request)?;
        let flux = native.resample(outwave);
        Ok(TemplateOutput {
            flux,
            wave: outwave.to_vec(),
            meta: native.meta,
            objmeta: native.objmeta,
        })
    }
}
