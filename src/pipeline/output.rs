use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::{concatenate, Array2, Axis};

use super::PipelineStats;
use crate::mock::MockError;
use crate::table::Table;

/// Selected targets of one cell, all classes stacked in class order
#[derive(Debug, Clone)]
pub struct PixelOutput {
    /// Cell these rows came from
    pub healpix: i64,
    /// Observed catalog rows
    pub targets: Table,
    /// Ground truth, row-aligned with `targets`
    pub truth: Table,
    /// Object truth per class, each with its own `TARGETID` column
    pub objtruth: BTreeMap<String, Table>,
    /// Spectra row-aligned with `targets`; no rows without spectra
    pub flux: Array2<f32>,
    /// Counts for this cell
    pub stats: PipelineStats,
}

impl PixelOutput {
    /// Cell with no rows yet
    pub fn empty(healpix: i64) -> Self {
        Self {
            healpix,
            targets: Table::new(),
            truth: Table::new(),
            objtruth: BTreeMap::new(),
            flux: Array2::zeros((0, 0)),
            stats: PipelineStats::default(),
        }
    }

    /// Number of selected targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if no target was selected
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Observed catalog rows
    pub targets: Table,
    /// Ground truth, row-aligned with `targets`
    pub truth: Table,
    /// Object truth per class, joined to `targets` on `TARGETID`
    pub objtruth: BTreeMap<String, Table>,
    /// Spectra row-aligned with `targets`, if they were made
    pub flux: Option<Array2<f32>>,
    /// Wavelength grid of `flux` in Angstrom
    pub wave: Arc<Vec<f64>>,
    /// Counts for the whole run
    pub stats: PipelineStats,
}

impl PipelineOutput {
    /// Stack per-cell outputs in the given order
    pub fn from_pixels(pixels: Vec<PixelOutput>, wave: Arc<Vec<f64>>, with_spectra: bool) -> Result<Self, MockError> {
        let mut targets = Table::new();
        let mut truth = Table::new();
        let mut objtruth: BTreeMap<String, Table> = BTreeMap::new();
        let mut stats = PipelineStats::default();
        let mut fluxes = Vec::new();
        for pixel in &pixels {
            stats.merge(&pixel.stats);
            if pixel.is_empty() {
                continue;
            }
            targets.concat(&pixel.targets)?;
            truth.concat(&pixel.truth)?;
            for (class, table) in &pixel.objtruth {
                objtruth.entry(class.clone()).or_default().concat(table)?;
            }
            if with_spectra {
                fluxes.push(pixel.flux.view());
            }
        }

        let flux = if with_spectra {
            if fluxes.is_empty() {
                Some(Array2::zeros((0, wave.len())))
            } else {
                Some(
                    concatenate(Axis(0), &fluxes)
                        .map_err(|e| MockError::violation(format!("cannot stack spectra: {}", e)))?,
                )
            }
        } else {
            None
        };
        Ok(Self {
            targets,
            truth,
            objtruth,
            flux,
            wave,
            stats,
        })
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if the run selected nothing
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
