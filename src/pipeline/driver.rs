use std::collections::BTreeMap;

use log::{debug, info, warn};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{PipelineOutput, PixelOutput, SourceSpec};
use crate::makers::{make_maker, MakerClass, MakerContext, MakerOutput, TargetMaker};
use crate::masks::contam_mask;
use crate::mock::{encode_targetid, MockError};
use crate::schema::columns;
use crate::table::{Column, Table};

/// Footprint resolution used when none is configured
pub const DEFAULT_NSIDE: u32 = 16;

/// Contaminant bits and the extragalactic sample they contaminate
const CONTAMINANT_BITS: [(&str, i64); 4] = [
    ("BGS", contam_mask::BGS_IS_STAR),
    ("ELG", contam_mask::ELG_IS_STAR),
    ("LRG", contam_mask::LRG_IS_STAR),
    ("QSO", contam_mask::QSO_IS_STAR),
];

/// Run-level options
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Resolution of the processing cells
    pub nside: u32,
    /// Cells to process; `None` means the whole survey footprint
    pub healpixels: Option<Vec<i64>>,
    /// Run seed
    pub seed: u64,
    /// Skip spectrum synthesis
    pub no_spectra: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            nside: DEFAULT_NSIDE,
            healpixels: None,
            seed: 1,
            no_spectra: false,
        }
    }
}

/// One class's selected rows in a cell
struct ClassRows {
    class: MakerClass,
    targets: Table,
    truth: Table,
    objtruth: Table,
    flux: Array2<f32>,
}

/// Makes every configured class, cell by cell
pub struct Pipeline {
    ctx: MakerContext,
    sources: Vec<(SourceSpec, Box<dyn TargetMaker>)>,
    options: PipelineOptions,
}

impl Pipeline {
    /// Build one maker per source
    pub fn new(ctx: MakerContext, sources: Vec<SourceSpec>, options: PipelineOptions) -> Result<Self, MockError> {
        if sources.is_empty() {
            return Err(MockError::Configuration("no sources configured".to_string()));
        }
        let sources = sources
            .into_iter()
            .map(|spec| {
                let maker = make_maker(spec.class, ctx.clone(), &spec.settings)?;
                Ok((spec, maker))
            })
            .collect::<Result<Vec<_>, MockError>>()?;
        Ok(Self { ctx, sources, options })
    }

    /// Options of this run
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Cells the run visits, in processing order
    pub fn healpixels(&self) -> Vec<i64> {
        match &self.options.healpixels {
            Some(cells) => cells.clone(),
            None => self.ctx.survey.footprint.cells(self.options.nside),
        }
    }

    /// Process every cell and stack the results
    pub fn run(&self) -> Result<PipelineOutput, MockError> {
        let pixels = self.healpixels();
        if pixels.is_empty() {
            warn!("No footprint cells at nside={}; nothing to do", self.options.nside);
        }
        info!(
            "Processing {} cells at nside={} for {} classes",
            pixels.len(),
            self.options.nside,
            self.sources.len()
        );

        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let jobs: Vec<(i64, u64)> = pixels.iter().map(|&p| (p, rng.gen())).collect();
        let outputs = self.run_jobs(&jobs)?;

        let output = PipelineOutput::from_pixels(outputs, self.ctx.wave.clone(), !self.options.no_spectra)?;
        info!("{}", output.stats);
        Ok(output)
    }

    #[cfg(feature = "parallel")]
    fn run_jobs(&self, jobs: &[(i64, u64)]) -> Result<Vec<PixelOutput>, MockError> {
        jobs.par_iter()
            .map(|&(healpix, seed)| self.process_pixel(healpix, seed))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn run_jobs(&self, jobs: &[(i64, u64)]) -> Result<Vec<PixelOutput>, MockError> {
        jobs.iter()
            .map(|&(healpix, seed)| self.process_pixel(healpix, seed))
            .collect()
    }

    /// Read, synthesize and select every class in one cell
    ///
    /// Selected rows get `TARGETID` (running index within the cell, the cell
    /// as brick id, mock flag set), `HPXPIXEL` and a uniform `SUBPRIORITY`.
    pub fn process_pixel(&self, healpix: i64, seed: u64) -> Result<PixelOutput, MockError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut out = PixelOutput::empty(healpix);
        let mut parts = Vec::new();

        for (spec, maker) in &self.sources {
            let class_seed: u64 = rng.gen();
            let name = spec.class.name().to_string();
            let request = spec.request_for(self.options.nside, healpix, class_seed);
            let data = match maker.read(&request)? {
                Some(data) if !data.is_empty() => data,
                _ => {
                    debug!("No {} objects in healpixel {}", name, healpix);
                    continue;
                }
            };
            *out.stats.objects_read.entry(name.clone()).or_insert(0) += data.len();

            let mut made = maker.make_spectra(&data, None, class_seed, self.options.no_spectra)?;
            maker.select_targets(&mut made.targets, &mut made.truth)?;
            let Some(rows) = selected_rows(spec.class, made)? else {
                debug!("No {} targets selected in healpixel {}", name, healpix);
                continue;
            };
            *out.stats.targets_selected.entry(name).or_insert(0) += rows.targets.len();
            tally_contaminants(&rows.truth, &mut out.stats.contaminants)?;
            parts.push(rows);
        }

        if parts.is_empty() {
            out.stats.pixels_empty = 1;
            return Ok(out);
        }
        out.stats.pixels_processed = 1;

        let mut objid = 0i64;
        let mut fluxes = Vec::with_capacity(parts.len());
        for mut part in parts {
            let n = part.targets.len();
            let sky = i64::from(part.class == MakerClass::Sky);
            let targetid = (objid..objid + n as i64)
                .map(|id| encode_targetid(id, healpix, 0, 1, sky))
                .collect::<Result<Vec<_>, _>>()?;
            objid += n as i64;
            let subpriority: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();

            part.targets.assign(columns::TARGETID, &Column::from(targetid.clone()))?;
            part.targets.assign(columns::HPXPIXEL, &Column::from(vec![healpix; n]))?;
            part.targets.assign(columns::SUBPRIORITY, &Column::from(subpriority))?;
            part.truth.assign(columns::TARGETID, &Column::from(targetid.clone()))?;
            out.targets.concat(&part.targets)?;
            out.truth.concat(&part.truth)?;

            if part.objtruth.num_columns() > 0 {
                part.objtruth.push(columns::TARGETID, targetid)?;
                out.objtruth
                    .entry(part.class.name().to_string())
                    .or_default()
                    .concat(&part.objtruth)?;
            }
            fluxes.push(part.flux);
        }
        if !self.options.no_spectra {
            let views: Vec<_> = fluxes.iter().map(|f| f.view()).collect();
            out.flux = ndarray::concatenate(Axis(0), &views)
                .map_err(|e| MockError::violation(format!("cannot stack spectra: {}", e)))?;
        }
        debug!("Healpixel {}: {} targets", healpix, out.len());
        Ok(out)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("classes", &self.sources.iter().map(|(s, _)| s.class).collect::<Vec<_>>())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Rows with any target bit set, or `None` if there are none
fn selected_rows(class: MakerClass, made: MakerOutput) -> Result<Option<ClassRows>, MockError> {
    let desi = made.targets.i64(columns::DESI_TARGET)?;
    let bgs = made.targets.i64(columns::BGS_TARGET)?;
    let mws = made.targets.i64(columns::MWS_TARGET)?;
    let keep: Vec<usize> = (0..made.len())
        .filter(|&i| desi[i] | bgs[i] | mws[i] != 0)
        .collect();
    if keep.is_empty() {
        return Ok(None);
    }
    let flux = if made.has_spectra() {
        made.flux.select(Axis(0), &keep)
    } else {
        Array2::zeros((0, made.wave.len()))
    };
    let objtruth = if made.objtruth.num_columns() > 0 {
        made.objtruth.gather(&keep)
    } else {
        Table::new()
    };
    Ok(Some(ClassRows {
        class,
        targets: made.targets.gather(&keep),
        truth: made.truth.gather(&keep),
        objtruth,
        flux,
    }))
}

/// Count stars flagged as contaminants of each extragalactic sample
fn tally_contaminants(truth: &Table, counts: &mut BTreeMap<String, usize>) -> Result<(), MockError> {
    let contam = truth.i64(columns::CONTAM_TARGET)?;
    for (sample, bit) in CONTAMINANT_BITS {
        let n = contam.iter().filter(|&&c| c & bit != 0).count();
        if n > 0 {
            *counts.entry(sample.to_string()).or_insert(0) += n;
        }
    }
    Ok(())
}
