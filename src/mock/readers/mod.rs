//! One reader per mock catalog format.

mod galaxia;
mod gama;
mod gaussianfield;
mod lya;
mod mws;
mod mxxl;
mod uniformsky;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use galaxia::GalaxiaReader;
pub use gama::GamaReader;
pub use gaussianfield::GaussianFieldReader;
pub use lya::LyaCoLoReReader;
pub use mws::{MwsNearbyReader, MwsWdReader};
pub use mxxl::MxxlReader;
pub use uniformsky::UniformSkyReader;

use super::common::{
    add_extinction_and_depth, base_table, require_mockfile, requested_cells, CatalogCache,
    LoadedCatalog,
};
use super::context::SurveyContext;
use super::density::{median, mock_density};
use super::records::{MockFormat, ReadRequest, SourceRecords};
use super::MockError;
use crate::sampling::GmmTarget;
use crate::table::Table;

/// Reads one mock catalog format into [`SourceRecords`]
pub trait MockReader: Send + Sync {
    /// Format handled by this reader
    fn format(&self) -> MockFormat;

    /// Read the objects selected by `request`
    ///
    /// Returns `Ok(None)` when nothing falls inside the footprint or passes
    /// the format's cuts.
    fn read(&self, ctx: &SurveyContext, request: &ReadRequest) -> Result<Option<SourceRecords>, MockError>;
}

/// New reader for a format
pub fn reader_for(format: MockFormat) -> Box<dyn MockReader> {
    match format {
        MockFormat::GaussianField => Box::new(GaussianFieldReader::new()),
        MockFormat::UniformSky => Box::new(UniformSkyReader::new()),
        MockFormat::Galaxia => Box::new(GalaxiaReader::new()),
        MockFormat::CoLoRe => Box::new(LyaCoLoReReader::new()),
        MockFormat::Mxxl => Box::new(MxxlReader::new()),
        MockFormat::Gama => Box::new(GamaReader::new()),
        MockFormat::MwsWd => Box::new(MwsWdReader::new()),
        MockFormat::Mws100pc => Box::new(MwsNearbyReader::new()),
    }
}

/// Flat catalog restricted to the requested footprint
struct Trimmed {
    path: PathBuf,
    nside: u32,
    catalog: Arc<LoadedCatalog>,
    rows: Vec<usize>,
    /// Base columns for the selected rows; `MOCKID` is the catalog row
    table: Table,
}

impl Trimmed {
    fn numeric(&self, name: &str) -> Result<Vec<f64>, MockError> {
        let values = self.catalog.table.numeric(name)?;
        Ok(self.rows.iter().map(|&i| values[i]).collect())
    }

    fn strings(&self, name: &str) -> Result<Vec<String>, MockError> {
        let values = self.catalog.table.utf8(name)?;
        Ok(self.rows.iter().map(|&i| values[i].clone()).collect())
    }

    /// Rows of a fixed-width list column, widened to f64
    fn list_rows(&self, name: &str) -> Result<Vec<Vec<f64>>, MockError> {
        let (width, values) = self.catalog.table.list(name)?;
        Ok(self
            .rows
            .iter()
            .map(|&i| values[i * width..(i + 1) * width].iter().map(|&v| v as f64).collect())
            .collect())
    }
}

/// Load a single-file catalog through `cache` and keep the footprint rows
fn trim_catalog(
    cache: &CatalogCache,
    ctx: &SurveyContext,
    request: &ReadRequest,
) -> Result<Option<Trimmed>, MockError> {
    let path = require_mockfile(request)?;
    let (nside, cells) = requested_cells(ctx, request)?;
    let catalog = cache.load(&path, nside, ctx)?;
    trim_loaded(ctx, request, catalog, &cells)
}

/// Keep the rows of an already loaded catalog that fall in `cells`
fn trim_loaded(
    ctx: &SurveyContext,
    request: &ReadRequest,
    catalog: Arc<LoadedCatalog>,
    cells: &[i64],
) -> Result<Option<Trimmed>, MockError> {
    let (rows, weight) = catalog.trim(cells);
    if rows.is_empty() {
        log::warn!("No {}s in {} healpixel(s)!", request.target_name, cells.len());
        return Ok(None);
    }
    log::info!(
        "Trimmed to {} {}s in {} healpixel(s).",
        rows.len(),
        request.target_name,
        cells.len()
    );

    let ra = catalog.table.numeric("RA")?;
    let dec = catalog.table.numeric("DEC")?;
    let table = base_table(
        ctx,
        rows.iter().map(|&i| i as i64).collect(),
        rows.iter().map(|&i| ra[i]).collect(),
        rows.iter().map(|&i| dec[i]).collect(),
        rows.iter().map(|&i| catalog.allpix[i]).collect(),
        weight,
    )?;
    Ok(Some(Trimmed {
        path: catalog.path.clone(),
        nside: catalog.nside,
        catalog,
        rows,
        table,
    }))
}

/// Keep rows where `keep` is true; `None` when nothing survives
fn apply_cut(table: Table, keep: &[bool], what: &str, target_name: &str) -> Option<Table> {
    let table = table.filter(keep);
    if table.is_empty() {
        log::warn!("No {}s with {}!", target_name, what);
        None
    } else {
        log::info!("Trimmed to {} {}s with {}.", table.len(), target_name, what);
        Some(table)
    }
}

/// Merge morphology and colour draws into the records, when the class has a model
fn sample_morphology(
    ctx: &SurveyContext,
    request: &ReadRequest,
    table: &mut Table,
    prior_mag: Option<&[f64]>,
) -> Result<(), MockError> {
    let Some(target) = GmmTarget::from_name(&request.target_name) else {
        return Ok(());
    };
    let Some(model) = ctx.models.morphology(target)? else {
        return Ok(());
    };
    let south = table.bool("SOUTH")?.to_vec();
    let draws = model.sample(table.len(), &south, request.seed, prior_mag)?;
    for (name, column) in draws.iter() {
        table.push(name, column.clone())?;
    }
    Ok(())
}

/// Attach extinction, depth and optional density, then wrap the table
fn finish(
    ctx: &SurveyContext,
    request: &ReadRequest,
    format: MockFormat,
    nside: u32,
    mut table: Table,
    density_source: Option<&Path>,
) -> Result<Option<SourceRecords>, MockError> {
    add_extinction_and_depth(&mut table, ctx)?;
    let density = match density_source {
        Some(path) if request.mock_density => {
            median(&mock_density(path, super::common::DEFAULT_NSIDE, ctx.weights.as_ref())?)
        }
        _ => None,
    };
    Ok(Some(SourceRecords {
        target_name: request.target_name.clone(),
        mockformat: format,
        nside,
        table,
        mock_density: density,
    }))
}
