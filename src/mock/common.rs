use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::context::SurveyContext;
use super::io::read_parquet;
use super::records::ReadRequest;
use super::MockError;
use crate::photometry::{add_imaging_depth, add_mw_transmission};
use crate::schema::columns;
use crate::sky::{healpix, is_south};
use crate::table::{Column, Table};

/// Speed of light in km/s
pub const C_LIGHT: f64 = 299_792.458;

/// Default footprint resolution when a request names neither cells nor nside
pub const DEFAULT_NSIDE: u32 = 16;

/// Replace `{VAR}` placeholders with environment variables
///
/// `{{` and `}}` stand for literal braces. An unset variable or an unclosed
/// placeholder is a configuration error.
pub fn resolve_path(template: &str) -> Result<PathBuf, MockError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed || name.is_empty() {
                    return Err(MockError::Configuration(format!(
                        "malformed placeholder in {}",
                        template
                    )));
                }
                let value = std::env::var(&name).map_err(|_| {
                    MockError::Configuration(format!(
                        "environment variable {} not set for {}",
                        name, template
                    ))
                })?;
                out.push_str(&value);
            }
            _ => out.push(c),
        }
    }
    Ok(PathBuf::from(out))
}

/// Rows whose cell is in `cells` and has positive completeness weight
pub fn select_footprint(allpix: &[i64], pixweight: &[f64], cells: &[i64]) -> Vec<usize> {
    let cells: HashSet<i64> = cells.iter().copied().collect();
    allpix
        .iter()
        .enumerate()
        .filter(|(_, pix)| {
            cells.contains(pix)
                && pixweight
                    .get(**pix as usize)
                    .map(|&w| w > 0.0)
                    .unwrap_or(false)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Resolve the request's mock path without checking that it exists
pub(crate) fn mockfile_path(request: &ReadRequest) -> Result<PathBuf, MockError> {
    let raw = request
        .mockfile
        .as_deref()
        .ok_or_else(|| MockError::Configuration("mockfile input is required".to_string()))?;
    resolve_path(raw)
}

/// Resolve the request's mock path and require a regular file
pub(crate) fn require_mockfile(request: &ReadRequest) -> Result<PathBuf, MockError> {
    let path = mockfile_path(request)?;
    if !path.is_file() {
        log::warn!("Mock file {} not found!", path.display());
        return Err(MockError::NotFound(path));
    }
    Ok(path)
}

/// Footprint resolution and cells for a request
///
/// With no cells the context footprint at `nside` (default 16) is used.
pub(crate) fn requested_cells(
    ctx: &SurveyContext,
    request: &ReadRequest,
) -> Result<(u32, Vec<i64>), MockError> {
    let (nside, cells) = match (&request.healpixels, request.nside) {
        (Some(_), None) => {
            return Err(MockError::Configuration(
                "nside must be given with healpixels".to_string(),
            ))
        }
        (Some(cells), Some(nside)) => (nside, cells.clone()),
        (None, nside) => {
            let nside = nside.unwrap_or(DEFAULT_NSIDE);
            log::info!("Reading the whole footprint with nside = {}.", nside);
            (nside, ctx.footprint.cells(nside))
        }
    };
    if !healpix::is_valid_nside(nside) {
        return Err(MockError::Configuration(format!("invalid nside {}", nside)));
    }
    Ok((nside, cells))
}

/// A catalog read from disk with its cell assignment at one resolution
#[derive(Debug)]
pub(crate) struct LoadedCatalog {
    pub path: PathBuf,
    pub nside: u32,
    /// Every column of the file, `RA` wrapped into [0, 360)
    pub table: Table,
    pub allpix: Vec<i64>,
    pub pixweight: Vec<f64>,
}

impl LoadedCatalog {
    /// Read `path` and assign cells at `nside`
    pub fn read(path: &Path, nside: u32, ctx: &SurveyContext) -> Result<Self, MockError> {
        log::info!("Reading {}", path.display());
        let mut table = read_parquet(path)?.table;
        let ra: Vec<f64> = table
            .numeric(columns::RA)?
            .into_iter()
            .map(|r| r.rem_euclid(360.0))
            .collect();
        let dec = table.numeric(columns::DEC)?;
        table.push(columns::RA, ra.clone())?;
        table.push(columns::DEC, dec.clone())?;

        log::info!("Assigning healpix pixels with nside = {}.", nside);
        let allpix = healpix::ang2pix_many(nside, &ra, &dec);
        let pixweight = ctx.weights.weights(nside);
        Ok(Self {
            path: path.to_path_buf(),
            nside,
            table,
            allpix,
            pixweight,
        })
    }

    /// Footprint rows and their inverse completeness weights
    pub fn trim(&self, cells: &[i64]) -> (Vec<usize>, Vec<f64>) {
        let rows = select_footprint(&self.allpix, &self.pixweight, cells);
        let weight = rows
            .iter()
            .map(|&i| 1.0 / self.pixweight[self.allpix[i] as usize])
            .collect();
        (rows, weight)
    }
}

/// Last catalog loaded by a reader, reused while path and resolution match
#[derive(Debug, Default)]
pub(crate) struct CatalogCache {
    slot: Mutex<Option<Arc<LoadedCatalog>>>,
}

impl CatalogCache {
    pub fn load(
        &self,
        path: &Path,
        nside: u32,
        ctx: &SurveyContext,
    ) -> Result<Arc<LoadedCatalog>, MockError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| MockError::violation("catalog cache lock poisoned"))?;
        if let Some(cached) = slot.as_ref() {
            if cached.path == path && cached.nside == nside {
                log::info!(
                    "Using cached coordinates, healpixels, and pixel weights from {}",
                    path.display()
                );
                return Ok(Arc::clone(cached));
            }
        }
        let loaded = Arc::new(LoadedCatalog::read(path, nside, ctx)?);
        *slot = Some(Arc::clone(&loaded));
        Ok(loaded)
    }
}

/// Identifier, position and footprint columns shared by every reader
pub(crate) fn base_table(
    ctx: &SurveyContext,
    mockid: Vec<i64>,
    ra: Vec<f64>,
    dec: Vec<f64>,
    allpix: Vec<i64>,
    weight: Vec<f64>,
) -> Result<Table, MockError> {
    let n = ra.len();
    if dec.len() != n || mockid.len() != n || allpix.len() != n || weight.len() != n {
        return Err(MockError::violation("source columns have different lengths"));
    }
    let brickname: Vec<String> = ra
        .iter()
        .zip(dec.iter())
        .map(|(&r, &d)| ctx.bricks.brickname(r, d))
        .collect();
    let brickid: Vec<i32> = ra
        .iter()
        .zip(dec.iter())
        .map(|(&r, &d)| ctx.bricks.brickid(r, d) as i32)
        .collect();
    let south: Vec<bool> = dec.iter().map(|&d| is_south(d)).collect();

    let mut table = Table::with_rows(n);
    table.push("HEALPIX", allpix)?;
    table.push("WEIGHT", weight)?;
    table.push(columns::MOCKID, mockid)?;
    table.push(columns::BRICKNAME, brickname)?;
    table.push(columns::BRICKID, brickid)?;
    table.push(columns::RA, ra)?;
    table.push(columns::DEC, dec)?;
    table.push("SOUTH", south)?;
    Ok(table)
}

/// Append a column of one repeated string
pub(crate) fn push_repeated(table: &mut Table, name: &str, value: &str) -> Result<(), MockError> {
    let n = table.len();
    table.push(name, Column::Utf8(vec![value.to_string(); n]))?;
    Ok(())
}

/// Add Galactic transmission and the fixed imaging depths
pub(crate) fn add_extinction_and_depth(table: &mut Table, ctx: &SurveyContext) -> Result<(), MockError> {
    add_mw_transmission(table, ctx.dust.as_ref())?;
    add_imaging_depth(table)?;
    Ok(())
}

/// Narrow f64 values to f32
pub(crate) fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}
