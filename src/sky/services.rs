use std::collections::HashMap;
use std::path::Path;

use super::healpix;
use crate::mock::{io::read_parquet, MockError};

/// E(B-V) lookup
pub trait DustMap: Send + Sync {
    /// Reddening for each position
    fn ebv(&self, ra: &[f64], dec: &[f64]) -> Vec<f64>;
}

/// Completeness weights per HEALPix cell
pub trait PixelWeights: Send + Sync {
    /// Weight of every NESTED pixel at `nside`, indexed by pixel id
    fn weights(&self, nside: u32) -> Vec<f64>;
}

/// Survey footprint as a set of HEALPix cells
pub trait Footprint: Send + Sync {
    /// NESTED pixel ids inside the footprint at `nside`, ascending
    fn cells(&self, nside: u32) -> Vec<i64>;
}

/// Same reddening everywhere
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantDust(pub f64);

impl DustMap for ConstantDust {
    fn ebv(&self, ra: &[f64], _dec: &[f64]) -> Vec<f64> {
        vec![self.0; ra.len()]
    }
}

fn nside_from_metadata(
    metadata: &HashMap<String, String>,
    nrows: usize,
    path: &Path,
) -> Result<u32, MockError> {
    let nside = match metadata.get("nside").or_else(|| metadata.get("NSIDE")) {
        Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
            MockError::Configuration(format!("bad nside '{}' in {}", raw, path.display()))
        })?,
        None => ((nrows as f64 / 12.0).sqrt().round()) as u32,
    };
    if !healpix::is_valid_nside(nside) {
        return Err(MockError::Configuration(format!(
            "{} does not describe a valid NESTED map (nside={})",
            path.display(),
            nside
        )));
    }
    Ok(nside)
}

fn load_map(path: &Path, value_column: &str) -> Result<(u32, Vec<f64>), MockError> {
    let parquet = read_parquet(path)?;
    let pixels = parquet.table.numeric("HEALPIX")?;
    let values = parquet.table.numeric(value_column)?;
    let nside = nside_from_metadata(&parquet.metadata, pixels.len(), path)?;
    let npix = healpix::nside2npix(nside);

    let mut map = vec![0.0; npix as usize];
    for (&pix, &value) in pixels.iter().zip(values.iter()) {
        let pix = pix as i64;
        if pix < 0 || pix >= npix {
            return Err(MockError::violation(format!(
                "pixel {} out of range for nside {} in {}",
                pix,
                nside,
                path.display()
            )));
        }
        map[pix as usize] = value;
    }
    log::info!(
        "Loaded {} map from {} (nside={}, {} cells)",
        value_column,
        path.display(),
        nside,
        pixels.len()
    );
    Ok((nside, map))
}

/// Full-sky NESTED map of a scalar, resampled on lookup
#[derive(Debug, Clone)]
pub struct HealpixMap {
    nside: u32,
    values: Vec<f64>,
}

impl HealpixMap {
    /// Wrap a full-sky NESTED array
    pub fn new(nside: u32, values: Vec<f64>) -> Result<Self, MockError> {
        if !healpix::is_valid_nside(nside) || values.len() as i64 != healpix::nside2npix(nside) {
            return Err(MockError::violation(format!(
                "map of {} values does not match nside {}",
                values.len(),
                nside
            )));
        }
        Ok(Self { nside, values })
    }

    /// Native resolution
    pub fn nside(&self) -> u32 {
        self.nside
    }

    /// Value at a position
    pub fn value_at(&self, ra: f64, dec: f64) -> f64 {
        self.values[healpix::ang2pix(self.nside, ra, dec) as usize]
    }

    /// Map resampled to `nside`: children are averaged, parents are repeated
    pub fn resample(&self, nside: u32) -> Vec<f64> {
        if nside == self.nside {
            return self.values.clone();
        }
        let npix = healpix::nside2npix(nside);
        if nside < self.nside {
            (0..npix)
                .map(|pix| {
                    let children = healpix::upgrade(nside, self.nside, pix);
                    let n = (children.end - children.start) as f64;
                    children.map(|c| self.values[c as usize]).sum::<f64>() / n
                })
                .collect()
        } else {
            (0..npix)
                .map(|pix| self.values[healpix::degrade(nside, self.nside, pix) as usize])
                .collect()
        }
    }
}

/// Dust map stored as a Parquet `HEALPIX, EBV` table
#[derive(Debug, Clone)]
pub struct HealpixDustMap {
    map: HealpixMap,
}

impl HealpixDustMap {
    /// Load from Parquet; `nside` comes from key-value metadata or the row count
    pub fn from_parquet(path: &Path) -> Result<Self, MockError> {
        let (nside, values) = load_map(path, "EBV")?;
        Ok(Self {
            map: HealpixMap::new(nside, values)?,
        })
    }

    /// Wrap an in-memory map
    pub fn from_map(map: HealpixMap) -> Self {
        Self { map }
    }
}

impl DustMap for HealpixDustMap {
    fn ebv(&self, ra: &[f64], dec: &[f64]) -> Vec<f64> {
        ra.iter()
            .zip(dec.iter())
            .map(|(&r, &d)| self.map.value_at(r, d))
            .collect()
    }
}

/// Weight 1 everywhere; the footprint is the whole sky
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformWeights;

impl PixelWeights for UniformWeights {
    fn weights(&self, nside: u32) -> Vec<f64> {
        vec![1.0; healpix::nside2npix(nside) as usize]
    }
}

impl Footprint for UniformWeights {
    fn cells(&self, nside: u32) -> Vec<i64> {
        (0..healpix::nside2npix(nside)).collect()
    }
}

/// Completeness map stored as a Parquet `HEALPIX, WEIGHT` table
#[derive(Debug, Clone)]
pub struct HealpixWeightMap {
    map: HealpixMap,
}

impl HealpixWeightMap {
    /// Load from Parquet; `nside` comes from key-value metadata or the row count
    pub fn from_parquet(path: &Path) -> Result<Self, MockError> {
        let (nside, values) = load_map(path, "WEIGHT")?;
        Ok(Self {
            map: HealpixMap::new(nside, values)?,
        })
    }

    /// Wrap an in-memory map
    pub fn from_map(map: HealpixMap) -> Self {
        Self { map }
    }
}

impl PixelWeights for HealpixWeightMap {
    fn weights(&self, nside: u32) -> Vec<f64> {
        self.map.resample(nside)
    }
}

impl Footprint for HealpixWeightMap {
    fn cells(&self, nside: u32) -> Vec<i64> {
        self.weights(nside)
            .iter()
            .enumerate()
            .filter(|(_, &w)| w > 0.0)
            .map(|(pix, _)| pix as i64)
            .collect()
    }
}

/// Explicit list of cells at one resolution
#[derive(Debug, Clone)]
pub struct CellList {
    nside: u32,
    cells: Vec<i64>,
}

impl CellList {
    /// Footprint made of `cells` at `nside`
    pub fn new(nside: u32, mut cells: Vec<i64>) -> Self {
        cells.sort_unstable();
        cells.dedup();
        Self { nside, cells }
    }
}

impl Footprint for CellList {
    fn cells(&self, nside: u32) -> Vec<i64> {
        let mut out: Vec<i64> = if nside == self.nside {
            self.cells.clone()
        } else if nside < self.nside {
            self.cells
                .iter()
                .map(|&p| healpix::degrade(self.nside, nside, p))
                .collect()
        } else {
            self.cells
                .iter()
                .flat_map(|&p| healpix::upgrade(self.nside, nside, p))
                .collect()
        };
        out.sort_unstable();
        out.dedup();
        out
    }
}
