use std::fmt;
use std::str::FromStr;

use super::MockError;
use crate::schema::columns;
use crate::table::Table;

/// On-disk mock catalog formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockFormat {
    /// Gaussian random field catalog
    GaussianField,
    /// Uniform random sky positions
    UniformSky,
    /// Galaxia Milky Way model, one file per coarse pixel
    Galaxia,
    /// CoLoRe quasar catalog with Lyman-alpha skewers
    CoLoRe,
    /// Durham MXXL lightcone
    Mxxl,
    /// BGS mock matched to GAMA
    Gama,
    /// White dwarf catalog
    MwsWd,
    /// 100 pc nearby-star catalog
    Mws100pc,
}

impl MockFormat {
    /// Format tag as used in configuration files
    pub fn tag(&self) -> &'static str {
        match self {
            MockFormat::GaussianField => "gaussianfield",
            MockFormat::UniformSky => "uniformsky",
            MockFormat::Galaxia => "galaxia",
            MockFormat::CoLoRe => "CoLoRe",
            MockFormat::Mxxl => "durham_mxxl_hdf5",
            MockFormat::Gama => "bgs-gama",
            MockFormat::MwsWd => "mws_wd",
            MockFormat::Mws100pc => "mws_100pc",
        }
    }
}

impl fmt::Display for MockFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for MockFormat {
    type Err = MockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gaussianfield" => Ok(MockFormat::GaussianField),
            "uniformsky" => Ok(MockFormat::UniformSky),
            "galaxia" => Ok(MockFormat::Galaxia),
            "colore" => Ok(MockFormat::CoLoRe),
            "durham_mxxl_hdf5" | "mxxl" => Ok(MockFormat::Mxxl),
            "bgs-gama" | "gama" => Ok(MockFormat::Gama),
            "mws_wd" => Ok(MockFormat::MwsWd),
            "mws_100pc" => Ok(MockFormat::Mws100pc),
            _ => Err(MockError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Parameters of one `read` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadRequest {
    /// Catalog path; `{VAR}` placeholders are filled from the environment
    pub mockfile: Option<String>,
    /// Footprint cells; `None` means the full survey footprint
    pub healpixels: Option<Vec<i64>>,
    /// Resolution of `healpixels`
    pub nside: Option<u32>,
    /// Target class being read (ELG, LRG, SKY, ...)
    pub target_name: String,
    /// Seed for samplers run while reading
    pub seed: u64,
    /// Keep only tracer quasars with `z < zmax_qso`
    pub zmax_qso: Option<f64>,
    /// Keep only Lyman-alpha quasars with `z >= zmin_lya`
    pub zmin_lya: Option<f64>,
    /// Resolution of the Lyman-alpha skewer files
    pub nside_lya: Option<u32>,
    /// Resolution of the Galaxia file tree
    pub nside_galaxia: Option<u32>,
    /// Keep only objects brighter than this r magnitude
    pub magcut: Option<f64>,
    /// Return only identifiers, coordinates, redshift, magnitude and weight
    pub only_coords: bool,
    /// Also compute the median density of the whole catalog
    pub mock_density: bool,
}

impl ReadRequest {
    /// Request for one class from one catalog
    pub fn new(mockfile: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            mockfile: Some(mockfile.into()),
            target_name: target_name.into(),
            ..Self::default()
        }
    }

    /// Restrict to a set of cells at `nside`
    pub fn with_healpixels(mut self, nside: u32, healpixels: Vec<i64>) -> Self {
        self.nside = Some(nside);
        self.healpixels = Some(healpixels);
        self
    }

    /// Set the sampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Normalised output of a mock reader
///
/// `table` holds one row per object. Every reader provides `MOCKID`, `RA`,
/// `DEC`, `Z`, `WEIGHT`, `HEALPIX`, `BRICKNAME`, `BRICKID` and `SOUTH`, plus
/// the extinction and depth columns; the rest depends on the format.
#[derive(Debug, Clone)]
pub struct SourceRecords {
    /// Target class that was read
    pub target_name: String,
    /// Format the records came from
    pub mockformat: MockFormat,
    /// Resolution of the `HEALPIX` column
    pub nside: u32,
    /// Per-object columns
    pub table: Table,
    /// Median density of the whole catalog in targets per deg², if requested
    pub mock_density: Option<f64>,
}

impl SourceRecords {
    /// Number of objects
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if there are no objects
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Right ascensions
    pub fn ra(&self) -> Result<Vec<f64>, MockError> {
        Ok(self.table.numeric(columns::RA)?)
    }

    /// Declinations
    pub fn dec(&self) -> Result<Vec<f64>, MockError> {
        Ok(self.table.numeric(columns::DEC)?)
    }

    /// Southern photometric-system flag per object
    pub fn south(&self) -> Result<Vec<bool>, MockError> {
        match self.table.get("SOUTH") {
            Some(_) => Ok(self.table.bool("SOUTH")?.to_vec()),
            None => Ok(self.dec()?.into_iter().map(crate::sky::is_south).collect()),
        }
    }

    /// Copy of the records restricted to `indices`, in that order
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            target_name: self.target_name.clone(),
            mockformat: self.mockformat,
            nside: self.nside,
            table: self.table.gather(indices),
            mock_density: self.mock_density,
        }
    }
}
