//! # Sky Geometry
//!
//! Pure geometry used to place mock objects on the sky and to look up
//! per-position survey properties.
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: HEALPix, brick and Galactic conversions carry no state.
//!
//! 2. **Injected services**: Dust, completeness weights and the footprint are
//!    traits so the pipeline can run against constant, file-backed or test maps.

pub mod bricks;
pub mod coords;
pub mod healpix;
mod services;


pub use bricks::Bricks;
pub use coords::{galactic_latitude, radec_to_galactic};
pub use services::{
    CellList, ConstantDust, DustMap, Footprint, HealpixDustMap, HealpixMap, HealpixWeightMap,
    PixelWeights, UniformWeights,
};

/// Declination (degrees) at or below which objects use the southern photometric system
pub const NORTH_SOUTH_DEC: f64 = 32.125;

/// True if a declination falls in the southern photometric system
pub fn is_south(dec: f64) -> bool {
    dec <= NORTH_SOUTH_DEC
}
