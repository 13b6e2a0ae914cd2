use anyhow::{bail, Context, Result};
use log::info;
use std::path::PathBuf;

use mocktarget::mock::{median, mock_density, resolve_path};
use mocktarget::sky::{HealpixWeightMap, PixelWeights, UniformWeights};

/// Print the weighted target density of one mock catalog
pub fn run(mockfile: &str, nside: u32, pixweight: Option<PathBuf>, per_pixel: bool) -> Result<()> {
    let path = resolve_path(mockfile)?;
    if !path.exists() {
        bail!("Mock catalog does not exist: {}", path.display());
    }

    let weights: Box<dyn PixelWeights> = match &pixweight {
        Some(p) => Box::new(
            HealpixWeightMap::from_parquet(p)
                .with_context(|| format!("Failed to load weights {}", p.display()))?,
        ),
        None => Box::new(UniformWeights),
    };

    let density = mock_density(&path, nside, weights.as_ref())
        .with_context(|| format!("Failed to compute the density of {}", path.display()))?;
    info!("{} occupied cells at nside {}", density.len(), nside);

    println!("Mock density: {}", path.display());
    println!("  nside: {}", nside);
    println!("  Occupied cells: {}", density.len());
    match median(&density) {
        Some(m) => println!("  Median density: {:.3} / deg2", m),
        None => println!("  Median density: n/a (no occupied cells)"),
    }
    if per_pixel {
        for d in &density {
            println!("{:.6}", d);
        }
    }
    Ok(())
}

