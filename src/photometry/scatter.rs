use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::Band;
use crate::mock::MockError;
use crate::schema::columns;
use crate::table::{Column, Table};

/// Add Gaussian noise to the noiseless truth photometry
///
/// `data` holds the source records (with depth columns), `indices` the source
/// rows that `truth`/`targets` correspond to. For g, r, z the point-source or
/// extended-source depth is used according to `psf`; W1 and W2 always use the
/// point-source depth. The depth is a 5-sigma inverse variance, so
/// `sigma = 1 / sqrt(depth) / 5`. Writes `FLUX_*` and `FLUX_IVAR_*` of
/// `targets`.
pub fn scatter_photometry(
    data: &Table,
    truth: &Table,
    targets: &mut Table,
    indices: &[usize],
    psf: bool,
    seed: u64,
) -> Result<(), MockError> {
    if truth.len() != indices.len() || targets.len() != indices.len() {
        return Err(MockError::violation(format!(
            "scatter_photometry: {} indices for {} truth and {} target rows",
            indices.len(),
            truth.len(),
            targets.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    for band in Band::ALL {
        let depthkey = match band {
            Band::G | Band::R | Band::Z if !psf => columns::galdepth(band.name()),
            _ => columns::psfdepth(band.name()),
        };
        let depth = data.numeric(&depthkey)?;
        let truthflux = truth.numeric(&columns::flux(band.name()))?;

        let mut flux = Vec::with_capacity(indices.len());
        let mut ivar = Vec::with_capacity(indices.len());
        for (k, &i) in indices.iter().enumerate() {
            let sigma = 1.0 / depth[i].sqrt() / 5.0;
            let deviate: f64 = rng.sample(StandardNormal);
            flux.push(truthflux[k] + sigma * deviate);
            ivar.push(1.0 / (sigma * sigma));
        }
        targets.assign(&columns::flux(band.name()), &Column::from(flux))?;
        targets.assign(&columns::flux_ivar(band.name()), &Column::from(ivar))?;
    }
    Ok(())
}
