use std::path::Path;

use rand::Rng;

use super::gmm::GaussianMixture;
use super::registry::GmmTarget;
use crate::mock::MockError;
use crate::photometry::mag_to_nanomaggies;
use crate::table::{Column, Table};

/// Photometry-only mixture used when no spectra are generated
///
/// Each draw is a normalisation magnitude followed by g-r, r-z, z-W1 and
/// W1-W2 (and [OII] flux for ELGs, which is ignored here).
#[derive(Debug, Clone)]
pub struct PhotometryModel {
    target: GmmTarget,
    gmm: GaussianMixture,
}

/// Quantities modelled for a class, in mixture column order
pub fn photometry_tags(target: GmmTarget) -> &'static [&'static str] {
    match target {
        GmmTarget::Elg => &["r", "g - r", "r - z", "z - W1", "W1 - W2", "oii"],
        GmmTarget::Lrg => &["z", "g - r", "r - z", "z - W1", "W1 - W2"],
        GmmTarget::Bgs => &["r", "g - r", "r - z", "z - W1", "W1 - W2"],
        GmmTarget::Qso | GmmTarget::Lya => &["g", "g - r", "r - z", "z - W1", "W1 - W2"],
    }
}

impl PhotometryModel {
    /// Wrap a mixture, checking its dimension against the class tags
    pub fn new(target: GmmTarget, gmm: GaussianMixture) -> Result<Self, MockError> {
        let ntags = photometry_tags(target).len();
        if gmm.ndim() != ntags {
            return Err(MockError::violation(format!(
                "{} photometry mixture has {} dimensions, expected {}",
                target.name(),
                gmm.ndim(),
                ntags
            )));
        }
        Ok(Self { target, gmm })
    }

    /// Load `quicksurvey_gmm_{target}.json` from `dir`
    pub fn load(dir: &Path, target: GmmTarget) -> Result<Self, MockError> {
        let path = dir.join(format!("quicksurvey_gmm_{}.json", target.name().to_lowercase()));
        let gmm = GaussianMixture::from_json(&path)?;
        log::info!("Loaded photometry mixture for {} from {}", target.name(), path.display());
        Self::new(target, gmm)
    }

    /// Target class the model describes
    pub fn target(&self) -> GmmTarget {
        self.target
    }

    /// Fill `MAG` and `FLUX_{G,R,Z,W1,W2}` of a spectral metadata table
    pub fn apply<R: Rng + ?Sized>(&self, meta: &mut Table, rng: &mut R) -> Result<(), MockError> {
        let n = meta.len();
        let draws = self.gmm.sample(n, rng)?;

        let mut normmag = Vec::with_capacity(n);
        let mut fluxes: [Vec<f64>; 5] = Default::default();
        for row in &draws {
            let (gr, rz, zw1, w1w2) = (row[1], row[2], row[3], row[4]);
            let (gmag, rmag, zmag, norm) = match self.target {
                GmmTarget::Elg | GmmTarget::Bgs => {
                    let rmag = row[0];
                    (gr + rmag, rmag, rmag - rz, rmag)
                }
                GmmTarget::Lrg => {
                    let zmag = row[0];
                    let rmag = rz + zmag;
                    (gr + rmag, rmag, zmag, zmag)
                }
                GmmTarget::Qso | GmmTarget::Lya => {
                    let gmag = row[0];
                    let rmag = gmag - gr;
                    (gmag, rmag, rmag - rz, gmag)
                }
            };
            let w1mag = zmag - zw1;
            let w2mag = w1mag - w1w2;
            normmag.push(norm);
            for (k, mag) in [gmag, rmag, zmag, w1mag, w2mag].into_iter().enumerate() {
                fluxes[k].push(mag_to_nanomaggies(mag));
            }
        }

        meta.assign("MAG", &Column::from(normmag))?;
        for (band, flux) in crate::schema::columns::BANDS.iter().zip(fluxes) {
            meta.assign(&crate::schema::columns::flux(band), &Column::from(flux))?;
        }
        Ok(())
    }
}
