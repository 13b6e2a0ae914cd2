use super::elg::AllMask;
use super::lrg::LrgQuality;
use super::photo::shift_photo_north;
use super::qso::QsoQuality;
use super::stars::{BandQuality, GaiaRow};
use super::CutsError;
use crate::photometry::unextinct_fluxes;
use crate::schema::columns;
use crate::sky::galactic_latitude;
use crate::table::Table;

/// Gaia `ASTROMETRIC_PARAMS_SOLVED` assumed for every Gaia-matched object
const FIVE_PARAMETER_SOLUTION: i64 = 31;

/// Extinction-corrected g, r, z, W1, W2 fluxes of one object in nanomaggies
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fluxes {
    /// g band
    pub g: f64,
    /// r band
    pub r: f64,
    /// z band
    pub z: f64,
    /// WISE W1
    pub w1: f64,
    /// WISE W2
    pub w2: f64,
}

impl Fluxes {
    /// Fluxes in band order
    pub fn new(g: f64, r: f64, z: f64, w1: f64, w2: f64) -> Self {
        Self { g, r, z, w1, w2 }
    }
}

/// True for point-source morphologies (`PSF`, or `PSF ` from fixed-width strings)
pub fn psflike(objtype: &str) -> bool {
    objtype == "PSF" || objtype == "PSF "
}

/// Per-object quantities derived once from a targets table
#[derive(Debug, Clone, Default)]
pub struct CutInputs {
    /// Object uses the north photometric system
    pub north: Vec<bool>,
    /// Point-source morphology
    pub psflike: Vec<bool>,
    /// Imaging release
    pub release: Vec<i64>,
    /// Extinction-corrected fluxes
    pub fluxes: Vec<Fluxes>,
    /// Observed r flux
    pub obs_rflux: Vec<f64>,
    /// Observed flux times sqrt(ivar), g r z W1 W2
    pub snr: [Vec<f64>; 5],
    /// g, r, z inverse variances
    pub flux_ivar: [Vec<f64>; 3],
    /// g, r, z exposure counts
    pub nobs: [Vec<i64>; 3],
    /// g, r, z blended-flux fractions
    pub fracflux: [Vec<f64>; 3],
    /// g, r, z masked-pixel fractions
    pub fracmasked: [Vec<f64>; 3],
    /// g, r, z central-pixel masks
    pub allmask: [Vec<f64>; 3],
    /// DCHISQ[0] - DCHISQ[1]
    pub delta_chi2: Vec<f64>,
    /// Gaia quantities
    pub gaia: Vec<GaiaRow>,
}

impl CutInputs {
    /// Derive every cut input from a targets table
    ///
    /// With `shift_north` the g, r, z fluxes of north objects are moved onto
    /// the south system first.
    pub fn from_table(targets: &Table, shift_north: bool) -> Result<Self, CutsError> {
        let n = targets.len();
        let north: Vec<bool> = targets.utf8(columns::PHOTSYS)?.iter().map(|s| s == "N").collect();
        let psf: Vec<bool> = targets.utf8(columns::TYPE)?.iter().map(|s| psflike(s)).collect();
        let release: Vec<i64> = targets
            .numeric(columns::RELEASE)?
            .into_iter()
            .map(|v| v as i64)
            .collect();

        let [g, r, z, w1, w2] = unextinct_fluxes(targets)?;
        let fluxes: Vec<Fluxes> = (0..n)
            .map(|i| {
                let (gi, ri, zi) = if shift_north && north[i] {
                    shift_photo_north(g[i], r[i], z[i])
                } else {
                    (g[i], r[i], z[i])
                };
                Fluxes::new(gi, ri, zi, w1[i], w2[i])
            })
            .collect();

        let mut snr: [Vec<f64>; 5] = Default::default();
        for (slot, band) in snr.iter_mut().zip(columns::BANDS) {
            let flux = targets.numeric(&columns::flux(band))?;
            let ivar = targets.numeric(&columns::flux_ivar(band))?;
            *slot = flux.iter().zip(ivar.iter()).map(|(f, iv)| f * iv.sqrt()).collect();
        }

        let optical = |prefix: &str| -> Result<[Vec<f64>; 3], CutsError> {
            let mut out: [Vec<f64>; 3] = Default::default();
            for (slot, band) in out.iter_mut().zip(columns::OPTICAL_BANDS) {
                *slot = targets.numeric(&format!("{}_{}", prefix, band))?;
            }
            Ok(out)
        };
        let nobs_f = optical("NOBS")?;
        let nobs = nobs_f.map(|v| v.into_iter().map(|x| x as i64).collect());

        let (width, dchisq) = targets.list(columns::DCHISQ)?;
        let delta_chi2 = (0..n)
            .map(|i| {
                if width >= 2 {
                    dchisq[i * width] as f64 - dchisq[i * width + 1] as f64
                } else {
                    0.0
                }
            })
            .collect();

        Ok(Self {
            gaia: gaia_rows(targets)?,
            north,
            psflike: psf,
            release,
            fluxes,
            obs_rflux: targets.numeric(&columns::flux("R"))?,
            snr,
            flux_ivar: optical("FLUX_IVAR")?,
            nobs,
            fracflux: optical("FRACFLUX")?,
            fracmasked: optical("FRACMASKED")?,
            allmask: optical("ALLMASK")?,
            delta_chi2,
        })
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.fluxes.len()
    }

    /// True if there are no objects
    pub fn is_empty(&self) -> bool {
        self.fluxes.is_empty()
    }

    /// LRG quality inputs of object `i`
    pub fn lrg_quality(&self, i: usize) -> LrgQuality {
        LrgQuality {
            rsnr: self.snr[1][i],
            zsnr: self.snr[2][i],
            w1snr: self.snr[3][i],
            gflux_ivar: self.flux_ivar[0][i],
        }
    }

    /// QSO quality inputs of object `i`
    pub fn qso_quality(&self, i: usize) -> QsoQuality {
        QsoQuality {
            w1snr: self.snr[3][i],
            w2snr: self.snr[4][i],
            delta_chi2: self.delta_chi2[i],
            release: self.release[i],
            psflike: self.psflike[i],
        }
    }

    /// Central-pixel masks of object `i`
    pub fn allmask(&self, i: usize) -> AllMask {
        AllMask {
            g: self.allmask[0][i],
            r: self.allmask[1][i],
            z: self.allmask[2][i],
        }
    }

    /// Imaging quality of object `i`
    pub fn band_quality(&self, i: usize) -> BandQuality {
        BandQuality {
            fracflux: [self.fracflux[0][i], self.fracflux[1][i], self.fracflux[2][i]],
            flux_ivar: [self.flux_ivar[0][i], self.flux_ivar[1][i], self.flux_ivar[2][i]],
            nobs: [self.nobs[0][i], self.nobs[1][i], self.nobs[2][i]],
            fracmasked: [self.fracmasked[0][i], self.fracmasked[1][i], self.fracmasked[2][i]],
        }
    }
}

fn gaia_rows(targets: &Table) -> Result<Vec<GaiaRow>, CutsError> {
    let ref_id = targets.numeric(columns::REF_ID)?;
    let pmra = targets.numeric("PMRA")?;
    let pmdec = targets.numeric("PMDEC")?;
    let parallax = targets.numeric("PARALLAX")?;
    let parallax_ivar = targets.numeric("PARALLAX_IVAR")?;
    let gmag = targets.numeric("GAIA_PHOT_G_MEAN_MAG")?;
    let bpmag = targets.numeric("GAIA_PHOT_BP_MEAN_MAG")?;
    let rpmag = targets.numeric("GAIA_PHOT_RP_MEAN_MAG")?;
    let excess_noise = targets.numeric("GAIA_ASTROMETRIC_EXCESS_NOISE")?;
    let duplicated = targets.bool("GAIA_DUPLICATED_SOURCE")?;
    let galb = galactic_latitude(targets.f64(columns::RA)?, targets.f64(columns::DEC)?);

    Ok((0..targets.len())
        .map(|i| {
            let matched = ref_id[i] != -1.0;
            GaiaRow {
                matched,
                pmra: pmra[i],
                pmdec: pmdec[i],
                parallax: parallax[i],
                parallax_over_error: if parallax_ivar[i] > 0.0 {
                    parallax[i] * parallax_ivar[i].sqrt()
                } else {
                    0.0
                },
                gmag: gmag[i],
                bpmag: bpmag[i],
                rpmag: rpmag[i],
                excess_noise: excess_noise[i],
                duplicated: duplicated[i],
                params_solved: if matched { FIVE_PARAMETER_SOLUTION } else { 0 },
                galb: galb[i],
            }
        })
        .collect())
}
