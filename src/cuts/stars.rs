use super::Fluxes;

/// Gaia astrometry and photometry of one object
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GaiaRow {
    /// Object has a Gaia match (REF_ID != -1)
    pub matched: bool,
    /// Proper motion in RA (mas/yr)
    pub pmra: f64,
    /// Proper motion in Dec (mas/yr)
    pub pmdec: f64,
    /// Parallax (mas)
    pub parallax: f64,
    /// Parallax times sqrt(PARALLAX_IVAR)
    pub parallax_over_error: f64,
    /// G magnitude
    pub gmag: f64,
    /// BP magnitude
    pub bpmag: f64,
    /// RP magnitude
    pub rpmag: f64,
    /// Astrometric excess noise
    pub excess_noise: f64,
    /// Duplicated-source flag
    pub duplicated: bool,
    /// Astrometric parameters solved (31 for a five-parameter solution)
    pub params_solved: i64,
    /// Galactic latitude (degrees)
    pub galb: f64,
}

impl GaiaRow {
    /// Total proper motion
    pub fn pm(&self) -> f64 {
        (self.pmra * self.pmra + self.pmdec * self.pmdec).sqrt()
    }
}

/// Imaging quality of the g, r and z bands
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandQuality {
    /// Fraction of flux from neighbouring sources
    pub fracflux: [f64; 3],
    /// Flux inverse variance
    pub flux_ivar: [f64; 3],
    /// Number of exposures
    pub nobs: [i64; 3],
    /// Fraction of masked pixels
    pub fracmasked: [f64; 3],
}

/// Standard-star colours: 0 < g - r < 0.35 and r - z < 0.2
pub fn is_std_colors(f: &Fluxes) -> bool {
    let g = f.g.max(1e-16);
    let r = f.r.max(1e-16);
    let z = f.z.max(1e-16);
    let gr = 2.5 * (r / g).log10();
    let rz = 2.5 * (z / r).log10();
    rz < 0.2 && gr > 0.0 && gr < 0.35
}

/// Standard-star astrometry: clean five-parameter solution, distant, moving
pub fn is_std_gaia(gaia: &GaiaRow) -> bool {
    !(gaia.bpmag - gaia.rpmag).is_nan()
        && gaia.excess_noise < 1.0
        && gaia.params_solved == 31
        && gaia.pmra.is_finite()
        && gaia.pmdec.is_finite()
        && gaia.parallax < 1.0
        && gaia.pm() > 2.0
        && !gaia.duplicated
}

/// Standard star; `bright` selects 15 <= G < 18 instead of 16 <= G < 19
pub fn is_std(f: &Fluxes, quality: &BandQuality, gaia: &GaiaRow, psflike: bool, bright: bool) -> bool {
    if !(is_std_colors(f) && is_std_gaia(gaia) && psflike) {
        return false;
    }
    for band in 0..3 {
        let clean = quality.fracflux[band] < 0.01
            && quality.flux_ivar[band] > 0.0
            && quality.nobs[band] > 0
            && quality.fracmasked[band] > 0.0;
        if !clean {
            return false;
        }
    }
    let (gbright, gfaint) = if bright { (15.0, 18.0) } else { (16.0, 19.0) };
    gaia.gmag >= gbright && gaia.gmag < gfaint
}

/// Milky Way main-sample selection
///
/// Returns `(main, red, blue)`; north and south share one set of cuts.
/// `obs_rflux` is the r flux before the extinction correction.
pub fn is_mws_main(f: &Fluxes, obs_rflux: f64, gaia: &GaiaRow, psflike: bool) -> (bool, bool, bool) {
    let finite = !(f.r.is_nan() || f.g.is_nan() || gaia.parallax.is_nan() || gaia.pmra.is_nan() || gaia.pmdec.is_nan());
    let mws = finite
        && gaia.matched
        && psflike
        && f.r > 10f64.powf((22.5 - 19.0) / 2.5)
        && f.r <= 10f64.powf((22.5 - 16.0) / 2.5)
        && obs_rflux > 10f64.powf((22.5 - 20.0) / 2.5);
    let blue = mws && f.r < f.g * 10f64.powf(0.7 / 2.5);
    let red = mws && gaia.parallax < 1.0 && f.r >= f.g * 10f64.powf(0.7 / 2.5) && gaia.pm() < 7.0;
    (mws, red, blue)
}

/// Nearby stars: G < 20 and parallax > 10 mas
pub fn is_mws_nearby(gaia: &GaiaRow) -> bool {
    gaia.matched && gaia.gmag < 20.0 && gaia.parallax > 10.0
}

/// White dwarfs from their position in the Gaia colour-magnitude diagram
pub fn is_mws_wd(gaia: &GaiaRow) -> bool {
    let finite = !(gaia.gmag.is_nan() || gaia.bpmag.is_nan() || gaia.rpmag.is_nan() || gaia.parallax.is_nan());
    if !(finite && gaia.matched && gaia.gmag < 20.0 && gaia.galb.abs() > 20.0 && gaia.parallax_over_error > 1.0) {
        return false;
    }
    let gabs = gaia.gmag + 5.0 * gaia.parallax.max(1e-16).log10() - 10.0;
    let br = gaia.bpmag - gaia.rpmag;
    gabs > 5.0
        && gabs > 5.93 + 5.047 * br
        && gabs > 6.0 * br * br * br - 21.77 * br * br + 27.91 * br + 0.897
        && br < 1.7
        && gaia.pm() > 2.0
}

/// Stars redder than g - r = 0
pub fn is_mwsstar_colors(f: &Fluxes) -> bool {
    2.5 * (f.r / f.g).log10() > 0.0
}
