use super::forest::{QsoForests, DR3_FOREST, DR5_FOREST, DR5_HIGHZ_FOREST};
use super::{CutsError, Fluxes};

/// Number of random-forest features per object
pub const NFEATURES: usize = 11;

/// Faint limit of the random-forest preselection (r magnitude)
const RF_RMAX: f64 = 22.7;
/// Bright limit of the random-forest preselection (r magnitude)
const RF_RMIN: f64 = 17.5;

/// QSO colour selection; north and south share one set of cuts
///
/// With `optical` the WISE colour cuts are skipped.
pub fn is_qso_colors(f: &Fluxes, optical: bool) -> bool {
    let (g, r, z, w1, w2) = (f.g, f.r, f.z, f.w1, f.w2);
    let wflux = 0.75 * w1 + 0.25 * w2;
    let grzflux = (g + 0.8 * r + 0.5 * z) / 2.3;

    let mut qso = r > 10f64.powf((22.5 - 22.7) / 2.5)
        && grzflux < 10f64.powf((22.5 - 17.0) / 2.5)
        && r < g * 10f64.powf(1.3 / 2.5)
        && z > r * 10f64.powf(-0.3 / 2.5)
        && z < r * 10f64.powf(1.1 / 2.5);
    if !optical {
        qso = qso
            && w2 > w1 * 10f64.powf(-0.4 / 2.5)
            && wflux * g > z * grzflux * 10f64.powf(-1.0 / 2.5);
    }

    // reject the stellar locus
    let (rc, zc) = (r.max(0.0), z.max(0.0));
    let mut mainseq = r > g * 10f64.powf(0.20 / 2.5)
        && rc.powf(2.5) > g * zc.powf(1.5) * 10f64.powf((-0.100 + 0.175) / 2.5)
        && rc.powf(2.5) < g * zc.powf(1.5) * 10f64.powf((0.100 + 0.175) / 2.5);
    if !optical {
        mainseq = mainseq && w2 < w1 * 10f64.powf(0.3 / 2.5);
    }
    qso && !mainseq
}

/// Per-object quantities used by the QSO cuts besides the fluxes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QsoQuality {
    /// W1 flux times sqrt(ivar)
    pub w1snr: f64,
    /// W2 flux times sqrt(ivar)
    pub w2snr: f64,
    /// DCHISQ[0] - DCHISQ[1]
    pub delta_chi2: f64,
    /// Imaging release
    pub release: i64,
    /// Point-source morphology
    pub psflike: bool,
}

/// QSO colour-cut selection
pub fn is_qso_cuts(f: &Fluxes, q: &QsoQuality, optical: bool) -> bool {
    is_qso_colors(f, optical)
        && q.w1snr > 4.0
        && q.w2snr > 2.0
        && (q.delta_chi2 > 40.0 || q.release >= 5000)
        && q.psflike
}

/// Random-forest features: nine colours, W1 - W2 and r
///
/// Fluxes are floored at 1e-4 nanomaggies; a floored band has magnitude 0,
/// which fails the `phot_ok` flag returned alongside.
pub fn forest_features(f: &Fluxes) -> ([f64; NFEATURES], f64, bool) {
    const LIMIT: f64 = 1e-4;
    let mag = |flux: f64| {
        let flux = flux.max(LIMIT);
        if flux > LIMIT {
            22.5 - 2.5 * flux.log10()
        } else {
            0.0
        }
    };
    let (g, r, z, w1, w2) = (mag(f.g), mag(f.r), mag(f.z), mag(f.w1), mag(f.w2));
    let phot_ok = g > 0.0 && r > 0.0 && z > 0.0 && w1 > 0.0 && w2 > 0.0;
    let features = [
        g - r,
        r - z,
        g - z,
        g - w1,
        r - w1,
        z - w1,
        g - w2,
        r - w2,
        z - w2,
        w1 - w2,
        r,
    ];
    (features, r, phot_ok)
}

/// Probability threshold of the DR3 forest at magnitude `r`
pub fn dr3_threshold(r: f64) -> f64 {
    if r > 20.0 {
        0.95 - (r - 20.0) * 0.08
    } else {
        0.95
    }
}

/// Probability threshold of the DR5 forest at magnitude `r`
pub fn dr5_threshold(r: f64) -> f64 {
    if r > 22.3 {
        0.8225 - 0.53 * (r - 22.3)
    } else if r > 21.5 {
        0.8625 - 0.05 * (r - 21.5)
    } else if r > 20.8 {
        0.88 - (r - 20.8) * 0.025
    } else {
        0.88
    }
}

/// Probability threshold of the DR5 high-redshift forest at magnitude `r`
pub fn dr5_highz_threshold(r: f64) -> f64 {
    if r > 20.5 {
        0.55 - (r - 20.5) * 0.025
    } else {
        0.55
    }
}

/// Random-forest QSO selection
///
/// Objects passing the preselection are scored by the DR3 forest before
/// release 5000 and by the DR5 and DR5 high-z forests afterwards. A forest
/// is only required once an object needs it.
pub fn is_qso_randomforest(f: &Fluxes, q: &QsoQuality, forests: &QsoForests) -> Result<bool, CutsError> {
    let (features, r, phot_ok) = forest_features(f);
    let mut preselected = r < RF_RMAX && r > RF_RMIN && phot_ok && q.psflike;
    if q.release < 5000 {
        preselected &= q.delta_chi2 > 30.0;
    }
    if !preselected {
        return Ok(false);
    }
    if q.release < 5000 {
        let proba = forests.get(DR3_FOREST)?.predict_proba(&features);
        Ok(proba >= dr3_threshold(r))
    } else {
        let proba = forests.get(DR5_FOREST)?.predict_proba(&features);
        let highz = forests.get(DR5_HIGHZ_FOREST)?.predict_proba(&features);
        Ok(proba >= dr5_threshold(r) || highz >= dr5_highz_threshold(r))
    }
}
