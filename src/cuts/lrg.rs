use super::power::complex_pow_real;
use super::Fluxes;

/// LRG colour selection; north and south share one set of cuts
///
/// `ggood` marks a usable g-band measurement for the bright-outlier veto.
pub fn is_lrg_colors(f: &Fluxes, ggood: bool) -> bool {
    let (g, r, z, w1) = (f.g, f.r, f.z, f.w1);
    // 18 < z < 20.4
    z > 10f64.powf(0.4 * (22.5 - 20.4))
        && z < 10f64.powf(0.4 * (22.5 - 18.0))
        // 0.8 < r - z < 2.5
        && z < 10f64.powf(0.4 * 2.5) * r
        && z > 10f64.powf(0.4 * 0.8) * r
        // star-galaxy separation in z - W1 vs r - z
        && w1 * complex_pow_real(r, 0.7) > complex_pow_real(z, 1.7) * 10f64.powf(-0.4 * 0.6)
        // sliding cut
        && z.powi(3) > 10f64.powf(0.4 * (22.5 + 2.4 - 19.45)) * r.powi(2)
        && z.powi(3) < 10f64.powf(0.4 * (22.5 + 2.4 - 17.4)) * r.powi(2)
        && (z > 10f64.powf(0.4 * 1.2) * r || (ggood && r > 10f64.powf(0.4 * 1.7) * g))
}

/// Signal-to-noise of r, z and W1 for the LRG quality cuts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LrgQuality {
    /// r-band flux times sqrt(ivar)
    pub rsnr: f64,
    /// z-band flux times sqrt(ivar)
    pub zsnr: f64,
    /// W1 flux times sqrt(ivar)
    pub w1snr: f64,
    /// g-band inverse variance
    pub gflux_ivar: f64,
}

/// LRG selection: quality cuts plus [`is_lrg_colors`]
pub fn is_lrg(f: &Fluxes, q: &LrgQuality) -> bool {
    q.rsnr > 0.0
        && q.zsnr > 0.0
        && q.w1snr > 4.0
        && f.r > 0.0
        && f.z > 0.0
        && is_lrg_colors(f, q.gflux_ivar > 0.0)
}

/// LRG selection split by the number of passes needed
///
/// Returns `(lrg, one_pass, two_pass)`: one pass for z < 20, two for
/// 20 < z < 20.4.
pub fn is_lrg_pass(f: &Fluxes, q: &LrgQuality) -> (bool, bool, bool) {
    let lrg = is_lrg(f, q);
    let one = lrg && f.z > 10f64.powf((22.5 - 20.0) / 2.5) && f.z <= 10f64.powf((22.5 - 18.0) / 2.5);
    let two = lrg && f.z > 10f64.powf((22.5 - 20.4) / 2.5) && f.z <= 10f64.powf((22.5 - 20.0) / 2.5);
    (lrg, one, two)
}
