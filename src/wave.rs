//! Output wavelength sampling shared by every spectral generator.

/// First wavelength of the output grid in Angstrom
pub const WAVE_MIN: f64 = 3590.0;
/// Exclusive upper bound of the output grid in Angstrom
pub const WAVE_MAX: f64 = 9834.0;
/// Pixel size in Angstrom
pub const WAVE_STEP: f64 = 0.2;

/// Fixed output wavelength grid, `[3590, 9834)` in 0.2 A steps
pub fn wavelength_grid() -> Vec<f64> {
    let npix = ((WAVE_MAX - WAVE_MIN) / WAVE_STEP).round() as usize;
    (0..npix).map(|i| WAVE_MIN + i as f64 * WAVE_STEP).collect()
}

/// Piecewise-linear interpolation, clamped to the end values outside `xp`
///
/// `xp` must be ascending.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    if xp.is_empty() {
        return f64::NAN;
    }
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }
    let hi = xp.partition_point(|&v| v <= x).min(last);
    let lo = hi - 1;
    let dx = xp[hi] - xp[lo];
    if dx <= 0.0 {
        return fp[hi];
    }
    fp[lo] + (fp[hi] - fp[lo]) * (x - xp[lo]) / dx
}

/// Resample a spectrum onto a new wavelength grid by linear interpolation
///
/// Output pixels outside the input grid are zero.
pub fn resample(wave: &[f64], flux: &[f64], outwave: &[f64]) -> Vec<f64> {
    let (Some(&lo), Some(&hi)) = (wave.first(), wave.last()) else {
        return vec![0.0; outwave.len()];
    };
    outwave
        .iter()
        .map(|&w| {
            if w < lo || w > hi {
                0.0
            } else {
                interp(w, wave, flux)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_bounds() {
        let wave = wavelength_grid();
        assert_eq!(wave.len(), 31220);
        assert_eq!(wave[0], 3590.0);
        assert!(*wave.last().unwrap() < WAVE_MAX);
        assert!((wave[1] - wave[0] - WAVE_STEP).abs() < 1e-9);
    }

    #[test]
    fn test_interp_clamps() {
        let xp = [1.0, 2.0, 3.0];
        let fp = [10.0, 20.0, 40.0];
        assert_eq!(interp(0.0, &xp, &fp), 10.0);
        assert_eq!(interp(5.0, &xp, &fp), 40.0);
        assert!((interp(2.5, &xp, &fp) - 30.0).abs() < 1e-12);
        assert_eq!(interp(2.0, &xp, &fp), 20.0);
    }

    #[test]
    fn test_resample_zero_outside() {
        let out = resample(&[4000.0, 5000.0], &[1.0, 3.0], &[3000.0, 4500.0, 6000.0]);
        assert_eq!(out, vec![0.0, 2.0, 0.0]);
    }
}
