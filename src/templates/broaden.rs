use crate::mock::C_LIGHT;

/// Kernel half-width in units of sigma
const KERNEL_HALF_WIDTH: f64 = 4.0;

/// Convolve a spectrum with a Gaussian of constant velocity width
///
/// `vdisp` is the line-of-sight dispersion in km/s, so the kernel width in
/// wavelength grows linearly with wavelength. Non-positive dispersions return
/// the input unchanged. The kernel is truncated at four sigma and
/// renormalised near the grid edges.
pub fn broaden(wave: &[f64], flux: &[f64], vdisp: f64) -> Vec<f64> {
    if vdisp <= 0.0 || wave.len() < 2 {
        return flux.to_vec();
    }
    let mut out = vec![0.0; flux.len()];
    let mut lo = 0;
    let mut hi = 0;
    for (j, &w) in wave.iter().enumerate() {
        let sigma = vdisp / C_LIGHT * w;
        let reach = KERNEL_HALF_WIDTH * sigma;
        while wave[lo] < w - reach {
            lo += 1;
        }
        if hi < j {
            hi = j;
        }
        while hi + 1 < wave.len() && wave[hi + 1] <= w + reach {
            hi += 1;
        }
        let mut num = 0.0;
        let mut den = 0.0;
        for k in lo..=hi {
            let x = (wave[k] - w) / sigma;
            let weight = (-0.5 * x * x).exp();
            num += weight * flux[k];
            den += weight;
        }
        out[j] = if den > 0.0 { num / den } else { flux[j] };
    }
    out
}
