use super::power::complex_pow_real;

/// Shift north (BASS/MzLS) g, r, z fluxes onto the south (DECaLS) system
///
/// Colour terms use the complex-power form and are only applied where both
/// fluxes of the colour are non-zero.
pub fn shift_photo_north(g: f64, r: f64, z: f64) -> (f64, f64, f64) {
    let gscale = 10f64.powf(-0.4 * 0.029);
    let rscale = 10f64.powf(0.4 * 0.012);

    let gshift = if g != 0.0 && r != 0.0 {
        g * gscale * complex_pow_real(g / r, -0.068)
    } else {
        g * gscale
    };
    let (rshift, zshift) = if r != 0.0 && z != 0.0 {
        (
            r * rscale * complex_pow_real(r / z, -0.029),
            z * complex_pow_real(r / z, 0.009),
        )
    } else {
        (r * rscale, z)
    };
    (gshift, rshift, zshift)
}

/// Plain real-power version of [`shift_photo_north`]; NaN for negative colours
pub fn shift_photo_north_pure(g: f64, r: f64, z: f64) -> (f64, f64, f64) {
    (
        g * 10f64.powf(-0.4 * 0.029) * (g / r).powf(-0.068),
        r * 10f64.powf(0.4 * 0.012) * (r / z).powf(-0.029),
        z * (r / z).powf(0.009),
    )
}
