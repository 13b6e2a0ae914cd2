/// Real part of the principal complex power `x^p`
///
/// For negative `x` the principal branch gives `|x|^p * cos(p * pi)`, which is
/// not `sign(x) * |x|^p`. Zero maps to zero for positive exponents.
pub fn complex_pow_real(x: f64, p: f64) -> f64 {
    if x > 0.0 {
        x.powf(p)
    } else if x == 0.0 {
        if p > 0.0 {
            0.0
        } else {
            f64::NAN
        }
    } else if x < 0.0 {
        (-x).powf(p) * (p * std::f64::consts::PI).cos()
    } else {
        f64::NAN
    }
}
