//! Equatorial to Galactic coordinate conversion.

/// RA of the north Galactic pole (J2000), degrees
const RA_NGP: f64 = 192.859_508;
/// Dec of the north Galactic pole (J2000), degrees
const DEC_NGP: f64 = 27.128_336;
/// Galactic longitude of the north celestial pole, degrees
const L_NCP: f64 = 122.932;

/// Galactic (l, b) in degrees for an equatorial position in degrees
pub fn radec_to_galactic(ra: f64, dec: f64) -> (f64, f64) {
    let (ra, dec) = (ra.to_radians(), dec.to_radians());
    let (ra0, dec0) = (RA_NGP.to_radians(), DEC_NGP.to_radians());
    let dra = ra - ra0;

    let sinb = dec.sin() * dec0.sin() + dec.cos() * dec0.cos() * dra.cos();
    let b = sinb.clamp(-1.0, 1.0).asin();

    let y = dec.cos() * dra.sin();
    let x = dec.sin() * dec0.cos() - dec.cos() * dec0.sin() * dra.cos();
    let l = (L_NCP - y.atan2(x).to_degrees()).rem_euclid(360.0);
    (l, b.to_degrees())
}

/// Galactic latitude in degrees for many positions
pub fn galactic_latitude(ra: &[f64], dec: &[f64]) -> Vec<f64> {
    ra.iter()
        .zip(dec.iter())
        .map(|(&r, &d)| radec_to_galactic(r, d).1)
        .collect()
}
