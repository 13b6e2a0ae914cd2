//! HEALPix NESTED pixelisation.
//!
//! Only the handful of operations the pipeline needs: angle to pixel, pixel
//! centre, pixel area and moving pixel ids between resolutions. `nside` must be
//! a power of two.

use std::f64::consts::{FRAC_PI_2, PI};

const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

/// Total number of pixels at `nside`
pub fn nside2npix(nside: u32) -> i64 {
    12 * nside as i64 * nside as i64
}

/// True if `nside` is a valid NESTED resolution
pub fn is_valid_nside(nside: u32) -> bool {
    nside > 0 && nside.is_power_of_two() && nside <= (1 << 29)
}

fn order(nside: u32) -> u32 {
    nside.trailing_zeros()
}

/// Pixel area in square degrees
pub fn nside2pixarea(nside: u32) -> f64 {
    let full_sky = 4.0 * PI * (180.0 / PI).powi(2);
    full_sky / nside2npix(nside) as f64
}

fn spread_bits(v: i64) -> i64 {
    let mut out = 0i64;
    for bit in 0..30 {
        out |= ((v >> bit) & 1) << (2 * bit);
    }
    out
}

fn compress_bits(v: i64) -> i64 {
    let mut out = 0i64;
    for bit in 0..30 {
        out |= ((v >> (2 * bit)) & 1) << bit;
    }
    out
}

fn xyf2nest(nside: u32, ix: i64, iy: i64, face: i64) -> i64 {
    (face << (2 * order(nside))) + spread_bits(ix) + (spread_bits(iy) << 1)
}

fn nest2xyf(nside: u32, pix: i64) -> (i64, i64, i64) {
    let npface = nside as i64 * nside as i64;
    let face = pix / npface;
    let ipf = pix & (npface - 1);
    (compress_bits(ipf), compress_bits(ipf >> 1), face)
}

/// NESTED pixel containing (RA, Dec) in degrees
pub fn ang2pix(nside: u32, ra: f64, dec: f64) -> i64 {
    let ns = nside as i64;
    let z = dec.to_radians().sin();
    let za = z.abs();
    let phi = ra.to_radians().rem_euclid(2.0 * PI);
    let tt = phi / FRAC_PI_2;

    if za <= 2.0 / 3.0 {
        let temp1 = nside as f64 * (0.5 + tt);
        let temp2 = nside as f64 * (z * 0.75);
        let jp = (temp1 - temp2) as i64;
        let jm = (temp1 + temp2) as i64;
        let ifp = jp / ns;
        let ifm = jm / ns;
        let face = if ifp == ifm {
            ifp | 4
        } else if ifp < ifm {
            ifp
        } else {
            ifm + 8
        };
        let ix = jm & (ns - 1);
        let iy = ns - (jp & (ns - 1)) - 1;
        xyf2nest(nside, ix, iy, face)
    } else {
        let ntt = (tt as i64).min(3);
        let tp = tt - ntt as f64;
        let tmp = nside as f64 * (3.0 * (1.0 - za)).sqrt();
        let jp = ((tp * tmp) as i64).min(ns - 1);
        let jm = (((1.0 - tp) * tmp) as i64).min(ns - 1);
        if z >= 0.0 {
            xyf2nest(nside, ns - jm - 1, ns - jp - 1, ntt)
        } else {
            xyf2nest(nside, jp, jm, ntt + 8)
        }
    }
}

/// Vectorised [`ang2pix`]
pub fn ang2pix_many(nside: u32, ra: &[f64], dec: &[f64]) -> Vec<i64> {
    ra.iter()
        .zip(dec.iter())
        .map(|(&r, &d)| ang2pix(nside, r, d))
        .collect()
}

/// Centre of a NESTED pixel as (RA, Dec) in degrees
pub fn pix2ang(nside: u32, pix: i64) -> (f64, f64) {
    let ns = nside as i64;
    let npix = nside2npix(nside);
    let fact2 = 4.0 / npix as f64;
    let fact1 = (2 * ns) as f64 * fact2;
    let (ix, iy, face) = nest2xyf(nside, pix);
    let jr = JRLL[face as usize] * ns - ix - iy - 1;

    let (nr, z, kshift) = if jr < ns {
        (jr, 1.0 - (jr * jr) as f64 * fact2, 0)
    } else if jr > 3 * ns {
        let nr = 4 * ns - jr;
        (nr, (nr * nr) as f64 * fact2 - 1.0, 0)
    } else {
        (ns, (2 * ns - jr) as f64 * fact1, (jr - ns) & 1)
    };

    let mut jp = (JPLL[face as usize] * nr + ix - iy + 1 + kshift) / 2;
    if jp > 4 * ns {
        jp -= 4 * ns;
    }
    if jp < 1 {
        jp += 4 * ns;
    }
    let phi = (jp as f64 - (kshift + 1) as f64 * 0.5) * (FRAC_PI_2 / nr as f64);
    let dec = 90.0 - z.clamp(-1.0, 1.0).acos().to_degrees();
    (phi.to_degrees(), dec)
}

/// Parent pixel of `pix` at a coarser `nside_out`
pub fn degrade(nside_in: u32, nside_out: u32, pix: i64) -> i64 {
    let shift = 2 * (order(nside_in) - order(nside_out));
    pix >> shift
}

/// Range of child pixels of `pix` at a finer `nside_out`
pub fn upgrade(nside_in: u32, nside_out: u32, pix: i64) -> std::ops::Range<i64> {
    let shift = 2 * (order(nside_out) - order(nside_in));
    (pix << shift)..((pix + 1) << shift)
}

/// Move a NESTED pixel id between resolutions
///
/// Coarsening returns the parent; refining returns the first child.
pub fn regrade(nside_in: u32, nside_out: u32, pix: i64) -> i64 {
    if nside_out <= nside_in {
        degrade(nside_in, nside_out, pix)
    } else {
        upgrade(nside_in, nside_out, pix).start
    }
}
