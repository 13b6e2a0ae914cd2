/// Faint BGS: 19.5 < r < 20 and not point-like
///
/// North and south share one set of cuts.
pub fn is_bgs_faint(rflux: f64, psflike: bool) -> bool {
    rflux > 10f64.powf((22.5 - 20.0) / 2.5) && rflux <= 10f64.powf((22.5 - 19.5) / 2.5) && !psflike
}

/// Bright BGS: r < 19.5 and not point-like
pub fn is_bgs_bright(rflux: f64, psflike: bool) -> bool {
    rflux > 10f64.powf((22.5 - 19.5) / 2.5) && !psflike
}
