use super::Fluxes;

/// Central-pixel mask bits in g, r and z
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AllMask {
    /// g-band ALLMASK
    pub g: f64,
    /// r-band ALLMASK
    pub r: f64,
    /// z-band ALLMASK
    pub z: f64,
}

/// ELG selection in the north (BASS/MzLS) photometric system
pub fn is_elg_north(f: &Fluxes, allmask: &AllMask) -> bool {
    if allmask.g != 0.0 || allmask.r != 0.0 || allmask.z != 0.0 {
        return false;
    }
    let (g, r, z) = (f.g, f.r, f.z);
    let cut = g < 10f64.powf((22.5 - 21.0) / 2.5)
        && g > 10f64.powf((22.5 - 23.7) / 2.5)
        && r > 10f64.powf((22.5 - 23.3) / 2.5)
        && z > r * 10f64.powf(0.3 / 2.5)
        && z < r * 10f64.powf(1.6 / 2.5);
    if !cut {
        return false;
    }
    let (r, z) = (r.max(0.0), z.max(0.0));
    // (g - r) < 1.40 (r - z) - 0.35 and (g - r) < 1.6 - 1.2 (r - z)
    r.powf(2.40) < g * z.powf(1.40) * 10f64.powf(-0.35 / 2.5)
        && z.powf(1.2) < g * r.powf(0.2) * 10f64.powf(1.6 / 2.5)
}

/// ELG selection in the south (DECaLS) photometric system
pub fn is_elg_south(f: &Fluxes) -> bool {
    let (g, r, z) = (f.g, f.r, f.z);
    let cut = g < 10f64.powf((22.5 - 21.0) / 2.5)
        && r > 10f64.powf((22.5 - 23.4) / 2.5)
        && z > r * 10f64.powf(0.3 / 2.5)
        && z < r * 10f64.powf(1.6 / 2.5);
    if !cut {
        return false;
    }
    let (r, z) = (r.max(0.0), z.max(0.0));
    r.powf(2.15) < g * z.powf(1.15) * 10f64.powf(-0.15 / 2.5)
        && z.powf(1.2) < g * r.powf(0.2) * 10f64.powf(1.6 / 2.5)
}

/// ELG selection dispatched on the photometric system
pub fn is_elg(f: &Fluxes, allmask: &AllMask, south: bool) -> bool {
    if south {
        is_elg_south(f)
    } else {
        is_elg_north(f, allmask)
    }
}
