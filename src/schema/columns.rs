//! Column name constants shared by the targets and truth tables.

/// Unique target identifier
pub const TARGETID: &str = "TARGETID";
/// Mock catalog identifier
pub const MOCKID: &str = "MOCKID";
/// Right ascension (degrees)
pub const RA: &str = "RA";
/// Declination (degrees)
pub const DEC: &str = "DEC";
/// Morphological type (PSF, REX, EXP, DEV, COMP)
pub const TYPE: &str = "TYPE";
/// Photometric system letter (N or S)
pub const PHOTSYS: &str = "PHOTSYS";
/// Imaging data release tag
pub const RELEASE: &str = "RELEASE";
/// Brick name
pub const BRICKNAME: &str = "BRICKNAME";
/// Brick id
pub const BRICKID: &str = "BRICKID";
/// Galactic reddening E(B-V)
pub const EBV: &str = "EBV";
/// Primary survey bitmask
pub const DESI_TARGET: &str = "DESI_TARGET";
/// Bright galaxy survey bitmask
pub const BGS_TARGET: &str = "BGS_TARGET";
/// Milky Way survey bitmask
pub const MWS_TARGET: &str = "MWS_TARGET";
/// Contamination bitmask
pub const CONTAM_TARGET: &str = "CONTAM_TARGET";
/// Fibre assignment subpriority
pub const SUBPRIORITY: &str = "SUBPRIORITY";
/// HEALPix pixel the target belongs to
pub const HPXPIXEL: &str = "HPXPIXEL";
/// Model chi-squared differences
pub const DCHISQ: &str = "DCHISQ";
/// Gaia reference id
pub const REF_ID: &str = "REF_ID";
/// True redshift
pub const TRUEZ: &str = "TRUEZ";
/// True redshift without redshift-space distortions
pub const TRUEZ_NORSD: &str = "TRUEZ_NORSD";
/// True spectral type (GALAXY, QSO, STAR, WD, SKY)
pub const TRUESPECTYPE: &str = "TRUESPECTYPE";
/// Template family
pub const TEMPLATETYPE: &str = "TEMPLATETYPE";
/// Template subtype
pub const TEMPLATESUBTYPE: &str = "TEMPLATESUBTYPE";
/// Template index within its library
pub const TEMPLATEID: &str = "TEMPLATEID";
/// Random seed used to draw the spectrum
pub const SEED: &str = "SEED";
/// Normalisation magnitude
pub const MAG: &str = "MAG";
/// Normalisation filter name
pub const MAGFILTER: &str = "MAGFILTER";
/// Redshift column of the spectral metadata table
pub const REDSHIFT: &str = "REDSHIFT";
/// Template family of the spectral metadata table
pub const OBJTYPE: &str = "OBJTYPE";
/// Template subtype of the spectral metadata table
pub const SUBTYPE: &str = "SUBTYPE";

/// Photometric bands carried by every flux column family, in order
pub const BANDS: [&str; 5] = ["G", "R", "Z", "W1", "W2"];
/// Optical bands with depth and quality columns
pub const OPTICAL_BANDS: [&str; 3] = ["G", "R", "Z"];

/// `FLUX_{band}`
pub fn flux(band: &str) -> String {
    format!("FLUX_{}", band)
}

/// `FLUX_IVAR_{band}`
pub fn flux_ivar(band: &str) -> String {
    format!("FLUX_IVAR_{}", band)
}

/// `MW_TRANSMISSION_{band}`
pub fn mw_transmission(band: &str) -> String {
    format!("MW_TRANSMISSION_{}", band)
}

/// `PSFDEPTH_{band}`
pub fn psfdepth(band: &str) -> String {
    format!("PSFDEPTH_{}", band)
}

/// `GALDEPTH_{band}`
pub fn galdepth(band: &str) -> String {
    format!("GALDEPTH_{}", band)
}
