use crate::table::ColumnKind;
use ColumnKind::{
    Boolean as B, Float32 as F4, Float64 as F8, Int16 as I2, Int32 as I4, Int64 as I8, Utf8 as S,
};

/// Declared name, type, default and unit of one fixed-schema column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    /// Column name
    pub name: &'static str,
    /// Storage type
    pub kind: ColumnKind,
    /// Initial value for numeric columns
    pub default: f64,
    /// Physical unit, if any
    pub unit: Option<&'static str>,
}

const fn spec(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        default: 0.0,
        unit: None,
    }
}

const fn with_unit(name: &'static str, kind: ColumnKind, unit: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        default: 0.0,
        unit: Some(unit),
    }
}

const fn with_default(name: &'static str, kind: ColumnKind, default: f64) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        default,
        unit: None,
    }
}

const NMGY: &str = "nanomaggies";
const IVAR_NMGY: &str = "1/nanomaggies^2";

/// Columns of the targets table, in output order
pub const TARGETS_COLUMNS: &[ColumnSpec] = &[
    spec("RELEASE", I4),
    spec("BRICKID", I4),
    spec("BRICKNAME", S),
    spec("BRICK_OBJID", I4),
    spec("TYPE", S),
    with_unit("RA", F8, "degree"),
    with_unit("DEC", F8, "degree"),
    with_unit("RA_IVAR", F4, "1/degree^2"),
    with_unit("DEC_IVAR", F4, "1/degree^2"),
    spec("DCHISQ", ColumnKind::Float32List(5)),
    with_unit("FLUX_G", F4, NMGY),
    with_unit("FLUX_R", F4, NMGY),
    with_unit("FLUX_Z", F4, NMGY),
    with_unit("FLUX_W1", F4, NMGY),
    with_unit("FLUX_W2", F4, NMGY),
    with_unit("FLUX_IVAR_G", F4, IVAR_NMGY),
    with_unit("FLUX_IVAR_R", F4, IVAR_NMGY),
    with_unit("FLUX_IVAR_Z", F4, IVAR_NMGY),
    with_unit("FLUX_IVAR_W1", F4, IVAR_NMGY),
    with_unit("FLUX_IVAR_W2", F4, IVAR_NMGY),
    spec("MW_TRANSMISSION_G", F4),
    spec("MW_TRANSMISSION_R", F4),
    spec("MW_TRANSMISSION_Z", F4),
    spec("MW_TRANSMISSION_W1", F4),
    spec("MW_TRANSMISSION_W2", F4),
    spec("NOBS_G", I2),
    spec("NOBS_R", I2),
    spec("NOBS_Z", I2),
    spec("FRACFLUX_G", F4),
    spec("FRACFLUX_R", F4),
    spec("FRACFLUX_Z", F4),
    spec("FRACMASKED_G", F4),
    spec("FRACMASKED_R", F4),
    spec("FRACMASKED_Z", F4),
    spec("ALLMASK_G", F4),
    spec("ALLMASK_R", F4),
    spec("ALLMASK_Z", F4),
    with_unit("PSFDEPTH_G", F4, IVAR_NMGY),
    with_unit("PSFDEPTH_R", F4, IVAR_NMGY),
    with_unit("PSFDEPTH_Z", F4, IVAR_NMGY),
    with_unit("GALDEPTH_G", F4, IVAR_NMGY),
    with_unit("GALDEPTH_R", F4, IVAR_NMGY),
    with_unit("GALDEPTH_Z", F4, IVAR_NMGY),
    spec("FRACDEV", F4),
    spec("FRACDEV_IVAR", F4),
    with_unit("SHAPEDEV_R", F4, "arcsec"),
    with_unit("SHAPEDEV_R_IVAR", F4, "1/arcsec^2"),
    spec("SHAPEDEV_E1", F4),
    spec("SHAPEDEV_E1_IVAR", F4),
    spec("SHAPEDEV_E2", F4),
    spec("SHAPEDEV_E2_IVAR", F4),
    with_unit("SHAPEEXP_R", F4, "arcsec"),
    with_unit("SHAPEEXP_R_IVAR", F4, "1/arcsec^2"),
    spec("SHAPEEXP_E1", F4),
    spec("SHAPEEXP_E1_IVAR", F4),
    spec("SHAPEEXP_E2", F4),
    spec("SHAPEEXP_E2_IVAR", F4),
    with_default("REF_ID", I8, -1.0),
    spec("GAIA_PHOT_G_MEAN_MAG", F4),
    spec("GAIA_PHOT_G_MEAN_FLUX_OVER_ERROR", F4),
    spec("GAIA_PHOT_BP_MEAN_MAG", F4),
    spec("GAIA_PHOT_BP_MEAN_FLUX_OVER_ERROR", F4),
    spec("GAIA_PHOT_RP_MEAN_MAG", F4),
    spec("GAIA_PHOT_RP_MEAN_FLUX_OVER_ERROR", F4),
    spec("GAIA_ASTROMETRIC_EXCESS_NOISE", F4),
    spec("GAIA_DUPLICATED_SOURCE", B),
    spec("PARALLAX", F4),
    with_default("PARALLAX_IVAR", F4, 1.0),
    spec("PMRA", F4),
    with_default("PMRA_IVAR", F4, 1.0),
    spec("PMDEC", F4),
    with_default("PMDEC_IVAR", F4, 1.0),
    spec("BRIGHTSTARINBLOB", B),
    spec("EBV", F4),
    spec("PHOTSYS", S),
    spec("TARGETID", I8),
    spec("DESI_TARGET", I8),
    spec("BGS_TARGET", I8),
    spec("MWS_TARGET", I8),
    spec("PRIORITY", I8),
    spec("SUBPRIORITY", F8),
    spec("NUMOBS", I8),
    spec("HPXPIXEL", I8),
];

/// Columns of the truth table, in output order
pub const TRUTH_COLUMNS: &[ColumnSpec] = &[
    spec("TARGETID", I8),
    spec("MOCKID", I8),
    spec("CONTAM_TARGET", I8),
    spec("TRUEZ", F4),
    spec("TRUESPECTYPE", S),
    spec("TEMPLATETYPE", S),
    spec("TEMPLATESUBTYPE", S),
    with_default("TEMPLATEID", I4, -1.0),
    with_default("SEED", I8, -1.0),
    with_unit("MAG", F4, "mag"),
    spec("MAGFILTER", S),
    with_unit("FLUX_G", F4, NMGY),
    with_unit("FLUX_R", F4, NMGY),
    with_unit("FLUX_Z", F4, NMGY),
    with_unit("FLUX_W1", F4, NMGY),
    with_unit("FLUX_W2", F4, NMGY),
];

/// Columns of the spectral metadata table produced by template services
pub const META_COLUMNS: &[ColumnSpec] = &[
    spec("OBJTYPE", S),
    spec("SUBTYPE", S),
    with_default("TEMPLATEID", I4, -1.0),
    with_default("SEED", I8, -1.0),
    spec("REDSHIFT", F4),
    with_unit("MAG", F4, "mag"),
    spec("MAGFILTER", S),
    with_unit("FLUX_G", F4, NMGY),
    with_unit("FLUX_R", F4, NMGY),
    with_unit("FLUX_Z", F4, NMGY),
    with_unit("FLUX_W1", F4, NMGY),
    with_unit("FLUX_W2", F4, NMGY),
];

const GALAXY_LINES: &[ColumnSpec] = &[
    with_unit("OIIFLUX", F4, "erg/(s*cm2)"),
    with_unit("HBETAFLUX", F4, "erg/(s*cm2)"),
    with_unit("EWOII", F4, "Angstrom"),
    with_unit("EWHBETA", F4, "Angstrom"),
    spec("D4000", F4),
    with_unit("VDISP", F4, "km/s"),
    spec("OIIDOUBLET", F4),
    spec("OIIIHBETA", F4),
    spec("OIIHBETA", F4),
    spec("NIIHBETA", F4),
    spec("SIIHBETA", F4),
];

const LRG_COLUMNS: &[ColumnSpec] = &[spec("D4000", F4), with_unit("VDISP", F4, "km/s")];

const QSO_COLUMNS: &[ColumnSpec] = &[with_default("BAL_TEMPLATEID", I4, -1.0)];

const STAR_COLUMNS: &[ColumnSpec] = &[
    with_unit("TEFF", F4, "K"),
    with_unit("LOGG", F4, "m/(s**2)"),
    spec("FEH", F4),
];

const WD_COLUMNS: &[ColumnSpec] = &[with_unit("TEFF", F4, "K"), with_unit("LOGG", F4, "m/(s**2)")];

const TRUEZ_NORSD_COLUMN: ColumnSpec = spec("TRUEZ_NORSD", F4);

/// Object-specific truth columns for a template family
///
/// Extragalactic families also carry `TRUEZ_NORSD`; families without extra
/// truth (SKY) have none.
pub fn objtruth_columns(templatetype: &str) -> Vec<ColumnSpec> {
    let (base, norsd): (&[ColumnSpec], bool) = match templatetype {
        "ELG" | "BGS" => (GALAXY_LINES, true),
        "LRG" => (LRG_COLUMNS, true),
        "QSO" => (QSO_COLUMNS, true),
        "STAR" => (STAR_COLUMNS, false),
        "WD" => (WD_COLUMNS, false),
        _ => (&[], false),
    };
    let mut columns = base.to_vec();
    if norsd {
        columns.push(TRUEZ_NORSD_COLUMN);
    }
    columns
}
