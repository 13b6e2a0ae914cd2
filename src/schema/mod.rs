//! # Targets and Truth Schema
//!
//! Fixed column layouts of the tables every maker produces.
//!
//! ## Tables
//!
//! | Table | Rows | Notable defaults |
//! |-------|------|------------------|
//! | targets | one per object | REF_ID = -1, PARALLAX_IVAR = PMRA_IVAR = PMDEC_IVAR = 1, DCHISQ is 5-wide |
//! | truth | one per target, same order | TEMPLATEID = -1, SEED = -1 |
//! | objtruth | zero or one per target | family specific (see below) |
//! | meta | one per template draw | REDSHIFT is copied to truth TRUEZ |
//!
//! ## Object truth families
//!
//! | Template type | Columns |
//! |---------------|---------|
//! | ELG, BGS | emission-line fluxes and ratios, D4000, VDISP, TRUEZ_NORSD |
//! | LRG | D4000, VDISP, TRUEZ_NORSD |
//! | QSO | BAL_TEMPLATEID, TRUEZ_NORSD |
//! | STAR | TEFF, LOGG, FEH |
//! | WD | TEFF, LOGG |
//! | SKY | none |
//!
//! Flux columns are in nanomaggies (AB 22.5 zero point); inverse variances in
//! 1/nanomaggies^2. Units are attached to Arrow fields as `unit` metadata.

mod builders;
/// Column name constants.
pub mod columns;
mod specs;
mod validation;

#[cfg(test)]
mod tests;

pub use builders::{
    create_objtruth_schema, create_targets_schema, create_truth_schema, empty_meta_table,
    empty_objmeta_table, empty_targets_table, empty_truth_table, unit_of,
};
pub use columns::*;
pub use specs::{objtruth_columns, ColumnSpec, META_COLUMNS, TARGETS_COLUMNS, TRUTH_COLUMNS};
pub use validation::{validate_targets, validate_truth, SchemaValidationError};
