//! # Selection Cuts
//!
//! Stateless target-selection functions over extinction-corrected fluxes,
//! imaging quality and Gaia astrometry, combined by [`apply_cuts`] into the
//! `DESI_TARGET`, `BGS_TARGET` and `MWS_TARGET` bitmasks.
//!
//! ## Components
//!
//! | Module | Classes |
//! |--------|---------|
//! | `lrg` | LRG, one- and two-pass LRGs |
//! | `elg` | ELG, north and south variants |
//! | `qso` | QSO colour cuts and random forest |
//! | `stars` | STD, MWS main/nearby/WD |
//! | `bgs` | BGS bright and faint |
//! | `apply` | [`apply_cuts`], [`CutOptions`], [`TargetBits`] |
//!
//! ## Design Principles
//!
//! 1. **Per-object predicates**: Each cut is a pure function of one object's
//!    inputs; [`CutInputs`] derives those inputs from a targets table once.
//!
//! 2. **Complex powers**: Fractional powers of possibly negative fluxes take
//!    the real part of the principal complex power ([`complex_pow_real`]).
//!
//! 3. **Explicit systems**: North and south variants are separate functions;
//!    combined bits pick the variant matching `PHOTSYS`.

mod apply;
mod bgs;
mod elg;
mod error;
mod forest;
mod inputs;
mod lrg;
mod photo;
mod power;
mod qso;
mod stars;

#[cfg(test)]
mod tests;

pub use apply::{apply_cuts, CutOptions, QsoSelection, TargetBits, TargetClass};
pub use bgs::{is_bgs_bright, is_bgs_faint};
pub use elg::{is_elg, is_elg_north, is_elg_south, AllMask};
pub use error::CutsError;
pub use forest::{DecisionTree, QsoForests, RandomForest, DR3_FOREST, DR5_FOREST, DR5_HIGHZ_FOREST};
pub use inputs::{psflike, CutInputs, Fluxes};
pub use lrg::{is_lrg, is_lrg_colors, is_lrg_pass, LrgQuality};
pub use photo::{shift_photo_north, shift_photo_north_pure};
pub use power::complex_pow_real;
pub use qso::{
    dr3_threshold, dr5_highz_threshold, dr5_threshold, forest_features, is_qso_colors, is_qso_cuts,
    is_qso_randomforest, QsoQuality, NFEATURES,
};
pub use stars::{
    is_mws_main, is_mws_nearby, is_mws_wd, is_mwsstar_colors, is_std, is_std_colors, is_std_gaia,
    BandQuality, GaiaRow,
};
