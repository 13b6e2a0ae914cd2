//! # Empirical Samplers
//!
//! Statistical models used to give mock objects realistic photometry,
//! morphology and spectral-template identities.
//!
//! ## Components
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`GaussianMixture`] | Full-covariance GMM with seeded sampling |
//! | [`MorphologyModel`] | Magnitude-binned morphology fractions + per-type GMMs |
//! | [`PhotometryModel`] | Photometry-only GMM for runs without spectra |
//! | [`VdispModel`] | Spatially correlated log-normal velocity dispersions |
//! | [`TemplateMatcher`] | Nearest-template lookup over KD-trees |
//! | [`ModelRegistry`] | Lazy, shared, per-class model cache |
//!
//! ## Design Principles
//!
//! 1. **Seeded draws**: Every sampler takes a seed or an RNG handle; no
//!    process-wide random state.
//!
//! 2. **Load once, share read-only**: Models live behind `Arc` in the
//!    registry and are never mutated after construction.

mod gmm;
pub mod kdtree;
mod matcher;
mod morphology;
mod nospectra;
mod registry;
mod vdisp;


pub use gmm::{cholesky, GaussianMixture};
pub use kdtree::KdTree;
pub use matcher::TemplateMatcher;
pub use morphology::{
    allocate_counts, choose_without_replacement, match_prior_magnitudes, MorphologyModel,
    MORPHOLOGIES, MORPHOLOGY_COLUMNS, PRIOR_MAG_TOLERANCE,
};
pub use nospectra::{photometry_tags, PhotometryModel};
pub use registry::{GmmTarget, ModelRegistry};
pub use vdisp::VdispModel;
