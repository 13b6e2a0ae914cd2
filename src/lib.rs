//! # mocktarget - Mock Targets, Truth and Spectra
//!
//! `mocktarget` turns simulated galaxy, quasar and Milky Way catalogs into
//! the products a spectroscopic survey would see: an observed target catalog
//! with noisy photometry and target-selection bits, a row-aligned truth
//! table, per-class object truth, and noiseless model spectra.
//!
//! ## Key Features
//!
//! - **Many Mock Formats**: Gaussian random fields, uniform skies, Galaxia,
//!   CoLoRe Lyman-alpha skewers, MXXL and GAMA lightcones, white dwarf and
//!   nearby-star catalogs, all read from Parquet.
//!
//! - **Survey Realism**: Completeness weights, Galactic extinction, imaging
//!   depths and the north/south photometric split are applied per object.
//!
//! - **Template Spectra**: Objects are matched to template basis libraries by
//!   nearest neighbour and normalised to their mock magnitudes.
//!
//! - **Target Selection**: LRG, ELG, QSO (colour cuts or random forest), BGS
//!   and stellar cuts set the survey bitmasks.
//!
//! - **Reproducible Runs**: Every stochastic step takes an explicit seed, and
//!   the pipeline draws every cell's seed up front.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use mocktarget::makers::{MakerClass, MakerContext};
//! use mocktarget::mock::SurveyContext;
//! use mocktarget::pipeline::{Pipeline, PipelineOptions, SourceSpec};
//! use mocktarget::templates::TemplateRegistry;
//! use mocktarget::writer::{write_output, RunMetadata, WriterConfig};
//!
//! let survey = Arc::new(SurveyContext::uniform("gmm"));
//! let ctx = MakerContext::new(survey, TemplateRegistry::new("templates")?);
//! let sources = vec![SourceSpec::new(MakerClass::Sky, "mocks/sky.parquet")];
//! let options = PipelineOptions {
//!     healpixels: Some(vec![2000]),
//!     ..PipelineOptions::default()
//! };
//!
//! let output = Pipeline::new(ctx, sources, options)?.run()?;
//! write_output(Path::new("out"), &output, &RunMetadata::new(1), &WriterConfig::default())?;
//! println!("{}", output.stats);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! This writes:
//! ```text
//! out/
//! ├── targets.parquet     # Observed catalog and target bits
//! ├── truth.parquet       # Ground truth, row-aligned with targets
//! ├── objtruth-*.parquet  # Class-specific truth, joined on TARGETID
//! └── spectra.parquet     # TARGETID + FLUX, wavelength in the footer
//! ```
//!
//! ## Modules
//!
//! - [`table`]: Owned columnar tables and their Arrow conversions
//! - [`sky`]: HEALPix, bricks, coordinates, weight and dust maps
//! - [`mock`]: Mock catalog readers and target ids
//! - [`photometry`]: Magnitudes, filters, extinction, depths and noise
//! - [`sampling`]: Gaussian mixtures, morphology, KD-trees and velocity dispersions
//! - [`templates`]: Template basis libraries and Lyman-alpha transmission
//! - [`schema`]: Targets, truth and object-truth column layouts
//! - [`masks`]: Survey bitmask definitions
//! - [`cuts`]: Target-selection cuts
//! - [`makers`]: One maker per object class
//! - [`pipeline`]: Cell-by-cell survey driver
//! - [`writer`]: Parquet output

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
// Allow some patterns common in scientific code
#![allow(clippy::too_many_arguments)]

pub mod cuts;
pub mod makers;
pub mod masks;
pub mod mock;
pub mod photometry;
pub mod pipeline;
pub mod populate;
pub mod sampling;
pub mod schema;
pub mod sky;
pub mod table;
pub mod templates;
pub mod wave;
pub mod writer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::cuts::{apply_cuts, CutOptions, CutsError, QsoForests, QsoSelection, TargetClass};
    pub use crate::makers::{make_maker, MakerClass, MakerContext, MakerOutput, MakerSettings, TargetMaker};
    pub use crate::masks::{bgs_mask, contam_mask, desi_mask, mws_mask};
    pub use crate::mock::{
        decode_targetid, encode_targetid, MockError, MockFormat, ReadRequest, SourceRecords,
        SurveyContext,
    };
    pub use crate::pipeline::{Pipeline, PipelineOptions, PipelineOutput, PipelineStats, SourceSpec};
    pub use crate::schema::{columns, validate_targets, validate_truth};
    pub use crate::table::{Column, Table, TableError};
    pub use crate::templates::TemplateRegistry;
    pub use crate::writer::{
        write_output, CatalogWriter, CompressionType, OutputStats, RunMetadata, WriterConfig,
        WriterError, WriterStats,
    };
}
