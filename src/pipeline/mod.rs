//! # Survey Pipeline
//!
//! Drives the makers over the survey footprint one HEALPix cell at a time and
//! aggregates their targets, truth and spectra.
//!
//! | Component | Role |
//! |---|---|
//! | [`SourceSpec`] | One class: catalog request plus maker settings |
//! | [`Pipeline`] | Per-cell read, synthesize, select and identifier assignment |
//! | [`PipelineOutput`] | Row-aligned targets, truth, object truth and spectra |
//! | [`PipelineStats`] | Row, cell and contaminant counts of a run |
//!
//! ## Design Principles
//!
//! 1. **Independent Partitions**: Each cell is read and processed on its own;
//!    cells share only read-only services, so they can run in parallel with the
//!    `parallel` feature.
//!
//! 2. **Seeded Up Front**: Per-cell seeds are drawn from the run seed in cell
//!    order before any work starts, so results do not depend on scheduling.
//!
//! 3. **Empty Is Not an Error**: Cells where a catalog has no objects, or
//!    where no object passes selection, contribute nothing.
//!
//! 4. **Fail Fast**: An error in any cell aborts the whole run.

mod driver;
mod output;
mod source;
mod stats;


pub use driver::{Pipeline, PipelineOptions, DEFAULT_NSIDE};
pub use output::{PipelineOutput, PixelOutput};
pub use source::SourceSpec;
pub use stats::PipelineStats;
