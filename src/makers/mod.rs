//! # Target Class Makers
//!
//! One maker per astrophysical object class. A maker reads its mock catalog,
//! draws spectra (or photometry alone), fills the targets and truth tables and
//! sets the target bits of the rows it produced.
//!
//! ## Components
//!
//! | Class | Maker | Formats | Template family |
//! |-------|-------|---------|-----------------|
//! | QSO | [`QsoMaker`] | `gaussianfield` | QSO |
//! | LYA | [`LyaMaker`] | `CoLoRe` | QSO with forest absorption |
//! | LRG | [`LrgMaker`] | `gaussianfield` | LRG |
//! | ELG | [`ElgMaker`] | `gaussianfield` | ELG |
//! | BGS | [`BgsMaker`] | `durham_mxxl_hdf5`, `bgs-gama`, `gaussianfield` | BGS |
//! | MWS_MAIN | [`MwsMainMaker`] | `galaxia` | STAR |
//! | FAINTSTAR | [`FaintStarMaker`] | `galaxia` | STAR |
//! | MWS_NEARBY | [`MwsNearbyMaker`] | `mws_100pc` | STAR |
//! | WD | [`WdMaker`] | `mws_wd` | WD (DA, DB) |
//! | SKY | [`SkyMaker`] | `uniformsky`, `gaussianfield` | none |
//!
//! ## Design Principles
//!
//! 1. **Composition over inheritance**: Stellar classes share a
//!    [`StellarPhotometryService`] instead of a common base class.
//!
//! 2. **Row order is preserved**: North and south rows are generated
//!    separately and written back to their original positions.
//!
//! 3. **Explicit seeds**: Every stochastic step draws from a generator seeded
//!    by the `seed` handed to [`TargetMaker::make_spectra`].
//!
//! 4. **Lazy resources**: Template libraries and KD-trees are loaded on first
//!    use and owned by the maker instance.

mod common;
mod galaxies;
mod qso;
mod sky;
mod stars;
mod stellar;
mod wd;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ndarray::Array2;

pub use galaxies::{BgsMaker, ElgMaker, LrgMaker};
pub use qso::{LyaMaker, QsoMaker};
pub use sky::SkyMaker;
pub use stars::{FaintStarMaker, MwsMainMaker, MwsNearbyMaker};
pub use stellar::StellarPhotometryService;
pub use wd::{WdMaker, WdTemplates};

use crate::cuts::{QsoForests, QsoSelection};
use crate::mock::{reader_for, MockError, MockFormat, MockReader, ReadRequest, SourceRecords, SurveyContext};
use crate::table::Table;
use crate::templates::TemplateRegistry;
use crate::wave::wavelength_grid;

/// Default HEALPix resolution of the velocity-dispersion cells
pub const DEFAULT_NSIDE_CHUNK: u32 = 128;

/// Object classes with a maker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MakerClass {
    /// Tracer quasars
    Qso,
    /// Lyman-alpha forest quasars
    Lya,
    /// Luminous red galaxies
    Lrg,
    /// Emission line galaxies
    Elg,
    /// Bright galaxy survey
    Bgs,
    /// Milky Way survey main sample and standards
    MwsMain,
    /// Faint stars, kept only as contaminants
    FaintStar,
    /// Stars within 100 pc
    MwsNearby,
    /// White dwarfs
    Wd,
    /// Blank sky fibers
    Sky,
}

impl MakerClass {
    /// Every class, in processing order
    pub const ALL: [MakerClass; 10] = [
        MakerClass::Qso,
        MakerClass::Lya,
        MakerClass::Lrg,
        MakerClass::Elg,
        MakerClass::Bgs,
        MakerClass::MwsMain,
        MakerClass::FaintStar,
        MakerClass::MwsNearby,
        MakerClass::Wd,
        MakerClass::Sky,
    ];

    /// Upper-case class tag
    pub fn name(&self) -> &'static str {
        match self {
            MakerClass::Qso => "QSO",
            MakerClass::Lya => "LYA",
            MakerClass::Lrg => "LRG",
            MakerClass::Elg => "ELG",
            MakerClass::Bgs => "BGS",
            MakerClass::MwsMain => "MWS_MAIN",
            MakerClass::FaintStar => "FAINTSTAR",
            MakerClass::MwsNearby => "MWS_NEARBY",
            MakerClass::Wd => "WD",
            MakerClass::Sky => "SKY",
        }
    }

    /// Format read when none is configured
    pub fn default_format(&self) -> MockFormat {
        match self {
            MakerClass::Qso | MakerClass::Lrg | MakerClass::Elg => MockFormat::GaussianField,
            MakerClass::Lya => MockFormat::CoLoRe,
            MakerClass::Bgs => MockFormat::Mxxl,
            MakerClass::MwsMain | MakerClass::FaintStar => MockFormat::Galaxia,
            MakerClass::MwsNearby => MockFormat::Mws100pc,
            MakerClass::Wd => MockFormat::MwsWd,
            MakerClass::Sky => MockFormat::UniformSky,
        }
    }

    /// Formats the class can be built from
    pub fn formats(&self) -> &'static [MockFormat] {
        match self {
            MakerClass::Qso | MakerClass::Lrg | MakerClass::Elg => &[MockFormat::GaussianField],
            MakerClass::Lya => &[MockFormat::CoLoRe],
            MakerClass::Bgs => &[MockFormat::Mxxl, MockFormat::Gama, MockFormat::GaussianField],
            MakerClass::MwsMain | MakerClass::FaintStar => &[MockFormat::Galaxia],
            MakerClass::MwsNearby => &[MockFormat::Mws100pc],
            MakerClass::Wd => &[MockFormat::MwsWd],
            MakerClass::Sky => &[MockFormat::UniformSky, MockFormat::GaussianField],
        }
    }

    /// Stellar classes whose rows can contaminate extragalactic samples
    pub fn is_stellar(&self) -> bool {
        matches!(self, MakerClass::MwsMain | MakerClass::FaintStar)
    }
}

impl fmt::Display for MakerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MakerClass {
    type Err = MockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        MakerClass::ALL
            .into_iter()
            .find(|class| class.name() == upper)
            .ok_or_else(|| MockError::Configuration(format!("unrecognized target class {}", s)))
    }
}

/// Shared services handed to every maker
#[derive(Clone)]
pub struct MakerContext {
    /// Weights, footprint, dust and empirical models
    pub survey: Arc<SurveyContext>,
    /// Template libraries and filter curves
    pub templates: TemplateRegistry,
    /// QSO random forests
    pub forests: Arc<QsoForests>,
    /// Output wavelength grid
    pub wave: Arc<Vec<f64>>,
    /// HEALPix resolution of the velocity-dispersion cells
    pub nside_chunk: u32,
    /// Flag stars that pass extragalactic cuts as contaminants
    pub add_contaminants: bool,
}

impl MakerContext {
    /// Context on the default wavelength grid, without forests or contaminants
    pub fn new(survey: Arc<SurveyContext>, templates: TemplateRegistry) -> Self {
        Self {
            survey,
            templates,
            forests: Arc::new(QsoForests::default()),
            wave: Arc::new(wavelength_grid()),
            nside_chunk: DEFAULT_NSIDE_CHUNK,
            add_contaminants: false,
        }
    }

    /// Use these QSO random forests
    pub fn with_forests(mut self, forests: Arc<QsoForests>) -> Self {
        self.forests = forests;
        self
    }

    /// Replace the output wavelength grid
    pub fn with_wave(mut self, wave: Vec<f64>) -> Self {
        self.wave = Arc::new(wave);
        self
    }

    /// Enable or disable stellar contaminants
    pub fn with_contaminants(mut self, add_contaminants: bool) -> Self {
        self.add_contaminants = add_contaminants;
        self
    }

    /// Resolution of the velocity-dispersion cells
    pub fn with_nside_chunk(mut self, nside_chunk: u32) -> Self {
        self.nside_chunk = nside_chunk;
        self
    }
}

impl fmt::Debug for MakerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MakerContext")
            .field("templates", &self.templates)
            .field("npix", &self.wave.len())
            .field("nside_chunk", &self.nside_chunk)
            .field("add_contaminants", &self.add_contaminants)
            .finish_non_exhaustive()
    }
}

/// Per-class options of a maker
#[derive(Debug, Clone, PartialEq)]
pub struct MakerSettings {
    /// Catalog format; the class default when `None`
    pub format: Option<MockFormat>,
    /// Normalise quasars like the simulated-QSO generator and select them
    /// with the random forest
    pub use_simqso: bool,
    /// Probability of inserting a broad absorption line (LYA)
    pub balprob: f64,
    /// Select standards only (MWS_MAIN, WD)
    pub calib_only: bool,
    /// QSO selection overriding the `use_simqso` default
    pub qso_selection: Option<QsoSelection>,
}

impl Default for MakerSettings {
    fn default() -> Self {
        Self {
            format: None,
            use_simqso: true,
            balprob: 0.0,
            calib_only: false,
            qso_selection: None,
        }
    }
}

/// Spectra plus the targets and truth tables of one `make_spectra` call
#[derive(Debug, Clone)]
pub struct MakerOutput {
    /// Flux density, `nobj x wave.len()`; no rows when spectra were skipped
    pub flux: Array2<f32>,
    /// Output wavelengths in Angstrom
    pub wave: Arc<Vec<f64>>,
    /// Observed catalog rows
    pub targets: Table,
    /// Ground truth, row-aligned with `targets`
    pub truth: Table,
    /// Family-specific truth; no columns for families without extras
    pub objtruth: Table,
}

impl MakerOutput {
    /// Output with no rows
    pub fn empty(wave: Arc<Vec<f64>>) -> Self {
        Self {
            flux: Array2::zeros((0, wave.len())),
            wave,
            targets: Table::new(),
            truth: Table::new(),
            objtruth: Table::new(),
        }
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if no objects were produced
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// True if a spectrum was generated for every row
    pub fn has_spectra(&self) -> bool {
        self.flux.nrows() == self.targets.len() && !self.targets.is_empty()
    }
}

/// Reader plus shared services common to every maker
pub struct MakerBase {
    class: MakerClass,
    format: MockFormat,
    reader: Box<dyn MockReader>,
    ctx: MakerContext,
}

impl MakerBase {
    /// Base for `class`, checking that `format` can feed it
    pub fn new(class: MakerClass, format: Option<MockFormat>, ctx: MakerContext) -> Result<Self, MockError> {
        let format = format.unwrap_or_else(|| class.default_format());
        if !class.formats().contains(&format) {
            log::warn!("Unrecognized mockformat {} for {}!", format, class);
            return Err(MockError::UnsupportedFormat(format!("{} for {}", format, class)));
        }
        Ok(Self {
            class,
            format,
            reader: reader_for(format),
            ctx,
        })
    }

    /// Class of this maker
    pub fn class(&self) -> MakerClass {
        self.class
    }

    /// Catalog format read
    pub fn format(&self) -> MockFormat {
        self.format
    }

    /// Shared services
    pub fn ctx(&self) -> &MakerContext {
        &self.ctx
    }
}

impl fmt::Debug for MakerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MakerBase")
            .field("class", &self.class)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Read, synthesize and select one object class
pub trait TargetMaker: Send + Sync {
    /// Reader and services of this maker
    fn base(&self) -> &MakerBase;

    /// Class of this maker
    fn class(&self) -> MakerClass {
        self.base().class
    }

    /// Read the catalog rows selected by `request`
    ///
    /// The request's target name is replaced by the maker's class. Returns
    /// `Ok(None)` when nothing falls inside the footprint.
    fn read(&self, request: &ReadRequest) -> Result<Option<SourceRecords>, MockError> {
        let base = self.base();
        let mut request = request.clone();
        request.target_name = base.class.name().to_string();
        base.reader.read(&base.ctx.survey, &request)
    }

    /// Spectra, targets and truth for the rows `indices` of `data`
    /// (every row when `None`)
    ///
    /// With `no_spectra` only noiseless photometry is drawn and `flux` has
    /// no rows.
    fn make_spectra(
        &self,
        data: &SourceRecords,
        indices: Option<&[usize]>,
        seed: u64,
        no_spectra: bool,
    ) -> Result<MakerOutput, MockError>;

    /// Set target bits (and contamination bits) in place
    fn select_targets(&self, targets: &mut Table, truth: &mut Table) -> Result<(), MockError>;
}

/// Build the maker for `class`
pub fn make_maker(
    class: MakerClass,
    ctx: MakerContext,
    settings: &MakerSettings,
) -> Result<Box<dyn TargetMaker>, MockError> {
    let base = MakerBase::new(class, settings.format, ctx)?;
    let maker: Box<dyn TargetMaker> = match class {
        MakerClass::Qso => Box::new(QsoMaker::new(base, settings)),
        MakerClass::Lya => Box::new(LyaMaker::new(base, settings)),
        MakerClass::Lrg => Box::new(LrgMaker::new(base)),
        MakerClass::Elg => Box::new(ElgMaker::new(base)),
        MakerClass::Bgs => Box::new(BgsMaker::new(base)),
        MakerClass::MwsMain => Box::new(MwsMainMaker::new(base, settings.calib_only)),
        MakerClass::FaintStar => Box::new(FaintStarMaker::new(base)),
        MakerClass::MwsNearby => Box::new(MwsNearbyMaker::new(base)),
        MakerClass::Wd => Box::new(WdMaker::new(base, settings.calib_only)),
        MakerClass::Sky => Box::new(SkyMaker::new(base)),
    };
    Ok(maker)
}
