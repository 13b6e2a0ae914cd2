//! TOML run configuration.
//!
//! A run is described by one file naming the survey services, the output
//! settings and one `[sources.CLASS]` table per target class:
//!
//! ```toml
//! # mocktarget.toml
//! [survey]
//! nside = 16
//! seed = 42
//!
//! [services]
//! gmm_dir = "{DESI_ROOT}/gmm"
//! templates_dir = "templates"
//!
//! [sources.QSO]
//! mockfile = "{DESI_ROOT}/mocks/QSO.parquet"
//! format = "gaussianfield"
//! zmax_qso = 2.1
//! ```

use anyhow::{bail, Context, Result};
use mocktarget::cuts::QsoSelection;
use mocktarget::makers::{MakerClass, MakerSettings};
use mocktarget::mock::{resolve_path, MockFormat};
use mocktarget::pipeline::{PipelineOptions, SourceSpec, DEFAULT_NSIDE};
use mocktarget::writer::{CompressionType, WriterConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::Profile;

/// Root configuration structure for mocktarget.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Footprint, seed and run switches.
    #[serde(default)]
    pub survey: SurveyConfig,

    /// Locations of models, maps and templates.
    #[serde(default)]
    pub services: ServicesConfig,

    /// Parquet output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// One entry per target class, keyed by class name.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

/// Run-wide settings.
#[derive(Debug, Default, Deserialize)]
pub struct SurveyConfig {
    /// Resolution of the processing cells.
    pub nside: Option<u32>,

    /// Cells to process; the full footprint when omitted.
    pub healpixels: Option<Vec<i64>>,

    /// Run seed.
    pub seed: Option<u64>,

    /// Skip spectrum synthesis.
    pub no_spectra: Option<bool>,

    /// Flag stars passing extragalactic cuts as contaminants.
    pub add_contaminants: Option<bool>,

    /// Resolution of the velocity-dispersion cells.
    pub nside_chunk: Option<u32>,
}

/// Survey services. Paths may contain `{VAR}` environment placeholders.
#[derive(Debug, Default, Deserialize)]
pub struct ServicesConfig {
    /// Directory of the empirical GMM and morphology models.
    pub gmm_dir: Option<String>,

    /// Completeness weight map; uniform weights when omitted.
    pub pixweight: Option<String>,

    /// E(B-V) map; see `ebv` when omitted.
    pub dust_map: Option<String>,

    /// Constant E(B-V) used without a dust map.
    pub ebv: Option<f64>,

    /// Directory of the template basis libraries.
    pub templates_dir: Option<String>,

    /// Directory of the QSO random-forest models.
    pub qso_forest_dir: Option<String>,
}

/// Output file settings.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Compression codec (zstd, snappy or none).
    pub compression: Option<String>,

    /// ZSTD compression level (1-22).
    pub compression_level: Option<i32>,

    /// Number of rows per Parquet row group.
    pub row_group_size: Option<usize>,
}

/// Catalog and maker options of one target class.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Catalog path or directory.
    pub mockfile: String,

    /// Catalog format; the class default when omitted.
    pub format: Option<String>,

    /// Faint r-magnitude limit.
    pub magcut: Option<f64>,

    /// Upper redshift of tracer quasars.
    pub zmax_qso: Option<f64>,

    /// Lower redshift of Lyman-alpha quasars.
    pub zmin_lya: Option<f64>,

    /// Resolution of the Lyman-alpha skewer files.
    pub nside_lya: Option<u32>,

    /// Resolution of the Galaxia file tree.
    pub nside_galaxia: Option<u32>,

    /// Select standards only.
    pub calib_only: Option<bool>,

    /// Probability of a broad absorption line.
    pub balprob: Option<f64>,

    /// Normalise quasars like the simulated-QSO generator.
    pub use_simqso: Option<bool>,

    /// QSO selection method (colorcuts or randomforest).
    pub qso_selection: Option<QsoSelection>,

    /// Record the catalog's median density.
    pub mock_density: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Run options, with every omitted setting at its default.
    pub fn pipeline_options(&self) -> PipelineOptions {
        let defaults = PipelineOptions::default();
        PipelineOptions {
            nside: self.survey.nside.unwrap_or(DEFAULT_NSIDE),
            healpixels: self.survey.healpixels.clone(),
            seed: self.survey.seed.unwrap_or(defaults.seed),
            no_spectra: self.survey.no_spectra.unwrap_or(defaults.no_spectra),
        }
    }

    /// One source per configured class, in the canonical class order.
    pub fn source_specs(&self) -> Result<Vec<SourceSpec>> {
        if self.sources.is_empty() {
            bail!("No [sources.*] tables in the configuration");
        }
        let mut specs = Vec::with_capacity(self.sources.len());
        for (name, source) in &self.sources {
            let class: MakerClass = name.parse()?;
            specs.push(source.to_spec(class).with_context(|| format!("In [sources.{}]", name))?);
        }
        specs.sort_by_key(|spec| MakerClass::ALL.iter().position(|c| *c == spec.class));
        Ok(specs)
    }

    /// Writer settings: the profile's preset with any overrides applied.
    pub fn writer_config(&self, profile: Profile) -> Result<WriterConfig> {
        let mut config = profile.writer_config();
        if let Some(name) = &self.output.compression {
            let level = self.output.compression_level.unwrap_or(profile.compression_level());
            config.compression = CompressionType::from_name(name, level).map_err(anyhow::Error::msg)?;
        } else if let Some(level) = self.output.compression_level {
            config.compression = CompressionType::Zstd(level);
        }
        if let Some(rows) = self.output.row_group_size {
            config.row_group_size = rows;
        }
        Ok(config)
    }

    /// A service path with its placeholders filled in.
    pub fn service_path(template: Option<&str>) -> Result<Option<PathBuf>> {
        template
            .map(|t| resolve_path(t).with_context(|| format!("Cannot resolve {}", t)))
            .transpose()
    }
}

impl SourceConfig {
    /// Source for `class` built from these options.
    pub fn to_spec(&self, class: MakerClass) -> Result<SourceSpec> {
        let format = self
            .format
            .as_deref()
            .map(str::parse::<MockFormat>)
            .transpose()?;

        let defaults = MakerSettings::default();
        let settings = MakerSettings {
            format,
            use_simqso: self.use_simqso.unwrap_or(defaults.use_simqso),
            balprob: self.balprob.unwrap_or(defaults.balprob),
            calib_only: self.calib_only.unwrap_or(defaults.calib_only),
            qso_selection: self.qso_selection,
        };
        if !(0.0..=1.0).contains(&settings.balprob) {
            bail!("balprob {} is not a probability", settings.balprob);
        }

        let mut spec = SourceSpec::new(class, self.mockfile.clone()).with_settings(settings);
        spec.request.magcut = self.magcut;
        spec.request.zmax_qso = self.zmax_qso;
        spec.request.zmin_lya = self.zmin_lya;
        spec.request.nside_lya = self.nside_lya;
        spec.request.nside_galaxia = self.nside_galaxia;
        spec.request.mock_density = self.mock_density.unwrap_or(false);
        Ok(spec)
    }
}
