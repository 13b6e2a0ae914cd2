use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mocktarget::cuts::QsoForests;
use mocktarget::makers::MakerContext;
use mocktarget::mock::SurveyContext;
use mocktarget::pipeline::Pipeline;
use mocktarget::sampling::ModelRegistry;
use mocktarget::sky::{
    ConstantDust, DustMap, Footprint, HealpixDustMap, HealpixWeightMap, PixelWeights, UniformWeights,
};
use mocktarget::templates::TemplateRegistry;
use mocktarget::writer::{write_output, RunMetadata};

use super::config::Config;
use super::Profile;

const DEFAULT_GMM_DIR: &str = "gmm";
const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Command-line overrides of a run configuration
#[derive(Debug, Default)]
pub struct RunOverrides {
    /// Replaces `[survey] seed`
    pub seed: Option<u64>,
    /// Replaces `[survey] healpixels`
    pub healpixels: Option<Vec<i64>>,
    /// Skip spectra even if the configuration asks for them
    pub no_spectra: bool,
}

/// Survey services named in the configuration
pub fn survey_context(config: &Config) -> Result<SurveyContext> {
    let services = &config.services;
    let gmm_dir = Config::service_path(services.gmm_dir.as_deref())?
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GMM_DIR));

    let (weights, footprint): (Arc<dyn PixelWeights>, Arc<dyn Footprint>) =
        match Config::service_path(services.pixweight.as_deref())? {
            Some(path) => {
                let map = Arc::new(
                    HealpixWeightMap::from_parquet(&path)
                        .with_context(|| format!("Failed to load weights {}", path.display()))?,
                );
                info!("Completeness weights: {}", path.display());
                let weights: Arc<dyn PixelWeights> = map.clone();
                let footprint: Arc<dyn Footprint> = map;
                (weights, footprint)
            }
            None => {
                warn!("No pixweight map configured; using the full sky with unit weights");
                let weights: Arc<dyn PixelWeights> = Arc::new(UniformWeights);
                let footprint: Arc<dyn Footprint> = Arc::new(UniformWeights);
                (weights, footprint)
            }
        };

    let dust: Arc<dyn DustMap> = match Config::service_path(services.dust_map.as_deref())? {
        Some(path) => Arc::new(
            HealpixDustMap::from_parquet(&path)
                .with_context(|| format!("Failed to load dust map {}", path.display()))?,
        ),
        None => Arc::new(ConstantDust(services.ebv.unwrap_or(0.0))),
    };

    Ok(SurveyContext::new(weights, footprint, dust, ModelRegistry::new(gmm_dir)))
}

/// Maker services: survey context, templates and forests
pub fn maker_context(config: &Config) -> Result<MakerContext> {
    let survey = survey_context(config)?;
    let templates_dir = Config::service_path(config.services.templates_dir.as_deref())?
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATES_DIR));
    let templates = TemplateRegistry::new(&templates_dir)
        .with_context(|| format!("Failed to open templates in {}", templates_dir.display()))?;

    let mut ctx = MakerContext::new(Arc::new(survey), templates)
        .with_contaminants(config.survey.add_contaminants.unwrap_or(false));
    if let Some(nside_chunk) = config.survey.nside_chunk {
        ctx = ctx.with_nside_chunk(nside_chunk);
    }
    if let Some(dir) = Config::service_path(config.services.qso_forest_dir.as_deref())? {
        let forests = QsoForests::from_dir(&dir)
            .with_context(|| format!("Failed to load random forests from {}", dir.display()))?;
        ctx = ctx.with_forests(Arc::new(forests));
    }
    Ok(ctx)
}

/// Run the full pipeline described by a configuration file
pub fn run(config_path: &Path, output: &Path, profile: Profile, overrides: RunOverrides) -> Result<()> {
    let text = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config = Config::from_str(&text)?;

    let mut options = config.pipeline_options();
    if let Some(seed) = overrides.seed {
        options.seed = seed;
    }
    if overrides.healpixels.is_some() {
        options.healpixels = overrides.healpixels;
    }
    options.no_spectra |= overrides.no_spectra;
    let writer_config = config.writer_config(profile)?;

    info!("mocktarget - mock targets and truth");
    info!("===================================");
    info!("Config: {}", config_path.display());
    info!("Output: {}", output.display());
    info!("Profile: {}", profile);
    info!("nside: {}, seed: {}", options.nside, options.seed);
    if options.no_spectra {
        info!("Spectra: skipped");
    }

    let specs = config.source_specs()?;
    let seed = options.seed;
    let pipeline = Pipeline::new(maker_context(&config)?, specs, options)?;
    let result = pipeline.run().context("Pipeline failed")?;
    info!("{}", result.stats);

    let metadata = RunMetadata::new(seed).with_config(text);
    let stats = write_output(output, &result, &metadata, &writer_config)
        .with_context(|| format!("Failed to write output to {}", output.display()))?;

    info!("Run complete!");
    info!("  Targets: {}", result.len());
    for (path, file_stats) in &stats.files {
        info!("  {}: {} rows", path.display(), file_stats.rows_written);
    }

    Ok(())
}
