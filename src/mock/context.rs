use std::path::PathBuf;
use std::sync::Arc;

use crate::sampling::ModelRegistry;
use crate::sky::{Bricks, ConstantDust, DustMap, Footprint, PixelWeights, UniformWeights};

/// Shared, read-only services used while reading mocks and making targets
#[derive(Clone)]
pub struct SurveyContext {
    /// Completeness weight per HEALPix cell
    pub weights: Arc<dyn PixelWeights>,
    /// Default footprint when a request names no cells
    pub footprint: Arc<dyn Footprint>,
    /// E(B-V) lookup
    pub dust: Arc<dyn DustMap>,
    /// Empirical models, loaded on first use
    pub models: ModelRegistry,
    /// Imaging brick tessellation
    pub bricks: Arc<Bricks>,
}

impl SurveyContext {
    /// Context with explicit services
    pub fn new(
        weights: Arc<dyn PixelWeights>,
        footprint: Arc<dyn Footprint>,
        dust: Arc<dyn DustMap>,
        models: ModelRegistry,
    ) -> Self {
        Self {
            weights,
            footprint,
            dust,
            models,
            bricks: Arc::new(Bricks::new()),
        }
    }

    /// Full-sky footprint, unit weights and no reddening
    pub fn uniform(gmm_dir: impl Into<PathBuf>) -> Self {
        let uniform = Arc::new(UniformWeights);
        Self::new(
            uniform.clone(),
            uniform,
            Arc::new(ConstantDust(0.0)),
            ModelRegistry::new(gmm_dir),
        )
    }
}

impl std::fmt::Debug for SurveyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurveyContext")
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}
