use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::morphology::MorphologyModel;
use super::nospectra::PhotometryModel;
use crate::mock::MockError;

/// Target classes that carry empirical photometry models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GmmTarget {
    /// Emission-line galaxies
    Elg,
    /// Luminous red galaxies
    Lrg,
    /// Bright galaxy survey
    Bgs,
    /// Tracer quasars
    Qso,
    /// Lyman-alpha forest quasars
    Lya,
}

impl GmmTarget {
    /// Upper-case class tag
    pub fn name(&self) -> &'static str {
        match self {
            GmmTarget::Elg => "ELG",
            GmmTarget::Lrg => "LRG",
            GmmTarget::Bgs => "BGS",
            GmmTarget::Qso => "QSO",
            GmmTarget::Lya => "LYA",
        }
    }

    /// Parse a class tag, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "ELG" => Some(GmmTarget::Elg),
            "LRG" => Some(GmmTarget::Lrg),
            "BGS" => Some(GmmTarget::Bgs),
            "QSO" => Some(GmmTarget::Qso),
            "LYA" => Some(GmmTarget::Lya),
            _ => None,
        }
    }

    /// True for the galaxy classes with morphology models
    pub fn has_morphology(&self) -> bool {
        matches!(self, GmmTarget::Elg | GmmTarget::Lrg | GmmTarget::Bgs)
    }
}

impl fmt::Display for GmmTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lazily loaded empirical models, one slot per target class
///
/// Each model is read from disk on first request and shared read-only
/// afterwards. Cloning the registry shares the loaded models.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    gmm_dir: PathBuf,
    morphology: Arc<Mutex<HashMap<GmmTarget, Arc<MorphologyModel>>>>,
    photometry: Arc<Mutex<HashMap<GmmTarget, Arc<PhotometryModel>>>>,
}

impl ModelRegistry {
    /// Registry reading models from `gmm_dir`
    pub fn new(gmm_dir: impl Into<PathBuf>) -> Self {
        Self {
            gmm_dir: gmm_dir.into(),
            morphology: Arc::new(Mutex::new(HashMap::new())),
            photometry: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Directory the models are read from
    pub fn gmm_dir(&self) -> &Path {
        &self.gmm_dir
    }

    /// Register an already-built morphology model
    pub fn insert_morphology(&self, model: MorphologyModel) -> Result<(), MockError> {
        let mut slots = self
            .morphology
            .lock()
            .map_err(|_| MockError::violation("morphology registry lock poisoned"))?;
        slots.insert(model.target(), Arc::new(model));
        Ok(())
    }

    /// Register an already-built photometry model
    pub fn insert_photometry(&self, model: PhotometryModel) -> Result<(), MockError> {
        let mut slots = self
            .photometry
            .lock()
            .map_err(|_| MockError::violation("photometry registry lock poisoned"))?;
        slots.insert(model.target(), Arc::new(model));
        Ok(())
    }

    /// Morphology model for a class, loading it on first use
    ///
    /// Returns `None` for classes without morphology models.
    pub fn morphology(&self, target: GmmTarget) -> Result<Option<Arc<MorphologyModel>>, MockError> {
        if !target.has_morphology() {
            return Ok(None);
        }
        let mut slots = self
            .morphology
            .lock()
            .map_err(|_| MockError::violation("morphology registry lock poisoned"))?;
        if let Some(model) = slots.get(&target) {
            return Ok(Some(Arc::clone(model)));
        }
        let model = Arc::new(MorphologyModel::load(&self.gmm_dir, target)?);
        slots.insert(target, Arc::clone(&model));
        Ok(Some(model))
    }

    /// Photometry-only model for a class, loading it on first use
    pub fn photometry(&self, target: GmmTarget) -> Result<Arc<PhotometryModel>, MockError> {
        let mut slots = self
            .photometry
            .lock()
            .map_err(|_| MockError::violation("photometry registry lock poisoned"))?;
        if let Some(model) = slots.get(&target) {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(PhotometryModel::load(&self.gmm_dir, target)?);
        slots.insert(target, Arc::clone(&model));
        Ok(model)
    }
}
