use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{BalLibrary, BasisLibrary, BasisTemplates};
use crate::mock::MockError;
use crate::photometry::FilterSet;

/// File name of the filter curves inside the templates directory
pub const FILTERS_FILE: &str = "filters.json";
/// File name of the BAL templates inside the templates directory
pub const BAL_FILE: &str = "bal_templates.parquet";

/// Lazily loaded basis libraries and filter curves
///
/// Libraries are read from `{dir}/{name}.parquet` on first request and shared
/// read-only afterwards. Cloning the registry shares the loaded libraries.
#[derive(Clone)]
pub struct TemplateRegistry {
    dir: PathBuf,
    filters: Arc<FilterSet>,
    libraries: Arc<Mutex<HashMap<String, Arc<BasisLibrary>>>>,
    bal: Arc<Mutex<Option<Arc<BalLibrary>>>>,
}

impl TemplateRegistry {
    /// Registry over `dir`
    ///
    /// Filter curves come from `{dir}/filters.json`; without it every filter
    /// is approximated by a top-hat.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, MockError> {
        let dir = dir.into();
        let path = dir.join(FILTERS_FILE);
        let filters = if path.exists() {
            FilterSet::from_json(&path)?
        } else {
            log::warn!(
                "No {} in {}; using top-hat filter approximations",
                FILTERS_FILE,
                dir.display()
            );
            FilterSet::approximate()
        };
        Ok(Self::with_filters(dir, filters))
    }

    /// Registry with explicit filter curves
    pub fn with_filters(dir: impl Into<PathBuf>, filters: FilterSet) -> Self {
        Self {
            dir: dir.into(),
            filters: Arc::new(filters),
            libraries: Arc::new(Mutex::new(HashMap::new())),
            bal: Arc::new(Mutex::new(None)),
        }
    }

    /// Directory the libraries are read from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Shared filter curves
    pub fn filters(&self) -> Arc<FilterSet> {
        Arc::clone(&self.filters)
    }

    /// Register an already-built library under `name`
    pub fn insert_library(&self, name: &str, library: BasisLibrary) -> Result<(), MockError> {
        let mut slots = self
            .libraries
            .lock()
            .map_err(|_| MockError::violation("template registry lock poisoned"))?;
        slots.insert(name.to_lowercase(), Arc::new(library));
        Ok(())
    }

    /// Register already-built BAL templates
    pub fn insert_bal(&self, library: BalLibrary) -> Result<(), MockError> {
        let mut slot = self
            .bal
            .lock()
            .map_err(|_| MockError::violation("BAL registry lock poisoned"))?;
        *slot = Some(Arc::new(library));
        Ok(())
    }

    /// Basis library `name`, loading it on first use
    pub fn library(&self, name: &str) -> Result<Arc<BasisLibrary>, MockError> {
        let key = name.to_lowercase();
        let mut slots = self
            .libraries
            .lock()
            .map_err(|_| MockError::violation("template registry lock poisoned"))?;
        if let Some(library) = slots.get(&key) {
            return Ok(Arc::clone(library));
        }
        let path = self.dir.join(format!("{}.parquet", key));
        let library = Arc::new(BasisLibrary::from_parquet(&path, key.clone())?);
        slots.insert(key, Arc::clone(&library));
        Ok(library)
    }

    /// BAL templates, loading them on first use
    pub fn bal(&self) -> Result<Arc<BalLibrary>, MockError> {
        let mut slot = self
            .bal
            .lock()
            .map_err(|_| MockError::violation("BAL registry lock poisoned"))?;
        if let Some(library) = slot.as_ref() {
            return Ok(Arc::clone(library));
        }
        let library = Arc::new(BalLibrary::from_parquet(&self.dir.join(BAL_FILE))?);
        *slot = Some(Arc::clone(&library));
        Ok(library)
    }

    /// Template service of family `objtype` over library `name`
    pub fn service(&self, objtype: &str, name: &str) -> Result<BasisTemplates, MockError> {
        Ok(BasisTemplates::new(objtype, self.library(name)?, self.filters()))
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}
