use std::path::Path;
use std::sync::Arc;

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::broaden::broaden;
use super::{NativeTemplates, TemplateRequest, TemplateService, FLUX_UNIT};
use crate::mock::io::read_parquet;
use crate::mock::MockError;
use crate::photometry::{FilterSet, PhotSystem};
use crate::sampling::KdTree;
use crate::schema::{columns, empty_objmeta_table};
use crate::table::{Column, Table};

/// Metadata key holding the rest-frame wavelength grid
const BASEWAVE_KEY: &str = "basewave";

/// Rest-frame template spectra and their physical parameters
///
/// Stored as Parquet: one row per template with `TEMPLATEID`, parameter
/// columns and a fixed-width `FLUX` list; the wavelength grid is a JSON array
/// under the `basewave` key-value metadata key.
#[derive(Debug, Clone)]
pub struct BasisLibrary {
    name: String,
    basewave: Vec<f64>,
    params: Table,
    flux: Array2<f32>,
}

impl BasisLibrary {
    /// Assemble a library; `flux` must be `params.len() x basewave.len()`
    pub fn from_parts(
        name: impl Into<String>,
        basewave: Vec<f64>,
        params: Table,
        flux: Array2<f32>,
    ) -> Result<Self, MockError> {
        let name = name.into();
        if flux.nrows() != params.len() || flux.ncols() != basewave.len() {
            return Err(MockError::violation(format!(
                "{} basis has {}x{} fluxes for {} templates and {} wavelengths",
                name,
                flux.nrows(),
                flux.ncols(),
                params.len(),
                basewave.len()
            )));
        }
        if basewave.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MockError::violation(format!(
                "{} basis wavelengths are not strictly increasing",
                name
            )));
        }
        Ok(Self {
            name,
            basewave,
            params,
            flux,
        })
    }

    /// Read `{name}.parquet` style basis files
    pub fn from_parquet(path: &Path, name: impl Into<String>) -> Result<Self, MockError> {
        let name = name.into();
        let loaded = read_parquet(path)?;
        let basewave = loaded.json_f64(BASEWAVE_KEY)?;
        let mut params = loaded.table;
        let flux = match params.remove("FLUX") {
            Some(Column::Float32List { width, values }) => {
                Array2::from_shape_vec((params.len(), width), values).map_err(|e| {
                    MockError::violation(format!("{} basis FLUX: {}", name, e))
                })?
            }
            Some(other) => {
                return Err(MockError::violation(format!(
                    "{} basis FLUX has type {}",
                    name,
                    other.kind()
                )))
            }
            None => {
                return Err(MockError::violation(format!(
                    "{} has no FLUX column",
                    path.display()
                )))
            }
        };
        log::info!(
            "Read {} {} basis templates with {} pixels from {}",
            params.len(),
            name,
            basewave.len(),
            path.display()
        );
        Self::from_parts(name, basewave, params, flux)
    }

    /// Library name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True if the library has no templates
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Rest-frame wavelengths in Angstrom
    pub fn basewave(&self) -> &[f64] {
        &self.basewave
    }

    /// Per-template parameter columns
    pub fn params(&self) -> &Table {
        &self.params
    }

    /// Rest-frame flux of one template
    pub fn flux(&self, template: usize) -> ArrayView1<'_, f32> {
        self.flux.row(template)
    }

    /// Component `k` of a list parameter column, widened to f64
    pub fn list_component(&self, name: &str, k: usize) -> Result<Vec<f64>, MockError> {
        let (width, values) = self.params.list(name)?;
        if k >= width {
            return Err(MockError::violation(format!(
                "{} has {} components, asked for {}",
                name, width, k
            )));
        }
        Ok(values.chunks(width).map(|row| row[k] as f64).collect())
    }

    /// KD-tree over the given feature columns, one point per template
    pub fn tree(&self, features: &[Vec<f64>]) -> Result<KdTree, MockError> {
        if features.iter().any(|f| f.len() != self.len()) {
            return Err(MockError::violation(format!(
                "{} tree features do not have one value per template",
                self.name
            )));
        }
        let rows: Vec<Vec<f64>> = (0..self.len())
            .map(|i| features.iter().map(|f| f[i]).collect())
            .collect();
        KdTree::build(features.len(), &rows)
            .ok_or_else(|| MockError::violation(format!("cannot build {} tree", self.name)))
    }

    /// KD-tree over named scalar parameter columns
    pub fn tree_over(&self, names: &[&str]) -> Result<KdTree, MockError> {
        let features = names
            .iter()
            .map(|name| Ok(self.params.numeric(name)?))
            .collect::<Result<Vec<_>, MockError>>()?;
        self.tree(&features)
    }
}

/// [`TemplateService`] drawing from one basis library
#[derive(Debug, Clone)]
pub struct BasisTemplates {
    objtype: String,
    subtype: String,
    library: Arc<BasisLibrary>,
    filters: Arc<FilterSet>,
}

impl BasisTemplates {
    /// Service for template family `objtype`
    pub fn new(objtype: impl Into<String>, library: Arc<BasisLibrary>, filters: Arc<FilterSet>) -> Self {
        Self {
            objtype: objtype.into(),
            subtype: String::new(),
            library,
            filters,
        }
    }

    /// Tag generated rows with a spectral subtype (DA, DB, ...)
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = subtype.into();
        self
    }

    /// Underlying basis library
    pub fn library(&self) -> &Arc<BasisLibrary> {
        &self.library
    }
}

impl TemplateService for BasisTemplates {
    fn objtype(&self) -> &str {
        &self.objtype
    }

    fn make_native(&self, request: &TemplateRequest<'_>) -> Result<NativeTemplates, MockError> {
        let input = request.meta;
        let nobj = input.len();
        if let Some(vdisp) = request.vdisp {
            if vdisp.len() != nobj {
                return Err(MockError::violation(format!(
                    "{} velocity dispersions for {} templates",
                    vdisp.len(),
                    nobj
                )));
            }
        }
        if self.library.is_empty() && nobj > 0 {
            return Err(MockError::violation(format!("{} basis is empty", self.library.name())));
        }

        let templateid = input.numeric(columns::TEMPLATEID)?;
        let seed = input.numeric(columns::SEED)?;
        let redshift = input.numeric(columns::REDSHIFT)?;
        let mag = input.numeric(columns::MAG)?;
        let magfilter = input.utf8(columns::MAGFILTER)?;
        let bandfilters = if request.south {
            PhotSystem::South.filters()
        } else {
            PhotSystem::North.filters()
        };

        let restwave = self.library.basewave();
        let npix = restwave.len();
        let mut flux = Array2::<f32>::zeros((nobj, npix));
        let mut chosen = vec![0i32; nobj];
        let mut bandflux: [Vec<f64>; 5] = Default::default();

        for i in 0..nobj {
            let tid = if templateid[i] >= 0.0 {
                let tid = templateid[i] as usize;
                if tid >= self.library.len() {
                    return Err(MockError::violation(format!(
                        "TEMPLATEID {} outside the {} templates of {}",
                        tid,
                        self.library.len(),
                        self.library.name()
                    )));
                }
                tid
            } else {
                let mut rng = StdRng::seed_from_u64(seed[i].max(0.0) as u64);
                rng.gen_range(0..self.library.len())
            };
            chosen[i] = tid as i32;

            let rest: Vec<f64> = self.library.flux(tid).iter().map(|&v| v as f64).collect();
            let rest = match request.vdisp {
                Some(vdisp) => broaden(restwave, &rest, vdisp[i]),
                None => rest,
            };
            let zfactor = 1.0 + redshift[i];
            let obswave: Vec<f64> = restwave.iter().map(|w| w * zfactor).collect();
            let obsflux: Vec<f64> = rest.iter().map(|f| f / zfactor).collect();

            let normmaggies = self.filters.get(&magfilter[i])?.ab_maggies(&obswave, &obsflux);
            let scale = if normmaggies > 0.0 {
                10f64.powf(-0.4 * mag[i]) / normmaggies
            } else {
                log::debug!(
                    "Template {} of {} has no flux in {} at z={:.3}",
                    tid,
                    self.library.name(),
                    magfilter[i],
                    redshift[i]
                );
                0.0
            };

            let maggies = self.filters.maggies(&bandfilters, &obswave, &obsflux)?;
            for (k, m) in maggies.into_iter().enumerate() {
                bandflux[k].push(1e9 * m * scale);
            }
            for (dst, &f) in flux.row_mut(i).iter_mut().zip(obsflux.iter()) {
                *dst = (f * scale / FLUX_UNIT) as f32;
            }
        }

        let mut meta = input.clone();
        meta.fill_str(columns::OBJTYPE, &self.objtype)?;
        if !self.subtype.is_empty() {
            meta.fill_str(columns::SUBTYPE, &self.subtype)?;
        }
        meta.assign(columns::TEMPLATEID, &Column::from(chosen.clone()))?;
        for (band, values) in columns::BANDS.iter().zip(bandflux) {
            meta.assign(&columns::flux(band), &Column::from(values))?;
        }

        let objmeta = self.objmeta(&chosen, request.vdisp, nobj)?;
        Ok(NativeTemplates {
            restwave: restwave.to_vec(),
            redshift,
            flux,
            meta,
            objmeta,
        })
    }
}

impl BasisTemplates {
    /// Family metadata: basis parameters of the chosen templates plus `VDISP`
    fn objmeta(&self, chosen: &[i32], vdisp: Option<&[f64]>, nobj: usize) -> Result<Table, MockError> {
        let mut objmeta = empty_objmeta_table(nobj, &self.objtype);
        let rows: Vec<usize> = chosen.iter().map(|&t| t as usize).collect();
        let names: Vec<String> = objmeta.names().to_vec();
        for name in names {
            if name == "VDISP" {
                if let Some(vdisp) = vdisp {
                    objmeta.assign(&name, &Column::from(vdisp.to_vec()))?;
                }
                continue;
            }
            if let Some(column) = self.library.params().get(&name) {
                if column.kind().is_numeric() {
                    objmeta.assign(&name, &column.gather(&rows))?;
                }
            }
        }
        Ok(objmeta)
    }
}
