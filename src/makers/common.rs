use std::sync::{Arc, Mutex};

use ndarray::Array2;
use rand::Rng;

use crate::mock::MockError;
use crate::populate::{populate_targets_truth, PopulateOptions};
use crate::sampling::GmmTarget;
use crate::schema::{columns, empty_meta_table, empty_objmeta_table};
use crate::table::{Column, Table};
use crate::templates::{TemplateOutput, TemplateRequest, TemplateService};

use super::{MakerContext, MakerOutput};

/// Exclusive upper bound of per-object template seeds
const SEED_LIMIT: i64 = 1 << 31;

/// Slot filled on first successful use
pub(crate) struct Lazy<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> Lazy<T> {
    pub(crate) fn new() -> Self {
        Self { slot: Mutex::new(None) }
    }

    pub(crate) fn get_or_try_init<F>(&self, init: F) -> Result<Arc<T>, MockError>
    where
        F: FnOnce() -> Result<T, MockError>,
    {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| MockError::violation("maker resource lock poisoned"))?;
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(init()?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }
}

/// Row indices to process: `indices`, or every row
pub(crate) fn resolve_indices(indices: Option<&[usize]>, nrows: usize) -> Result<Vec<usize>, MockError> {
    match indices {
        Some(indices) => {
            if let Some(&bad) = indices.iter().find(|&&i| i >= nrows) {
                return Err(MockError::violation(format!(
                    "index {} outside {} source records",
                    bad, nrows
                )));
            }
            Ok(indices.to_vec())
        }
        None => Ok((0..nrows).collect()),
    }
}

/// One template seed per object
pub(crate) fn draw_seeds<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<i64> {
    (0..n).map(|_| rng.gen_range(0..SEED_LIMIT)).collect()
}

/// Spectral metadata seeded from the source rows
///
/// `REDSHIFT` comes from `Z`; `MAG` and `MAGFILTER` are copied when the
/// records carry them.
pub(crate) fn input_meta(data: &Table, indices: &[usize], seeds: &[i64]) -> Result<Table, MockError> {
    let n = indices.len();
    let mut meta = empty_meta_table(n);
    meta.assign(columns::SEED, &Column::from(seeds.to_vec()))?;
    if let Some(z) = data.get("Z") {
        meta.assign(columns::REDSHIFT, &z.gather(indices))?;
    }
    for name in [columns::MAG, columns::MAGFILTER] {
        if let Some(column) = data.get(name) {
            meta.assign(name, &column.gather(indices))?;
        }
    }
    Ok(meta)
}

/// Positions of the north and south rows, each tagged with its system
pub(crate) fn split_south(south: &[bool]) -> [(bool, Vec<usize>); 2] {
    let mut north = Vec::new();
    let mut southern = Vec::new();
    for (k, &s) in south.iter().enumerate() {
        if s {
            southern.push(k);
        } else {
            north.push(k);
        }
    }
    [(false, north), (true, southern)]
}

/// Gather `values` at `positions`
pub(crate) fn pick<T: Copy>(values: &[T], positions: &[usize]) -> Vec<T> {
    positions.iter().map(|&p| values[p]).collect()
}

/// Spectra and metadata assembled from partial outputs, in input order
#[derive(Debug, Clone)]
pub(crate) struct Assembled {
    pub flux: Array2<f32>,
    pub meta: Table,
    pub objmeta: Table,
}

impl Assembled {
    pub(crate) fn new(nobj: usize, templatetype: &str, npix: usize) -> Self {
        Self {
            flux: Array2::zeros((nobj, npix)),
            meta: empty_meta_table(nobj),
            objmeta: empty_objmeta_table(nobj, templatetype),
        }
    }

    /// Metadata without spectra
    pub(crate) fn from_meta(meta: Table, templatetype: &str) -> Self {
        let nobj = meta.len();
        Self {
            flux: Array2::zeros((0, 0)),
            meta,
            objmeta: empty_objmeta_table(nobj, templatetype),
        }
    }

    /// Copy the rows of `part` to `positions`
    pub(crate) fn insert(&mut self, positions: &[usize], part: &TemplateOutput) -> Result<(), MockError> {
        self.insert_tables(positions, &part.meta, &part.objmeta)?;
        if self.flux.ncols() == part.flux.ncols() {
            for (k, &p) in positions.iter().enumerate() {
                self.flux.row_mut(p).assign(&part.flux.row(k));
            }
        } else if part.flux.nrows() > 0 {
            return Err(MockError::violation(format!(
                "spectra have {} pixels, expected {}",
                part.flux.ncols(),
                self.flux.ncols()
            )));
        }
        Ok(())
    }

    /// Copy metadata rows to `positions`
    pub(crate) fn insert_tables(&mut self, positions: &[usize], meta: &Table, objmeta: &Table) -> Result<(), MockError> {
        self.meta.scatter(positions, meta)?;
        if self.objmeta.num_columns() > 0 && objmeta.num_columns() > 0 {
            self.objmeta.scatter(positions, objmeta)?;
        }
        Ok(())
    }
}

/// Run `service` on the north and south rows of `input` separately
///
/// `vdisp` and `south` are aligned with the rows of `input`.
pub(crate) fn make_partitioned(
    service: &dyn TemplateService,
    input: &Table,
    vdisp: Option<&[f64]>,
    south: &[bool],
    templatetype: &str,
    wave: &[f64],
) -> Result<Assembled, MockError> {
    let mut out = Assembled::new(input.len(), templatetype, wave.len());
    for (is_south, positions) in split_south(south) {
        if positions.is_empty() {
            continue;
        }
        let part = input.gather(&positions);
        let part_vdisp = vdisp.map(|v| pick(v, &positions));
        let mut request = TemplateRequest::new(&part, is_south);
        if let Some(v) = part_vdisp.as_deref() {
            request = request.with_vdisp(v);
        }
        let templates = service.make_templates(&request, wave)?;
        out.insert(&positions, &templates)?;
    }
    Ok(out)
}

/// Noiseless photometry from the empirical mixture model, without spectra
pub(crate) fn photometry_only<R: Rng + ?Sized>(
    ctx: &MakerContext,
    target: GmmTarget,
    objtype: &str,
    input: &mut Table,
    rng: &mut R,
) -> Result<(), MockError> {
    let model = ctx.survey.models.photometry(target)?;
    model.apply(input, rng)?;
    input.fill_str(columns::OBJTYPE, objtype)?;
    Ok(())
}

/// Lay the assembled spectra onto the output tables
///
/// With `no_spectra` the flux array is dropped.
pub(crate) fn finish(
    ctx: &MakerContext,
    data: &Table,
    indices: &[usize],
    assembled: Assembled,
    options: &PopulateOptions,
    no_spectra: bool,
) -> Result<MakerOutput, MockError> {
    let populated = populate_targets_truth(data, &assembled.meta, &assembled.objmeta, indices, options)?;
    let flux = if no_spectra {
        Array2::zeros((0, ctx.wave.len()))
    } else {
        assembled.flux
    };
    Ok(MakerOutput {
        flux,
        wave: Arc::clone(&ctx.wave),
        targets: populated.targets,
        truth: populated.truth,
        objtruth: populated.objtruth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_split_south_keeps_order() {
        let [(n, north), (s, south)] = split_south(&[true, false, false, true]);
        assert!(!n && s);
        assert_eq!(north, vec![1, 2]);
        assert_eq!(south, vec![0, 3]);
    }

    #[test]
    fn test_seeds_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(draw_seeds(&mut rng, 100).iter().all(|&s| (0..SEED_LIMIT).contains(&s)));
    }

    #[test]
    fn test_resolve_indices_bounds() {
        assert_eq!(resolve_indices(None, 3).unwrap(), vec![0, 1, 2]);
        assert!(resolve_indices(Some(&[0, 3]), 3).is_err());
    }

    #[test]
    fn test_lazy_initialises_once() {
        let lazy: Lazy<usize> = Lazy::new();
        let a = lazy.get_or_try_init(|| Ok(7)).unwrap();
        let b = lazy.get_or_try_init(|| Err(MockError::violation("called twice"))).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
