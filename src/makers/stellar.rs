use std::collections::HashMap;

use crate::cuts::{is_bgs_faint, is_elg_south, is_lrg_colors, is_qso_colors, Fluxes};
use crate::masks::{bgs_mask, contam_mask, desi_mask};
use crate::mock::MockError;
use crate::photometry::unextinct_fluxes;
use crate::sampling::TemplateMatcher;
use crate::schema::{columns, empty_objmeta_table};
use crate::table::{Column, Table};
use crate::templates::{BasisTemplates, NormalizedMaggies};

use super::common::{input_meta, pick};
use super::MakerContext;

/// Stellar template library
const STAR_LIBRARY: &str = "star";

/// Filters stellar catalogs are normalised in
const STAR_NORMFILTERS: [&str; 2] = ["sdss2010-g", "sdss2010-r"];

/// Stellar templates, their parameter tree and their normalised photometry
///
/// Shared by every class built from the stellar library. The photometry
/// tables let the faint-star preselection and the photometry-only mode skip
/// spectrum synthesis.
#[derive(Debug)]
pub struct StellarPhotometryService {
    service: BasisTemplates,
    matcher: TemplateMatcher,
    maggies: HashMap<&'static str, NormalizedMaggies>,
}

impl StellarPhotometryService {
    /// Load the stellar library and precompute its photometry
    pub fn load(ctx: &MakerContext) -> Result<Self, MockError> {
        let service = ctx.templates.service("STAR", STAR_LIBRARY)?;
        let library = service.library();
        let matcher = TemplateMatcher::single(library.tree_over(&["TEFF", "LOGG", "FEH"])?);
        let filters = ctx.templates.filters();
        let mut maggies = HashMap::new();
        for normfilter in STAR_NORMFILTERS {
            maggies.insert(normfilter, NormalizedMaggies::compute(library, &filters, normfilter)?);
        }
        Ok(Self {
            service,
            matcher,
            maggies,
        })
    }

    /// Spectrum generator over the stellar library
    pub fn service(&self) -> &BasisTemplates {
        &self.service
    }

    /// Nearest template in (TEFF, LOGG, FEH) for the rows `indices`
    pub fn query(&self, data: &Table, indices: &[usize]) -> Result<Vec<i32>, MockError> {
        let teff = pick(&data.numeric("TEFF")?, indices);
        let logg = pick(&data.numeric("LOGG")?, indices);
        let feh = pick(&data.numeric("FEH")?, indices);
        let matrix: Vec<Vec<f64>> = (0..indices.len())
            .map(|k| vec![teff[k], logg[k], feh[k]])
            .collect();
        Ok(self
            .matcher
            .query(&matrix, "", true)?
            .into_iter()
            .map(|t| t as i32)
            .collect())
    }

    /// Noiseless photometry of the rows `indices` straight from the templates
    ///
    /// Each row is normalised in its own `MAGFILTER`, which must be SDSS g or
    /// r. Returns the spectral metadata and the stellar object metadata.
    pub fn template_photometry(
        &self,
        data: &Table,
        indices: &[usize],
        seeds: &[i64],
        south: &[bool],
    ) -> Result<(Table, Table), MockError> {
        let nobj = indices.len();
        let mut meta = input_meta(data, indices, seeds)?;
        let mut objmeta = empty_objmeta_table(nobj, "STAR");
        for name in ["TEFF", "LOGG", "FEH"] {
            objmeta.assign(name, &data.column(name)?.gather(indices))?;
        }

        let templateid = self.query(data, indices)?;
        let mag = meta.numeric(columns::MAG)?;
        let magfilter = meta.utf8(columns::MAGFILTER)?.to_vec();
        let mut bandflux: [Vec<f64>; 5] = Default::default();
        for k in 0..nobj {
            let maggies = self.maggies.get(magfilter[k].as_str()).ok_or_else(|| {
                log::warn!("Unrecognized normalization filter {}!", magfilter[k]);
                MockError::Configuration(format!("unrecognized normalization filter {}", magfilter[k]))
            })?;
            let fluxes = maggies.fluxes(templateid[k] as usize, mag[k], south[k]);
            for (band, f) in fluxes.into_iter().enumerate() {
                bandflux[band].push(f);
            }
        }

        meta.fill_str(columns::OBJTYPE, "STAR")?;
        meta.assign(columns::TEMPLATEID, &Column::from(templateid))?;
        for (band, values) in columns::BANDS.iter().zip(bandflux) {
            meta.assign(&columns::flux(band), &Column::from(values))?;
        }
        Ok((meta, objmeta))
    }

    /// Flag stars that pass the extragalactic colour cuts as contaminants
    ///
    /// Target bits go to `targets`, the matching `*_IS_STAR` and `*_CONTAM`
    /// bits to the truth `CONTAM_TARGET` column.
    pub fn select_contaminants(targets: &mut Table, truth: &mut Table) -> Result<(), MockError> {
        let [g, r, z, w1, w2] = unextinct_fluxes(targets)?;
        let n = targets.len();
        let mut desi = vec![0i64; n];
        let mut bgs = vec![0i64; n];
        let mut contam = vec![0i64; n];
        for i in 0..n {
            let f = Fluxes::new(g[i], r[i], z[i], w1[i], w2[i]);
            if is_bgs_faint(f.r, false) {
                bgs[i] |= bgs_mask::BGS_FAINT | bgs_mask::BGS_FAINT_SOUTH;
                desi[i] |= desi_mask::BGS_ANY;
                contam[i] |= contam_mask::BGS_IS_STAR | contam_mask::BGS_CONTAM;
            }
            if is_elg_south(&f) {
                desi[i] |= desi_mask::ELG | desi_mask::ELG_SOUTH;
                contam[i] |= contam_mask::ELG_IS_STAR | contam_mask::ELG_CONTAM;
            }
            if is_lrg_colors(&f, true) {
                desi[i] |= desi_mask::LRG | desi_mask::LRG_SOUTH;
                contam[i] |= contam_mask::LRG_IS_STAR | contam_mask::LRG_CONTAM;
            }
            if is_qso_colors(&f, false) {
                desi[i] |= desi_mask::QSO | desi_mask::QSO_SOUTH;
                contam[i] |= contam_mask::QSO_IS_STAR | contam_mask::QSO_CONTAM;
            }
        }
        or_column(targets, columns::DESI_TARGET, &desi)?;
        or_column(targets, columns::BGS_TARGET, &bgs)?;
        or_column(truth, columns::CONTAM_TARGET, &contam)?;
        Ok(())
    }
}

/// OR `bits` into an `i64` bitmask column
pub(crate) fn or_column(table: &mut Table, name: &str, bits: &[i64]) -> Result<(), MockError> {
    let column = table.i64_mut(name)?;
    if column.len() != bits.len() {
        return Err(MockError::violation(format!(
            "{} has {} rows, got {} bitmasks",
            name,
            column.len(),
            bits.len()
        )));
    }
    for (dst, &b) in column.iter_mut().zip(bits) {
        *dst |= b;
    }
    Ok(())
}
