use std::collections::HashMap;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::common::{
    draw_seeds, finish, input_meta, make_partitioned, pick, resolve_indices, split_south, Assembled, Lazy,
};
use super::stellar::or_column;
use super::{MakerBase, MakerContext, MakerOutput, TargetMaker};
use crate::masks::{desi_mask, mws_mask};
use crate::mock::{MockError, SourceRecords};
use crate::populate::PopulateOptions;
use crate::sampling::TemplateMatcher;
use crate::schema::{columns, empty_objmeta_table};
use crate::table::{Column, Table};
use crate::templates::{BasisTemplates, NormalizedMaggies};

/// Spectral subtypes with their own template library
const WD_SUBTYPES: [(&str, &str); 2] = [("DA", "wd_da"), ("DB", "wd_db")];

/// White dwarf catalogs are normalised in SDSS g
const WD_NORMFILTER: &str = "sdss2010-g";

/// Bright and faint g limits of the white dwarf sample
const MWS_WD_MAG_RANGE: (f64, f64) = (15.0, 20.0);

/// Faint g limit of white dwarf standards
const STD_WD_MAG_LIMIT: f64 = 19.0;

/// DA and DB template libraries, their (TEFF, LOGG) trees and photometry
#[derive(Debug)]
pub struct WdTemplates {
    services: HashMap<&'static str, BasisTemplates>,
    matcher: TemplateMatcher,
    maggies: HashMap<&'static str, NormalizedMaggies>,
}

impl WdTemplates {
    /// Load both subtype libraries
    pub fn load(ctx: &MakerContext) -> Result<Self, MockError> {
        let filters = ctx.templates.filters();
        let mut services = HashMap::new();
        let mut trees = Vec::new();
        let mut maggies = HashMap::new();
        for (subtype, library) in WD_SUBTYPES {
            let service = ctx.templates.service("WD", library)?.with_subtype(subtype);
            trees.push((subtype.to_string(), service.library().tree_over(&["TEFF", "LOGG"])?));
            maggies.insert(subtype, NormalizedMaggies::compute(service.library(), &filters, WD_NORMFILTER)?);
            services.insert(subtype, service);
        }
        Ok(Self {
            services,
            matcher: TemplateMatcher::by_subtype(trees),
            maggies,
        })
    }

    fn service(&self, subtype: &str) -> Result<&BasisTemplates, MockError> {
        self.services
            .get(subtype)
            .ok_or_else(|| MockError::Configuration(format!("unrecognized subtype {}", subtype)))
    }

    /// Nearest template in (TEFF, LOGG) within `subtype`
    pub fn query(&self, data: &Table, indices: &[usize], subtype: &str) -> Result<Vec<i32>, MockError> {
        let teff = pick(&data.numeric("TEFF")?, indices);
        let logg = pick(&data.numeric("LOGG")?, indices);
        let matrix: Vec<Vec<f64>> = teff.iter().zip(&logg).map(|(&t, &g)| vec![t, g]).collect();
        Ok(self
            .matcher
            .query(&matrix, subtype, true)?
            .into_iter()
            .map(|t| t as i32)
            .collect())
    }

    /// Noiseless photometry of white dwarfs of one subtype and system
    ///
    /// Returns spectral metadata (with `SUBTYPE`) and `TEFF`/`LOGG` object
    /// metadata taken from the catalog.
    pub fn wd_template_photometry(
        &self,
        data: &Table,
        indices: &[usize],
        seeds: &[i64],
        subtype: &str,
        south: bool,
    ) -> Result<(Table, Table), MockError> {
        let maggies = self.maggies.get(subtype).ok_or_else(|| {
            log::warn!("Unrecognized subtype {}!", subtype);
            MockError::Configuration(format!("unrecognized subtype {}", subtype))
        })?;
        let nobj = indices.len();
        let mut meta = input_meta(data, indices, seeds)?;
        meta.fill_str(columns::OBJTYPE, "WD")?;
        meta.fill_str(columns::SUBTYPE, subtype)?;
        let mut objmeta = empty_objmeta_table(nobj, "WD");
        for name in ["TEFF", "LOGG"] {
            objmeta.assign(name, &data.column(name)?.gather(indices))?;
        }

        let templateid = self.query(data, indices, subtype)?;
        let mag = meta.numeric(columns::MAG)?;
        let mut bandflux: [Vec<f64>; 5] = Default::default();
        for (k, &tid) in templateid.iter().enumerate() {
            for (band, f) in maggies.fluxes(tid as usize, mag[k], south).into_iter().enumerate() {
                bandflux[band].push(f);
            }
        }
        meta.assign(columns::TEMPLATEID, &Column::from(templateid))?;
        for (band, values) in columns::BANDS.iter().zip(bandflux) {
            meta.assign(&columns::flux(band), &Column::from(values))?;
        }
        Ok((meta, objmeta))
    }
}

/// White dwarfs, generated separately for the DA and DB subtypes
pub struct WdMaker {
    base: MakerBase,
    calib_only: bool,
    templates: Lazy<WdTemplates>,
}

impl WdMaker {
    /// Maker selecting only standards when `calib_only`
    pub fn new(base: MakerBase, calib_only: bool) -> Self {
        Self {
            base,
            calib_only,
            templates: Lazy::new(),
        }
    }
}

impl TargetMaker for WdMaker {
    fn base(&self) -> &MakerBase {
        &self.base
    }

    fn make_spectra(
        &self,
        data: &SourceRecords,
        indices: Option<&[usize]>,
        seed: u64,
        no_spectra: bool,
    ) -> Result<MakerOutput, MockError> {
        let ctx = self.base.ctx();
        let indices = resolve_indices(indices, data.len())?;
        if indices.is_empty() {
            return Ok(MakerOutput::empty(ctx.wave.clone()));
        }
        let templates = self.templates.get_or_try_init(|| WdTemplates::load(ctx))?;
        let table = &data.table;
        let nobj = indices.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let seeds = draw_seeds(&mut rng, nobj);
        let south = pick(&data.south()?, &indices);
        let allsubtype: Vec<String> = {
            let subtypes = table.utf8(columns::TEMPLATESUBTYPE)?;
            indices.iter().map(|&i| subtypes[i].clone()).collect()
        };

        let mut assembled = Assembled::new(nobj, "WD", if no_spectra { 0 } else { ctx.wave.len() });
        assembled.meta = input_meta(table, &indices, &seeds)?;
        for (subtype, _) in WD_SUBTYPES {
            let matched: Vec<usize> = (0..nobj).filter(|&k| allsubtype[k] == subtype).collect();
            if matched.is_empty() {
                continue;
            }
            if no_spectra {
                for (is_south, these) in split_south(&pick(&south, &matched)) {
                    if these.is_empty() {
                        continue;
                    }
                    let positions = pick(&matched, &these);
                    let rows = pick(&indices, &positions);
                    let (meta, objmeta) = templates.wd_template_photometry(
                        table,
                        &rows,
                        &pick(&seeds, &positions),
                        subtype,
                        is_south,
                    )?;
                    assembled.insert_tables(&positions, &meta, &objmeta)?;
                }
            } else {
                let rows = pick(&indices, &matched);
                let mut input = input_meta(table, &rows, &pick(&seeds, &matched))?;
                input.assign(columns::TEMPLATEID, &Column::from(templates.query(table, &rows, subtype)?))?;
                let part = make_partitioned(
                    templates.service(subtype)?,
                    &input,
                    None,
                    &pick(&south, &matched),
                    "WD",
                    &ctx.wave,
                )?;
                assembled.insert_tables(&matched, &part.meta, &part.objmeta)?;
                for (k, &p) in matched.iter().enumerate() {
                    assembled.flux.row_mut(p).assign(&part.flux.row(k));
                }
            }
        }
        let others = allsubtype
            .iter()
            .filter(|s| !WD_SUBTYPES.iter().any(|(known, _)| *known == s.as_str()))
            .count();
        if others > 0 {
            log::warn!("Skipping templates for {} white dwarfs of unknown subtype", others);
        }
        if no_spectra {
            assembled.flux = Array2::zeros((0, 0));
        }

        let options = PopulateOptions::new(true, seed, "WD", "WD", "").with_subtypes(allsubtype);
        finish(ctx, table, &indices, assembled, &options, no_spectra)
    }

    /// Magnitude-limited samples; the mocks carry no Gaia astrometry to cut on
    fn select_targets(&self, targets: &mut Table, truth: &mut Table) -> Result<(), MockError> {
        let mag = truth.numeric(columns::MAG)?;
        if !self.calib_only {
            log::warn!("Applying ad hoc selection of MWS_WD targets (no Gaia in mocks).");
            let selected: Vec<bool> = mag
                .iter()
                .map(|&m| m >= MWS_WD_MAG_RANGE.0 && m <= MWS_WD_MAG_RANGE.1)
                .collect();
            let desi: Vec<i64> = selected.iter().map(|&s| if s { desi_mask::MWS_ANY } else { 0 }).collect();
            let mws: Vec<i64> = selected.iter().map(|&s| if s { mws_mask::MWS_WD } else { 0 }).collect();
            or_column(targets, columns::DESI_TARGET, &desi)?;
            or_column(targets, columns::MWS_TARGET, &mws)?;
        }
        log::warn!("Applying ad hoc selection of STD_WD targets (no Gaia in mocks).");
        let std: Vec<i64> = mag
            .iter()
            .map(|&m| if m <= STD_WD_MAG_LIMIT { desi_mask::STD_WD } else { 0 })
            .collect();
        or_column(targets, columns::DESI_TARGET, &std)?;
        Ok(())
    }
}
