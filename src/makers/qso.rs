use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::common::{
    draw_seeds, finish, input_meta, make_partitioned, photometry_only, pick, resolve_indices, split_south,
    Assembled, Lazy,
};
use super::{MakerBase, MakerOutput, MakerSettings, TargetMaker};
use crate::cuts::{apply_cuts, CutOptions, QsoSelection, TargetClass};
use crate::mock::{MockError, SourceRecords};
use crate::photometry::PhotSystem;
use crate::populate::PopulateOptions;
use crate::sampling::GmmTarget;
use crate::schema::{columns, empty_meta_table, empty_objmeta_table};
use crate::table::{Column, Table};
use crate::templates::{
    apply_transmission, BasisTemplates, NativeTemplates, Skewers, TemplateRequest, TemplateService, FLUX_UNIT,
};

/// Faint and bright limits of the flat r-band magnitude distribution
const RMAG_RANGE: (f64, f64) = (20.0, 22.5);

/// Quasar template library
const QSO_LIBRARY: &str = "qso";

fn normalization_filter(south: bool, use_simqso: bool) -> &'static str {
    match (use_simqso, south) {
        (true, true) => "decam2014-g",
        (true, false) => "BASS-g",
        (false, true) => "decam2014-r",
        (false, false) => "BASS-r",
    }
}

/// Set `MAG` and `MAGFILTER` of quasar input metadata
///
/// Simulated-QSO normalisation draws g magnitudes from the empirical
/// mixture; otherwise r magnitudes are uniform in [`RMAG_RANGE`].
fn normalize(
    base: &MakerBase,
    target: GmmTarget,
    use_simqso: bool,
    input: &mut Table,
    south: &[bool],
    rng: &mut StdRng,
) -> Result<(), MockError> {
    if use_simqso {
        base.ctx().survey.models.photometry(target)?.apply(input, rng)?;
    } else {
        let mags: Vec<f64> = (0..input.len())
            .map(|_| rng.gen_range(RMAG_RANGE.0..RMAG_RANGE.1))
            .collect();
        input.assign(columns::MAG, &Column::from(mags))?;
    }
    let filters: Vec<String> = south
        .iter()
        .map(|&s| normalization_filter(s, use_simqso).to_string())
        .collect();
    input.assign(columns::MAGFILTER, &Column::from(filters))?;
    Ok(())
}

fn select_qso(
    base: &MakerBase,
    use_simqso: bool,
    qso_selection: Option<QsoSelection>,
    targets: &mut Table,
) -> Result<(), MockError> {
    let selection = qso_selection.unwrap_or(if use_simqso {
        QsoSelection::RandomForest
    } else {
        QsoSelection::ColorCuts
    });
    let options = CutOptions::new(&[TargetClass::Qso])
        .with_qso_selection(selection)
        .with_optical_qso(!use_simqso)
        .with_forests(base.ctx().forests.clone());
    apply_cuts(targets, &options)?.or_into(targets)?;
    Ok(())
}

/// Tracer quasars from the Gaussian-field catalog
pub struct QsoMaker {
    base: MakerBase,
    use_simqso: bool,
    qso_selection: Option<QsoSelection>,
    service: Lazy<BasisTemplates>,
}

impl QsoMaker {
    /// Maker with the quasar options of `settings`
    pub fn new(base: MakerBase, settings: &MakerSettings) -> Self {
        Self {
            base,
            use_simqso: settings.use_simqso,
            qso_selection: settings.qso_selection,
            service: Lazy::new(),
        }
    }
}

impl TargetMaker for QsoMaker {
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
        let mut rng = StdRng::seed_from_u64(seed);
        let seeds = draw_seeds(&mut rng, indices.len());
        let south = pick(&data.south()?, &indices);
        let mut input = input_meta(&data.table, &indices, &seeds)?;

        let assembled = if no_spectra {
            photometry_only(ctx, GmmTarget::Qso, "QSO", &mut input, &mut rng)?;
            Assembled::from_meta(input, "QSO")
        } else {
            normalize(&self.base, GmmTarget::Qso, self.use_simqso, &mut input, &south, &mut rng)?;
            let service = self
                .service
                .get_or_try_init(|| ctx.templates.service("QSO", QSO_LIBRARY))?;
            make_partitioned(service.as_ref(), &input, None, &south, "QSO", &ctx.wave)?
        };

        let options = PopulateOptions::new(true, seed, "QSO", "QSO", "");
        finish(ctx, &data.table, &indices, assembled, &options, no_spectra)
    }

    fn select_targets(&self, targets: &mut Table, _truth: &mut Table) -> Result<(), MockError> {
        select_qso(&self.base, self.use_simqso, self.qso_selection, targets)
    }
}

/// Lyman-alpha forest quasars from CoLoRe, absorbed by their skewers
pub struct LyaMaker {
    base: MakerBase,
    use_simqso: bool,
    balprob: f64,
    qso_selection: Option<QsoSelection>,
    service: Lazy<BasisTemplates>,
}

impl LyaMaker {
    /// Maker with the quasar and BAL options of `settings`
    pub fn new(base: MakerBase, settings: &MakerSettings) -> Self {
        Self {
            base,
            use_simqso: settings.use_simqso,
            balprob: settings.balprob,
            qso_selection: settings.qso_selection,
            service: Lazy::new(),
        }
    }

    /// Unabsorbed quasar spectra on the native grid, in input order
    fn native(&self, service: &BasisTemplates, input: &Table, south: &[bool]) -> Result<NativeTemplates, MockError> {
        let nobj = input.len();
        let restwave = service.library().basewave().to_vec();
        let mut native = NativeTemplates {
            redshift: input.numeric(columns::REDSHIFT)?,
            flux: Array2::zeros((nobj, restwave.len())),
            restwave,
            meta: empty_meta_table(nobj),
            objmeta: empty_objmeta_table(nobj, "QSO"),
        };
        for (is_south, positions) in split_south(south) {
            if positions.is_empty() {
                continue;
            }
            let part = input.gather(&positions);
            let spectra = service.make_native(&TemplateRequest::new(&part, is_south))?;
            native.meta.scatter(&positions, &spectra.meta)?;
            native.objmeta.scatter(&positions, &spectra.objmeta)?;
            for (k, &p) in positions.iter().enumerate() {
                native.flux.row_mut(p).assign(&spectra.flux.row(k));
            }
        }
        Ok(native)
    }

    /// Recompute `FLUX_*` from the absorbed spectra
    fn synthesize_photometry(&self, native: &mut NativeTemplates, south: &[bool]) -> Result<(), MockError> {
        let filters = self.base.ctx().templates.filters();
        let mut bandflux: [Vec<f64>; 5] = Default::default();
        for (row, &s) in south.iter().enumerate() {
            let system = if s { PhotSystem::South } else { PhotSystem::North };
            let wave = native.observed_wave(row);
            let flux: Vec<f64> = native.flux.row(row).iter().map(|&f| f as f64 * FLUX_UNIT).collect();
            let maggies = filters.maggies(&system.filters(), &wave, &flux)?;
            for (k, m) in maggies.into_iter().enumerate() {
                bandflux[k].push(1e9 * m);
            }
        }
        for (band, values) in columns::BANDS.iter().zip(bandflux) {
            native.meta.assign(&columns::flux(band), &Column::from(values))?;
        }
        Ok(())
    }
}

impl TargetMaker for LyaMaker {
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
        let mut rng = StdRng::seed_from_u64(seed);
        let seeds = draw_seeds(&mut rng, indices.len());
        let south = pick(&data.south()?, &indices);
        let mut input = input_meta(&data.table, &indices, &seeds)?;

        let assembled = if no_spectra {
            photometry_only(ctx, GmmTarget::Lya, "QSO", &mut input, &mut rng)?;
            input.fill_str(columns::SUBTYPE, "LYA")?;
            Assembled::from_meta(input, "QSO")
        } else {
            normalize(&self.base, GmmTarget::Lya, self.use_simqso, &mut input, &south, &mut rng)?;
            let service = self
                .service
                .get_or_try_init(|| ctx.templates.service("QSO", QSO_LIBRARY))?;

            let table = &data.table;
            let files = table.utf8("LYAFILES")?;
            let lyafiles: Vec<String> = indices.iter().map(|&i| files[i].clone()).collect();
            let mockid = pick(table.i64(columns::MOCKID)?, &indices);
            let z = pick(&table.numeric("Z")?, &indices);
            let ra = pick(&table.numeric(columns::RA)?, &indices);
            let dec = pick(&table.numeric(columns::DEC)?, &indices);
            let skewers = Skewers::gather(&lyafiles, &mockid, &z, &ra, &dec)?;

            let mut native = self.native(service.as_ref(), &input, &south)?;
            native.meta.fill_str(columns::SUBTYPE, "LYA")?;
            for row in 0..native.flux.nrows() {
                let wave = native.observed_wave(row);
                let mut flux = native.flux.row(row).to_vec();
                let transmission = skewers.transmission.row(row).to_vec();
                apply_transmission(&wave, &mut flux, &skewers.wave, &transmission);
                native.flux.row_mut(row).assign(&ArrayView1::from(&flux[..]));
            }

            if self.balprob > 0.0 {
                let bal = ctx.templates.bal()?;
                let chosen = bal.insert_bals(&mut native, seed, self.balprob);
                log::debug!(
                    "Inserted BALs into {} of {} LYA spectra",
                    chosen.iter().filter(|&&t| t >= 0).count(),
                    chosen.len()
                );
                native.objmeta.assign("BAL_TEMPLATEID", &Column::from(chosen))?;
            }
            self.synthesize_photometry(&mut native, &south)?;

            Assembled {
                flux: native.resample(&ctx.wave),
                meta: native.meta,
                objmeta: native.objmeta,
            }
        };

        let options = PopulateOptions::new(true, seed, "QSO", "QSO", "LYA");
        finish(ctx, &data.table, &indices, assembled, &options, no_spectra)
    }

    fn select_targets(&self, targets: &mut Table, _truth: &mut Table) -> Result<(), MockError> {
        select_qso(&self.base, self.use_simqso, self.qso_selection, targets)
    }
}
