use std::sync::Arc;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::common::{
    draw_seeds, finish, input_meta, make_partitioned, pick, resolve_indices, Assembled, Lazy,
};
use super::stellar::{or_column, StellarPhotometryService};
use super::{MakerBase, MakerOutput, TargetMaker};
use crate::cuts::{apply_cuts, CutOptions, TargetClass};
use crate::masks::{desi_mask, mws_mask};
use crate::mock::{MockError, SourceRecords};
use crate::photometry::{scatter_photometry, Band};
use crate::populate::PopulateOptions;
use crate::schema::{columns, empty_targets_table, empty_truth_table};
use crate::table::{Column, Table};

fn stellar_service(
    base: &MakerBase,
    slot: &Lazy<StellarPhotometryService>,
) -> Result<Arc<StellarPhotometryService>, MockError> {
    slot.get_or_try_init(|| StellarPhotometryService::load(base.ctx()))
}

/// Spectra or template photometry of catalog stars, matched on
/// (TEFF, LOGG, FEH)
fn star_assembled(
    base: &MakerBase,
    stellar: &StellarPhotometryService,
    data: &Table,
    indices: &[usize],
    seeds: &[i64],
    south: &[bool],
    no_spectra: bool,
) -> Result<Assembled, MockError> {
    if no_spectra {
        let (meta, objmeta) = stellar.template_photometry(data, indices, seeds, south)?;
        return Ok(Assembled {
            flux: Array2::zeros((0, 0)),
            meta,
            objmeta,
        });
    }
    let mut input = input_meta(data, indices, seeds)?;
    input.assign(columns::TEMPLATEID, &Column::from(stellar.query(data, indices)?))?;
    make_partitioned(stellar.service(), &input, None, south, "STAR", &base.ctx().wave)
}

fn make_stars(
    base: &MakerBase,
    slot: &Lazy<StellarPhotometryService>,
    data: &SourceRecords,
    indices: Option<&[usize]>,
    seed: u64,
    no_spectra: bool,
    per_object_subtype: bool,
) -> Result<MakerOutput, MockError> {
    let ctx = base.ctx();
    let indices = resolve_indices(indices, data.len())?;
    if indices.is_empty() {
        return Ok(MakerOutput::empty(ctx.wave.clone()));
    }
    let stellar = stellar_service(base, slot)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let seeds = draw_seeds(&mut rng, indices.len());
    let south = pick(&data.south()?, &indices);
    let assembled = star_assembled(base, &stellar, &data.table, &indices, &seeds, &south, no_spectra)?;

    let mut options = PopulateOptions::new(true, seed, "STAR", "STAR", "");
    if per_object_subtype {
        let subtypes = data.table.utf8(columns::TEMPLATESUBTYPE)?;
        options = options.with_subtypes(indices.iter().map(|&i| subtypes[i].clone()).collect());
    }
    finish(ctx, &data.table, &indices, assembled, &options, no_spectra)
}

/// Milky Way survey main-sample stars and standards from Galaxia
pub struct MwsMainMaker {
    base: MakerBase,
    calib_only: bool,
    stellar: Lazy<StellarPhotometryService>,
}

impl MwsMainMaker {
    /// Maker selecting standards only when `calib_only`
    pub fn new(base: MakerBase, calib_only: bool) -> Self {
        Self {
            base,
            calib_only,
            stellar: Lazy::new(),
        }
    }
}

impl TargetMaker for MwsMainMaker {
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
        make_stars(&self.base, &self.stellar, data, indices, seed, no_spectra, false)
    }

    fn select_targets(&self, targets: &mut Table, truth: &mut Table) -> Result<(), MockError> {
        let tcnames: &[TargetClass] = if self.calib_only {
            &[TargetClass::Std]
        } else {
            &[TargetClass::Mws, TargetClass::Std]
        };
        apply_cuts(targets, &CutOptions::new(tcnames))?.or_into(targets)?;

        if self.base.ctx().add_contaminants {
            StellarPhotometryService::select_contaminants(targets, truth)?;
        } else {
            log::info!("Bright stellar contaminants are disabled.");
        }
        Ok(())
    }
}

/// Faint Galaxia stars, kept only where they contaminate extragalactic samples
///
/// Photometry is synthesized from the templates and scattered first; only
/// the stars that pass a contaminant cut get spectra.
pub struct FaintStarMaker {
    base: MakerBase,
    stellar: Lazy<StellarPhotometryService>,
}

impl FaintStarMaker {
    /// Maker reading through `base`
    pub fn new(base: MakerBase) -> Self {
        Self {
            base,
            stellar: Lazy::new(),
        }
    }

    /// Noisy, attenuated photometry of every row plus its truth
    fn preselect(
        &self,
        data: &Table,
        indices: &[usize],
        photometry: &Table,
        seed: u64,
    ) -> Result<(Table, Table), MockError> {
        let nobj = indices.len();
        let mut targets = empty_targets_table(nobj);
        let (mut truth, _) = empty_truth_table(nobj, "STAR");
        for band in Band::ALL {
            let key = columns::flux(band.name());
            truth.assign(&key, photometry.column(&key)?)?;
            let name = columns::mw_transmission(band.name());
            targets.assign(&name, &data.column(&name)?.gather(indices))?;
        }
        // the targets table only carries optical depths; W1/W2 noise reads them from `data`
        for band in columns::OPTICAL_BANDS {
            let name = columns::psfdepth(band);
            targets.assign(&name, &data.column(&name)?.gather(indices))?;
        }
        scatter_photometry(data, &truth, &mut targets, indices, true, seed)?;
        for band in Band::ALL {
            let key = columns::flux(band.name());
            let trans = targets.numeric(&columns::mw_transmission(band.name()))?;
            let attenuated: Vec<f64> = targets
                .numeric(&key)?
                .iter()
                .zip(trans)
                .map(|(f, t)| f * t)
                .collect();
            targets.assign(&key, &Column::from(attenuated))?;
        }
        self.select_targets(&mut targets, &mut truth)?;
        Ok((targets, truth))
    }
}

impl TargetMaker for FaintStarMaker {
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
        let stellar = stellar_service(&self.base, &self.stellar)?;
        let table = &data.table;
        let mut rng = StdRng::seed_from_u64(seed);
        let seeds = draw_seeds(&mut rng, indices.len());
        let south = pick(&data.south()?, &indices);

        let (photometry, objmeta) = stellar.template_photometry(table, &indices, &seeds, &south)?;
        let (dummy, _) = self.preselect(table, &indices, &photometry, seed)?;

        let keep: Vec<usize> = dummy
            .i64(columns::DESI_TARGET)?
            .iter()
            .enumerate()
            .filter_map(|(k, &bits)| (bits != 0).then_some(k))
            .collect();
        log::debug!("Pre-selected {} FAINTSTAR targets.", keep.len());
        if keep.is_empty() {
            return Ok(MakerOutput::empty(ctx.wave.clone()));
        }

        let kept = pick(&indices, &keep);
        let kept_south = pick(&south, &keep);
        let assembled = if no_spectra {
            Assembled {
                flux: Array2::zeros((0, 0)),
                meta: photometry.gather(&keep),
                objmeta: objmeta.gather(&keep),
            }
        } else {
            let input = photometry.gather(&keep);
            make_partitioned(stellar.service(), &input, None, &kept_south, "STAR", &ctx.wave)?
        };

        let options = PopulateOptions::new(true, seed, "STAR", "STAR", "");
        let mut output = finish(ctx, table, &kept, assembled, &options, no_spectra)?;
        for band in Band::ALL {
            let key = columns::flux(band.name());
            output.targets.assign(&key, &dummy.column(&key)?.gather(&keep))?;
        }
        self.select_targets(&mut output.targets, &mut output.truth)?;
        Ok(output)
    }

    fn select_targets(&self, targets: &mut Table, truth: &mut Table) -> Result<(), MockError> {
        if self.base.ctx().add_contaminants {
            StellarPhotometryService::select_contaminants(targets, truth)
        } else {
            log::info!("Faint stellar contaminants are disabled.");
            Ok(())
        }
    }
}

/// Stars within 100 pc, with per-object spectral subtypes
pub struct MwsNearbyMaker {
    base: MakerBase,
    stellar: Lazy<StellarPhotometryService>,
}

impl MwsNearbyMaker {
    /// Maker reading through `base`
    pub fn new(base: MakerBase) -> Self {
        Self {
            base,
            stellar: Lazy::new(),
        }
    }
}

impl TargetMaker for MwsNearbyMaker {
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
        make_stars(&self.base, &self.stellar, data, indices, seed, no_spectra, true)
    }

    /// Every star is selected; the mocks carry no Gaia astrometry to cut on
    fn select_targets(&self, targets: &mut Table, _truth: &mut Table) -> Result<(), MockError> {
        log::warn!("Applying ad hoc selection of MWS_NEARBY targets (no Gaia in mocks).");
        let n = targets.len();
        or_column(targets, columns::DESI_TARGET, &vec![desi_mask::MWS_ANY; n])?;
        or_column(targets, columns::MWS_TARGET, &vec![mws_mask::MWS_NEARBY; n])?;
        Ok(())
    }
}
