use rand::rngs::StdRng;
use rand::SeedableRng;

use super::common::{draw_seeds, finish, input_meta, resolve_indices, Assembled};
use super::stellar::or_column;
use super::{MakerBase, MakerOutput, TargetMaker};
use crate::masks::desi_mask;
use crate::mock::{MockError, SourceRecords};
use crate::populate::PopulateOptions;
use crate::schema::columns;
use crate::table::Table;

/// Blank-sky fibers; every position is a sky target with a zero spectrum
pub struct SkyMaker {
    base: MakerBase,
}

impl SkyMaker {
    /// Maker reading through `base`
    pub fn new(base: MakerBase) -> Self {
        Self { base }
    }
}

impl TargetMaker for SkyMaker {
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
        let mut meta = input_meta(&data.table, &indices, &seeds)?;
        meta.fill_str(columns::OBJTYPE, "SKY")?;

        let npix = if no_spectra { 0 } else { ctx.wave.len() };
        let mut assembled = Assembled::new(indices.len(), "SKY", npix);
        assembled.meta = meta;
        let options = PopulateOptions::new(false, seed, "SKY", "SKY", "");
        finish(ctx, &data.table, &indices, assembled, &options, no_spectra)
    }

    fn select_targets(&self, targets: &mut Table, _truth: &mut Table) -> Result<(), MockError> {
        or_column(targets, columns::DESI_TARGET, &vec![desi_mask::SKY; targets.len()])
    }
}
