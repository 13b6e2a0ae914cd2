use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::common::{
    draw_seeds, finish, input_meta, make_partitioned, photometry_only, pick, resolve_indices, Assembled, Lazy,
};
use super::{MakerBase, MakerOutput, TargetMaker};
use crate::cuts::{apply_cuts, CutOptions, TargetClass};
use crate::mock::{MockError, MockFormat, SourceRecords};
use crate::populate::PopulateOptions;
use crate::sampling::{GmmTarget, TemplateMatcher, VdispModel};
use crate::schema::columns;
use crate::table::{Column, Table};
use crate::templates::BasisTemplates;

/// Galaxy template families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Lrg,
    Elg,
    Bgs,
}

impl Family {
    fn templatetype(&self) -> &'static str {
        match self {
            Family::Lrg => "LRG",
            Family::Elg => "ELG",
            Family::Bgs => "BGS",
        }
    }

    fn library(&self) -> &'static str {
        match self {
            Family::Lrg => "lrg",
            Family::Elg => "elg",
            Family::Bgs => "bgs",
        }
    }

    fn gmm(&self) -> GmmTarget {
        match self {
            Family::Lrg => GmmTarget::Lrg,
            Family::Elg => GmmTarget::Elg,
            Family::Bgs => GmmTarget::Bgs,
        }
    }

    /// Log-normal velocity dispersion in log10(km/s)
    fn vdisp(&self) -> VdispModel {
        match self {
            Family::Lrg => VdispModel::new(2.3, 0.1),
            Family::Elg | Family::Bgs => VdispModel::new(1.9, 0.15),
        }
    }

    fn cut_class(&self) -> TargetClass {
        match self {
            Family::Lrg => TargetClass::Lrg,
            Family::Elg => TargetClass::Elg,
            Family::Bgs => TargetClass::Bgs,
        }
    }

    /// Template library plus the tree its templates are matched in
    fn load(&self, base: &MakerBase) -> Result<GalaxyTemplates, MockError> {
        let service = base
            .ctx()
            .templates
            .service(self.templatetype(), self.library())?;
        let library = service.library();
        let matcher = match self {
            Family::Lrg => None,
            Family::Elg => {
                log::warn!("Using south ELG KD Tree for north photometry.");
                let z = library.params().numeric("Z")?;
                let g = library.params().numeric("DECAM_G")?;
                let r = library.params().numeric("DECAM_R")?;
                let zmag = library.params().numeric("DECAM_Z")?;
                let gr = g.iter().zip(&r).map(|(g, r)| g - r).collect();
                let rz = r.iter().zip(&zmag).map(|(r, z)| r - z).collect();
                Some(TemplateMatcher::single(library.tree(&[z, gr, rz])?))
            }
            Family::Bgs => {
                let z = library.params().numeric("Z")?;
                let rmabs = library.list_component("SDSS_UGRIZ_ABSMAG_Z01", 2)?;
                let gmabs = library.list_component("SDSS_UGRIZ_ABSMAG_Z01", 1)?;
                let gr = gmabs.iter().zip(&rmabs).map(|(g, r)| g - r).collect();
                Some(TemplateMatcher::single(library.tree(&[z, rmabs, gr])?))
            }
        };
        Ok(GalaxyTemplates { service, matcher })
    }

    /// Catalog columns matched against the template tree, if any
    fn query_columns(&self, format: MockFormat) -> Option<[&'static str; 3]> {
        match (self, format) {
            (Family::Elg, _) => Some(["Z", "GR", "RZ"]),
            (Family::Bgs, MockFormat::Mxxl) => Some(["Z", "SDSS_ABSMAG_R01", "SDSS_01GR"]),
            (Family::Bgs, MockFormat::Gama) => Some(["Z", "RMABS_01", "GR_01"]),
            _ => None,
        }
    }
}

struct GalaxyTemplates {
    service: BasisTemplates,
    matcher: Option<TemplateMatcher>,
}

/// Shared read/synthesize/select flow of the galaxy classes
struct GalaxyMaker {
    base: MakerBase,
    family: Family,
    templates: Lazy<GalaxyTemplates>,
}

impl GalaxyMaker {
    fn new(base: MakerBase, family: Family) -> Self {
        Self {
            base,
            family,
            templates: Lazy::new(),
        }
    }

    /// Template of each row: nearest neighbour in the tree, or uniform
    fn template_ids(
        &self,
        templates: &GalaxyTemplates,
        data: &Table,
        indices: &[usize],
        south: &[bool],
        rng: &mut StdRng,
    ) -> Result<Vec<i32>, MockError> {
        match (&templates.matcher, self.family.query_columns(self.base.format())) {
            (Some(matcher), Some(names)) => {
                let features = names
                    .iter()
                    .map(|name| Ok(pick(&data.numeric(name)?, indices)))
                    .collect::<Result<Vec<_>, MockError>>()?;
                let mut ids = Vec::with_capacity(indices.len());
                for (k, &s) in south.iter().enumerate() {
                    let row: Vec<f64> = features.iter().map(|f| f[k]).collect();
                    ids.push(matcher.query(&[row], "", s)?[0] as i32);
                }
                Ok(ids)
            }
            _ => {
                let ntemplates = templates.service.library().len();
                if ntemplates == 0 {
                    return Err(MockError::violation(format!(
                        "{} template library is empty",
                        self.family.templatetype()
                    )));
                }
                Ok((0..indices.len())
                    .map(|_| rng.gen_range(0..ntemplates) as i32)
                    .collect())
            }
        }
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
        let templatetype = self.family.templatetype();
        let mut rng = StdRng::seed_from_u64(seed);
        let seeds = draw_seeds(&mut rng, indices.len());
        let mut input = input_meta(&data.table, &indices, &seeds)?;

        let assembled = if no_spectra {
            photometry_only(ctx, self.family.gmm(), templatetype, &mut input, &mut rng)?;
            Assembled::from_meta(input, templatetype)
        } else {
            let south = pick(&data.south()?, &indices);
            let ra = pick(&data.ra()?, &indices);
            let dec = pick(&data.dec()?, &indices);
            let vdisp = self.family.vdisp().sample(&ra, &dec, ctx.nside_chunk, seed)?;

            let templates = self.templates.get_or_try_init(|| self.family.load(&self.base))?;
            let ids = self.template_ids(&templates, &data.table, &indices, &south, &mut rng)?;
            input.assign(columns::TEMPLATEID, &Column::from(ids))?;
            make_partitioned(&templates.service, &input, Some(&vdisp), &south, templatetype, &ctx.wave)?
        };

        let options = PopulateOptions::new(false, seed, "GALAXY", templatetype, "");
        finish(ctx, &data.table, &indices, assembled, &options, no_spectra)
    }

    fn select_targets(&self, targets: &mut Table) -> Result<(), MockError> {
        let options = CutOptions::new(&[self.family.cut_class()]);
        apply_cuts(targets, &options)?.or_into(targets)?;
        Ok(())
    }
}

macro_rules! galaxy_maker {
    ($(#[$doc:meta])* $name:ident, $family:expr) => {
        $(#[$doc])*
        pub struct $name(GalaxyMaker);

        impl $name {
            /// Maker reading through `base`
            pub fn new(base: MakerBase) -> Self {
                Self(GalaxyMaker::new(base, $family))
            }
        }

        impl TargetMaker for $name {
            fn base(&self) -> &MakerBase {
                &self.0.base
            }

            fn make_spectra(
                &self,
                data: &SourceRecords,
                indices: Option<&[usize]>,
                seed: u64,
                no_spectra: bool,
            ) -> Result<MakerOutput, MockError> {
                self.0.make_spectra(data, indices, seed, no_spectra)
            }

            fn select_targets(&self, targets: &mut Table, _truth: &mut Table) -> Result<(), MockError> {
                self.0.select_targets(targets)
            }
        }
    };
}

galaxy_maker!(
    /// Luminous red galaxies; templates are drawn uniformly
    LrgMaker,
    Family::Lrg
);
galaxy_maker!(
    /// Emission line galaxies matched on redshift and colours
    ElgMaker,
    Family::Elg
);
galaxy_maker!(
    /// Bright galaxies matched on redshift, absolute magnitude and colour
    BgsMaker,
    Family::Bgs
);
