use super::{apply_cut, finish, sample_morphology, trim_catalog, MockReader};
use crate::mock::common::{push_repeated, to_f32, CatalogCache};
use crate::mock::{MockError, MockFormat, ReadRequest, SourceRecords, SurveyContext};
use crate::table::Table;

/// Durham MXXL lightcone (BGS): `RA, DEC, Z_OBS, APP_MAG, ABS_MAG, G_R`
///
/// Apparent r magnitudes seed the morphology draws through prior-magnitude
/// matching, so the sampled `MAG` and `MAGFILTER` replace the catalog ones.
#[derive(Debug, Default)]
pub struct MxxlReader {
    cache: CatalogCache,
}

impl MxxlReader {
    /// Reader with an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl MockReader for MxxlReader {
    fn format(&self) -> MockFormat {
        MockFormat::Mxxl
    }

    fn read(&self, ctx: &SurveyContext, request: &ReadRequest) -> Result<Option<SourceRecords>, MockError> {
        let Some(trimmed) = trim_catalog(&self.cache, ctx, request)? else {
            return Ok(None);
        };
        let mut table = trimmed.table.clone();
        table.push("Z", to_f32(&trimmed.numeric("Z_OBS")?))?;
        let rmag = trimmed.numeric("APP_MAG")?;
        table.push("MAG", to_f32(&rmag))?;
        table.push("SDSS_ABSMAG_R01", to_f32(&trimmed.numeric("ABS_MAG")?))?;
        table.push("SDSS_01GR", to_f32(&trimmed.numeric("G_R")?))?;

        if let Some(magcut) = request.magcut {
            let keep: Vec<bool> = rmag.iter().map(|&m| m < magcut).collect();
            let what = format!("r<{:.1}", magcut);
            match apply_cut(table, &keep, &what, &request.target_name) {
                Some(cut) => table = cut,
                None => return Ok(None),
            }
        }

        if request.only_coords {
            let mut coords = Table::with_rows(table.len());
            for name in ["MOCKID", "RA", "DEC", "Z", "MAG", "WEIGHT", "HEALPIX"] {
                coords.push(name, table.column(name)?.clone())?;
            }
            return Ok(Some(SourceRecords {
                target_name: request.target_name.clone(),
                mockformat: self.format(),
                nside: trimmed.nside,
                table: coords,
                mock_density: None,
            }));
        }

        push_repeated(&mut table, "MAGFILTER", "sdss2010-r")?;
        let rmag = table.numeric("MAG")?;
        sample_morphology(ctx, request, &mut table, Some(&rmag))?;
        finish(ctx, request, self.format(), trimmed.nside, table, Some(&trimmed.path))
    }
}
