use super::{finish, trim_catalog, MockReader};
use crate::mock::common::{push_repeated, to_f32, CatalogCache};
use crate::mock::{MockError, MockFormat, ReadRequest, SourceRecords, SurveyContext};
use crate::photometry::nanomaggies_to_mag;

/// BGS mock matched to GAMA: `RA, DEC, Z, FLUX_{G,R,Z}, UGRIZ_ABSMAG_01`
///
/// Only explicit footprints are supported. Rest-frame colours are derived
/// from the K-corrected absolute magnitudes for template matching.
#[derive(Debug, Default)]
pub struct GamaReader {
    cache: CatalogCache,
}

impl GamaReader {
    /// Reader with an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl MockReader for GamaReader {
    fn format(&self) -> MockFormat {
        MockFormat::Gama
    }

    fn read(&self, ctx: &SurveyContext, request: &ReadRequest) -> Result<Option<SourceRecords>, MockError> {
        if request.healpixels.is_none() {
            return Err(MockError::Configuration(
                "healpixels input is required for bgs-gama mocks".to_string(),
            ));
        }
        let Some(trimmed) = trim_catalog(&self.cache, ctx, request)? else {
            return Ok(None);
        };
        let mut table = trimmed.table.clone();
        table.push("Z", to_f32(&trimmed.numeric("Z")?))?;
        let rmag: Vec<f64> = trimmed
            .numeric("FLUX_R")?
            .into_iter()
            .map(nanomaggies_to_mag)
            .collect();
        table.push("MAG", to_f32(&rmag))?;

        let absmag = trimmed.list_rows("UGRIZ_ABSMAG_01")?;
        if absmag.first().map(|row| row.len() < 5).unwrap_or(false) {
            return Err(MockError::violation("UGRIZ_ABSMAG_01 must have 5 bands"));
        }
        let colour = |a: usize, b: usize| -> Vec<f32> {
            absmag.iter().map(|row| (row[a] - row[b]) as f32).collect()
        };
        table.push("RMABS_01", absmag.iter().map(|row| row[2] as f32).collect::<Vec<f32>>())?;
        table.push("UG_01", colour(0, 1))?;
        table.push("GR_01", colour(1, 2))?;
        table.push("RI_01", colour(2, 3))?;
        table.push("IZ_01", colour(3, 4))?;
        push_repeated(&mut table, "MAGFILTER", "decam2014-r")?;

        finish(ctx, request, self.format(), trimmed.nside, table, Some(&trimmed.path))
    }
}
