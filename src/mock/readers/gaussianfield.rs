use super::{apply_cut, finish, sample_morphology, trim_catalog, MockReader};
use crate::mock::common::{to_f32, CatalogCache};
use crate::mock::{MockError, MockFormat, ReadRequest, SourceRecords, SurveyContext};

/// Gaussian random field catalogs: `RA, DEC, Z_COSMO, DZ_RSD`
///
/// The observed redshift is `Z_COSMO + DZ_RSD`. SKY reads carry zero
/// redshifts. Galaxy classes get morphology and colours from their GMMs.
#[derive(Debug, Default)]
pub struct GaussianFieldReader {
    cache: CatalogCache,
}

impl GaussianFieldReader {
    /// Reader with an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl MockReader for GaussianFieldReader {
    fn format(&self) -> MockFormat {
        MockFormat::GaussianField
    }

    fn read(&self, ctx: &SurveyContext, request: &ReadRequest) -> Result<Option<SourceRecords>, MockError> {
        let Some(trimmed) = trim_catalog(&self.cache, ctx, request)? else {
            return Ok(None);
        };
        let n = trimmed.rows.len();
        let mut table = trimmed.table.clone();

        if request.target_name.eq_ignore_ascii_case("SKY") {
            table.push("Z", vec![0.0f32; n])?;
            table.push("Z_NORSD", vec![0.0f32; n])?;
        } else {
            let zcosmo = trimmed.numeric("Z_COSMO")?;
            let dz = trimmed.numeric("DZ_RSD")?;
            let z: Vec<f64> = zcosmo.iter().zip(dz.iter()).map(|(a, b)| a + b).collect();
            table.push("Z", to_f32(&z))?;
            table.push("Z_NORSD", to_f32(&zcosmo))?;

            if let Some(zmax) = request.zmax_qso {
                let keep: Vec<bool> = z.iter().map(|&zz| (zz as f32) < (zmax as f32)).collect();
                let what = format!("z<{:.3}", zmax);
                match apply_cut(table, &keep, &what, &request.target_name) {
                    Some(cut) => table = cut,
                    None => return Ok(None),
                }
            }
        }

        sample_morphology(ctx, request, &mut table, None)?;
        finish(
            ctx,
            request,
            self.format(),
            trimmed.nside,
            table,
            Some(&trimmed.path),
        )
    }
}
