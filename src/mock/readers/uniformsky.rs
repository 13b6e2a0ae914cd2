use super::{finish, trim_catalog, MockReader};
use crate::mock::common::CatalogCache;
use crate::mock::{MockError, MockFormat, ReadRequest, SourceRecords, SurveyContext};

/// Uniform random positions (`RA, DEC`) used for sky fibres
#[derive(Debug, Default)]
pub struct UniformSkyReader {
    cache: CatalogCache,
}

impl UniformSkyReader {
    /// Reader with an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl MockReader for UniformSkyReader {
    fn format(&self) -> MockFormat {
        MockFormat::UniformSky
    }

    fn read(&self, ctx: &SurveyContext, request: &ReadRequest) -> Result<Option<SourceRecords>, MockError> {
        let Some(trimmed) = trim_catalog(&self.cache, ctx, request)? else {
            return Ok(None);
        };
        let mut table = trimmed.table;
        let n = table.len();
        table.push("Z", vec![0.0f32; n])?;
        table.push("Z_NORSD", vec![0.0f32; n])?;
        finish(ctx, request, self.format(), trimmed.nside, table, Some(&trimmed.path))
    }
}
