use super::{finish, trim_catalog, MockReader, Trimmed};
use crate::mock::common::{push_repeated, to_f32, CatalogCache, C_LIGHT};
use crate::mock::{MockError, MockFormat, ReadRequest, SourceRecords, SurveyContext};
use crate::table::{Column, Table};

/// Columns shared by the white-dwarf and 100 pc catalogs
fn stellar_table(trimmed: &Trimmed, magcol: &str) -> Result<Table, MockError> {
    let mut table = trimmed.table.clone();
    let z: Vec<f64> = trimmed
        .numeric("RADIALVELOCITY")?
        .into_iter()
        .map(|v| v / C_LIGHT)
        .collect();
    table.push("Z", to_f32(&z))?;
    table.push("MAG", to_f32(&trimmed.numeric(magcol)?))?;
    table.push("TEFF", to_f32(&trimmed.numeric("TEFF")?))?;
    table.push("LOGG", to_f32(&trimmed.numeric("LOGG")?))?;
    push_repeated(&mut table, "MAGFILTER", "sdss2010-g")?;
    push_repeated(&mut table, "TYPE", "PSF")?;
    Ok(table)
}

/// White dwarfs: `RA, DEC, RADIALVELOCITY, G_SDSS, TEFF, LOGG, SPECTRALTYPE`
///
/// The spectral type (DA or DB) becomes the template subtype.
#[derive(Debug, Default)]
pub struct MwsWdReader {
    cache: CatalogCache,
}

impl MwsWdReader {
    /// Reader with an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl MockReader for MwsWdReader {
    fn format(&self) -> MockFormat {
        MockFormat::MwsWd
    }

    fn read(&self, ctx: &SurveyContext, request: &ReadRequest) -> Result<Option<SourceRecords>, MockError> {
        let Some(trimmed) = trim_catalog(&self.cache, ctx, request)? else {
            return Ok(None);
        };
        let mut table = stellar_table(&trimmed, "G_SDSS")?;
        let subtype: Vec<String> = trimmed
            .strings("SPECTRALTYPE")?
            .into_iter()
            .map(|s| s.trim().to_uppercase())
            .collect();
        table.push("TEMPLATESUBTYPE", Column::Utf8(subtype))?;
        finish(ctx, request, self.format(), trimmed.nside, table, Some(&trimmed.path))
    }
}

/// Stars within 100 pc: the white-dwarf columns with `MAGG` and `FEH`
#[derive(Debug, Default)]
pub struct MwsNearbyReader {
    cache: CatalogCache,
}

impl MwsNearbyReader {
    /// Reader with an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl MockReader for MwsNearbyReader {
    fn format(&self) -> MockFormat {
        MockFormat::Mws100pc
    }

    fn read(&self, ctx: &SurveyContext, request: &ReadRequest) -> Result<Option<SourceRecords>, MockError> {
        let Some(trimmed) = trim_catalog(&self.cache, ctx, request)? else {
            return Ok(None);
        };
        let mut table = stellar_table(&trimmed, "MAGG")?;
        table.push("FEH", to_f32(&trimmed.numeric("FEH")?))?;
        table.push(
            "TEMPLATESUBTYPE",
            Column::Utf8(trimmed.strings("SPECTRALTYPE")?),
        )?;
        finish(ctx, request, self.format(), trimmed.nside, table, Some(&trimmed.path))
    }
}
