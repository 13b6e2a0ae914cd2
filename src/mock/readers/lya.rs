use std::sync::Arc;

use super::{apply_cut, finish, trim_loaded, MockReader};
use crate::mock::common::{push_repeated, require_mockfile, requested_cells, to_f32, LoadedCatalog};
use crate::mock::{MockError, MockFormat, ReadRequest, SourceRecords, SurveyContext};
use crate::table::Column;

/// CoLoRe quasar catalog with per-pixel Lyman-alpha transmission files
///
/// The master table carries `MOCKID, Z_QSO_RSD, Z_QSO_NO_RSD, PIXNUM` (older
/// catalogs a single `Z`). Each object records the skewer file it lives in
/// as `LYAFILES`.
#[derive(Debug, Default)]
pub struct LyaCoLoReReader;

impl LyaCoLoReReader {
    /// New reader
    pub fn new() -> Self {
        Self
    }
}

/// Skewer file of one coarse pixel, relative to the master catalog's directory
pub fn transmission_path(mockdir: &std::path::Path, nside_lya: u32, pixnum: i64) -> std::path::PathBuf {
    mockdir
        .join((pixnum / 100).to_string())
        .join(pixnum.to_string())
        .join(format!("transmission-{}-{}.parquet", nside_lya, pixnum))
}

impl MockReader for LyaCoLoReReader {
    fn format(&self) -> MockFormat {
        MockFormat::CoLoRe
    }

    fn read(&self, ctx: &SurveyContext, request: &ReadRequest) -> Result<Option<SourceRecords>, MockError> {
        let nside_lya = request.nside_lya.ok_or_else(|| {
            MockError::Configuration("nside_lya input is required for CoLoRe mocks".to_string())
        })?;
        let path = require_mockfile(request)?;
        let (nside, cells) = requested_cells(ctx, request)?;
        let catalog = Arc::new(LoadedCatalog::read(&path, nside, ctx)?);
        let Some(trimmed) = trim_loaded(ctx, request, catalog, &cells)? else {
            return Ok(None);
        };

        let source = &trimmed.catalog.table;
        let (z, znorsd) = if source.contains("Z_QSO_RSD") {
            (trimmed.numeric("Z_QSO_RSD")?, trimmed.numeric("Z_QSO_NO_RSD")?)
        } else {
            let z = trimmed.numeric("Z")?;
            (z.clone(), z)
        };
        let mockid: Vec<i64> = trimmed
            .numeric("MOCKID")?
            .into_iter()
            .map(|v| v as i64)
            .collect();
        let pixnum: Vec<i64> = trimmed
            .numeric("PIXNUM")?
            .into_iter()
            .map(|v| v as i64)
            .collect();

        let mockdir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        let lyafiles: Vec<String> = pixnum
            .iter()
            .map(|&pix| transmission_path(&mockdir, nside_lya, pix).display().to_string())
            .collect();

        let mut table = trimmed.table.clone();
        table.push("MOCKID", mockid)?;
        table.push("Z", to_f32(&z))?;
        table.push("Z_NORSD", to_f32(&znorsd))?;
        table.push("PIXNUM", pixnum)?;
        table.push("LYAFILES", Column::Utf8(lyafiles))?;
        push_repeated(&mut table, "TYPE", "PSF")?;

        if let Some(zmin) = request.zmin_lya {
            let keep: Vec<bool> = z.iter().map(|&zz| zz >= zmin).collect();
            let what = format!("z>={:.3}", zmin);
            match apply_cut(table, &keep, &what, &request.target_name) {
                Some(cut) => table = cut,
                None => return Ok(None),
            }
        }

        finish(ctx, request, self.format(), trimmed.nside, table, Some(&path))
    }
}
