use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{apply_cut, finish, MockReader};
use crate::mock::common::{
    base_table, mockfile_path, push_repeated, requested_cells, select_footprint, to_f32, C_LIGHT,
};
use crate::mock::io::read_parquet;
use crate::mock::{encode_targetid, MockError, MockFormat, ReadRequest, SourceRecords, SurveyContext};
use crate::sky::healpix;
use crate::table::Table;

/// Parallax (mas) given to faint stars without Gaia astrometry
const FAINTSTAR_PARALLAX: f64 = 20.0;
/// Astrometric error given to faint stars without Gaia astrometry
const FAINTSTAR_ERROR: f64 = 1e8;

const GAIA_COLUMNS: [&str; 7] = [
    "G_GAIA",
    "PM_RA_STAR_GAIA",
    "PM_DEC_GAIA",
    "PARALLAX_GAIA",
    "PARALLAX_GAIA_ERROR",
    "PM_RA_GAIA_ERROR",
    "PM_DEC_GAIA_ERROR",
];

/// Galaxia Milky Way model, one file per coarse pixel
///
/// `mockfile` is the root of the file tree
/// `{root}/{nside_galaxia}/{pix/100}/{pix}/{filetype}-{nside_galaxia}-{pix}.parquet`.
/// MWS_MAIN reads the bright catalog and its Gaia companion; FAINTSTAR reads
/// the faint catalog (north cap first, then south) with placeholder astrometry.
#[derive(Debug, Default)]
pub struct GalaxiaReader;

impl GalaxiaReader {
    /// New reader
    pub fn new() -> Self {
        Self
    }
}

fn pixel_dir(root: &Path, nside_galaxia: u32, pixnum: i64) -> PathBuf {
    root.join(nside_galaxia.to_string())
        .join((pixnum / 100).to_string())
        .join(pixnum.to_string())
}

/// Catalog file of one Galaxia pixel for a target class
fn galaxia_file(root: &Path, nside_galaxia: u32, pixnum: i64, target: &str) -> Result<PathBuf, MockError> {
    let dir = pixel_dir(root, nside_galaxia, pixnum);
    let name = |filetype: &str| dir.join(format!("{}-{}-{}.parquet", filetype, nside_galaxia, pixnum));
    let candidates = match target.to_uppercase().as_str() {
        "MWS_MAIN" => vec![name("mock_allsky_galaxia_desi")],
        "FAINTSTAR" => vec![
            name("mock_superfaint_allsky_galaxia_desi_b10_cap_north"),
            name("mock_superfaint_allsky_galaxia_desi_b10_cap_south"),
        ],
        other => {
            return Err(MockError::Configuration(format!(
                "unrecognized Galaxia target {}",
                other
            )))
        }
    };
    let missing = candidates[0].clone();
    candidates
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| {
            log::warn!("Mock file {} not found!", missing.display());
            MockError::NotFound(missing)
        })
}

/// Gaia companion of a bright-catalog file (`mock_` becomes `gaia_mock_`)
fn gaia_file(galaxiafile: &Path) -> PathBuf {
    let name = galaxiafile
        .file_name()
        .map(|n| n.to_string_lossy().replacen("mock_", "gaia_mock_", 1))
        .unwrap_or_default();
    galaxiafile.with_file_name(name)
}

/// Columns gathered from every Galaxia file, in selection order
#[derive(Default)]
struct Accumulated {
    mockid: Vec<i64>,
    ra: Vec<f64>,
    dec: Vec<f64>,
    allpix: Vec<i64>,
    weight: Vec<f64>,
    values: BTreeMap<&'static str, Vec<f64>>,
}

impl Accumulated {
    fn extend(&mut self, name: &'static str, values: impl IntoIterator<Item = f64>) {
        self.values.entry(name).or_default().extend(values);
    }

    fn take(&mut self, name: &str) -> Vec<f64> {
        self.values.remove(name).unwrap_or_default()
    }
}

impl MockReader for GalaxiaReader {
    fn format(&self) -> MockFormat {
        MockFormat::Galaxia
    }

    fn read(&self, ctx: &SurveyContext, request: &ReadRequest) -> Result<Option<SourceRecords>, MockError> {
        let nside_galaxia = request.nside_galaxia.ok_or_else(|| {
            MockError::Configuration("nside_galaxia input is required for Galaxia mocks".to_string())
        })?;
        if !healpix::is_valid_nside(nside_galaxia) {
            return Err(MockError::Configuration(format!(
                "invalid nside_galaxia {}",
                nside_galaxia
            )));
        }
        let root = mockfile_path(request)?;
        let tree = root.join(nside_galaxia.to_string());
        if !tree.is_dir() {
            log::warn!("Galaxia top-level directory {} not found!", tree.display());
            return Err(MockError::NotFound(tree));
        }
        let faint = request.target_name.eq_ignore_ascii_case("FAINTSTAR");
        let (nside, cells) = requested_cells(ctx, request)?;
        let pixweight = ctx.weights.weights(nside);

        let mut galaxia_pixels: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for &cell in &cells {
            let (ra, dec) = healpix::pix2ang(nside, cell);
            let pixnum = healpix::ang2pix(nside_galaxia, ra, dec);
            galaxia_pixels.entry(pixnum).or_default().push(cell);
        }

        let mut acc = Accumulated::default();
        for (&pixnum, pixcells) in &galaxia_pixels {
            let path = galaxia_file(&root, nside_galaxia, pixnum, &request.target_name)?;
            log::info!("Reading {}", path.display());
            let data = read_parquet(&path)?.table;
            let ra: Vec<f64> = data
                .numeric("RA")?
                .into_iter()
                .map(|r| r.rem_euclid(360.0))
                .collect();
            let dec = data.numeric("DEC")?;
            let allpix = healpix::ang2pix_many(nside, &ra, &dec);
            let rows = select_footprint(&allpix, &pixweight, pixcells);
            if rows.is_empty() {
                continue;
            }

            for &i in &rows {
                acc.mockid.push(encode_targetid(i as i64, pixnum, 0, 1, 0)?);
                acc.ra.push(ra[i]);
                acc.dec.push(dec[i]);
                acc.allpix.push(allpix[i]);
                acc.weight.push(1.0 / pixweight[allpix[i] as usize]);
            }
            for name in ["V_HELIO", "SDSSR_TRUE_NODUST", "SDSSR_OBS", "TEFF", "LOGG", "FEH"] {
                let values = data.numeric(name)?;
                acc.extend(name, rows.iter().map(|&i| values[i]));
            }
            if !faint {
                read_gaia(&path, &rows, &mut acc)?;
            }
        }

        if acc.ra.is_empty() {
            log::warn!("No {}s in {} healpixel(s)!", request.target_name, cells.len());
            return Ok(None);
        }
        log::info!(
            "Trimmed to {} {}s in {} healpixel(s).",
            acc.ra.len(),
            request.target_name,
            cells.len()
        );

        let n = acc.ra.len();
        let mockid = acc.mockid.clone();
        let mut table = base_table(
            ctx,
            std::mem::take(&mut acc.mockid),
            std::mem::take(&mut acc.ra),
            std::mem::take(&mut acc.dec),
            std::mem::take(&mut acc.allpix),
            std::mem::take(&mut acc.weight),
        )?;

        let z: Vec<f64> = acc.take("V_HELIO").into_iter().map(|v| v / C_LIGHT).collect();
        let mag = acc.take("SDSSR_TRUE_NODUST");
        let teff: Vec<f64> = acc.take("TEFF").into_iter().map(|t| 10f64.powf(t)).collect();
        table.push("Z", to_f32(&z))?;
        table.push("MAG", to_f32(&mag))?;
        table.push("MAG_OBS", to_f32(&acc.take("SDSSR_OBS")))?;
        table.push("TEFF", to_f32(&teff))?;
        table.push("LOGG", to_f32(&acc.take("LOGG")))?;
        table.push("FEH", to_f32(&acc.take("FEH")))?;
        push_repeated(&mut table, "MAGFILTER", "sdss2010-r")?;
        table.push("REF_ID", mockid)?;

        let astrometry = if faint {
            Astrometry::placeholder(&mag)
        } else {
            Astrometry::from_gaia(&mut acc, n)
        };
        astrometry.push(&mut table)?;
        push_repeated(&mut table, "TYPE", "PSF")?;

        if let Some(magcut) = request.magcut {
            let keep: Vec<bool> = mag.iter().map(|&m| m < magcut).collect();
            let what = format!("r<{:.1}", magcut);
            match apply_cut(table, &keep, &what, &request.target_name) {
                Some(cut) => table = cut,
                None => return Ok(None),
            }
        }

        finish(ctx, request, self.format(), nside, table, None)
    }
}

/// Append the Gaia companion rows matching `rows`, or zeros if it is missing
fn read_gaia(galaxiafile: &Path, rows: &[usize], acc: &mut Accumulated) -> Result<(), MockError> {
    let path = gaia_file(galaxiafile);
    if !path.is_file() {
        log::warn!("Gaia file {} not found; using zero astrometry.", path.display());
        for name in GAIA_COLUMNS {
            acc.extend(name, std::iter::repeat(0.0).take(rows.len()));
        }
        return Ok(());
    }
    let gaia = read_parquet(&path)?.table;
    for name in GAIA_COLUMNS {
        let values = gaia.numeric(name)?;
        if values.len() <= rows.iter().copied().max().unwrap_or(0) {
            return Err(MockError::consistency(format!(
                "{} has {} rows, fewer than its Galaxia catalog",
                path.display(),
                values.len()
            )));
        }
        acc.extend(name, rows.iter().map(|&i| values[i]));
    }
    Ok(())
}

struct Astrometry {
    gmag: Vec<f64>,
    parallax: Vec<f64>,
    parallax_err: Vec<f64>,
    pmra: Vec<f64>,
    pmra_err: Vec<f64>,
    pmdec: Vec<f64>,
    pmdec_err: Vec<f64>,
}

fn ivar(err: &[f64]) -> Vec<f32> {
    err.iter()
        .map(|&e| if e > 0.0 { (1.0 / (e * e)) as f32 } else { 0.0 })
        .collect()
}

impl Astrometry {
    fn placeholder(mag: &[f64]) -> Self {
        let n = mag.len();
        Self {
            gmag: mag.to_vec(),
            parallax: vec![FAINTSTAR_PARALLAX; n],
            parallax_err: vec![FAINTSTAR_ERROR; n],
            pmra: vec![0.0; n],
            pmra_err: vec![FAINTSTAR_ERROR; n],
            pmdec: vec![0.0; n],
            pmdec_err: vec![FAINTSTAR_ERROR; n],
        }
    }

    fn from_gaia(acc: &mut Accumulated, n: usize) -> Self {
        let mut take = |name: &str| {
            let values = acc.take(name);
            if values.len() == n {
                values
            } else {
                vec![0.0; n]
            }
        };
        Self {
            gmag: take("G_GAIA"),
            pmra: take("PM_RA_STAR_GAIA"),
            pmdec: take("PM_DEC_GAIA"),
            parallax: take("PARALLAX_GAIA"),
            parallax_err: take("PARALLAX_GAIA_ERROR"),
            pmra_err: take("PM_RA_GAIA_ERROR"),
            pmdec_err: take("PM_DEC_GAIA_ERROR"),
        }
    }

    fn push(&self, table: &mut Table) -> Result<(), MockError> {
        let n = self.gmag.len();
        table.push("GAIA_PHOT_G_MEAN_MAG", to_f32(&self.gmag))?;
        table.push("GAIA_PHOT_BP_MEAN_MAG", vec![0.0f32; n])?;
        table.push("GAIA_PHOT_RP_MEAN_MAG", vec![0.0f32; n])?;
        table.push("GAIA_ASTROMETRIC_EXCESS_NOISE", vec![0.0f32; n])?;
        table.push("PARALLAX", to_f32(&self.parallax))?;
        table.push("PARALLAX_IVAR", ivar(&self.parallax_err))?;
        table.push("PMRA", to_f32(&self.pmra))?;
        table.push("PMRA_IVAR", ivar(&self.pmra_err))?;
        table.push("PMDEC", to_f32(&self.pmdec))?;
        table.push("PMDEC_IVAR", ivar(&self.pmdec_err))?;
        Ok(())
    }
}
