use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use ndarray::Array2;

use crate::mock::io::read_parquet;
use crate::mock::MockError;

/// Metadata key holding the skewer wavelength grid
const WAVELENGTH_KEY: &str = "wavelength";
/// Largest catalog/skewer disagreement tolerated in Z, RA and DEC
const MATCH_TOLERANCE: f64 = 1e-6;

/// One per-pixel transmission file
#[derive(Debug, Clone)]
pub struct SkewerFile {
    /// Observed wavelengths in Angstrom
    pub wave: Vec<f64>,
    /// Catalog identifier of each skewer
    pub mockid: Vec<i64>,
    /// Quasar redshift of each skewer
    pub z: Vec<f64>,
    /// Right ascension of each skewer
    pub ra: Vec<f64>,
    /// Declination of each skewer
    pub dec: Vec<f64>,
    /// Transmitted fraction, `nskewer x wave.len()`
    pub transmission: Array2<f32>,
}

impl SkewerFile {
    /// Read `MOCKID, Z, RA, DEC, TRANSMISSION` plus the `wavelength` metadata
    pub fn read(path: &Path) -> Result<Self, MockError> {
        let loaded = read_parquet(path)?;
        let wave = loaded.json_f64(WAVELENGTH_KEY)?;
        let table = &loaded.table;
        let (width, values) = table.list("TRANSMISSION")?;
        if width != wave.len() {
            return Err(MockError::violation(format!(
                "{}: {} transmission pixels for {} wavelengths",
                path.display(),
                width,
                wave.len()
            )));
        }
        let transmission = Array2::from_shape_vec((table.len(), width), values.to_vec())
            .map_err(|e| MockError::violation(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            wave,
            mockid: table.numeric("MOCKID")?.into_iter().map(|v| v as i64).collect(),
            z: table.numeric("Z")?,
            ra: table.numeric("RA")?,
            dec: table.numeric("DEC")?,
            transmission,
        })
    }

    /// Row of each requested mock id
    ///
    /// A mock id missing from the file is a [`MockError::Consistency`] error.
    pub fn rows_for(&self, mockid: &[i64], path: &Path) -> Result<Vec<usize>, MockError> {
        let lookup: HashMap<i64, usize> = self
            .mockid
            .iter()
            .enumerate()
            .map(|(row, &id)| (id, row))
            .collect();
        mockid
            .iter()
            .map(|id| {
                lookup.get(id).copied().ok_or_else(|| {
                    log::warn!("No MOCKID={} in {}, which should never happen", id, path.display());
                    MockError::consistency(format!("MOCKID {} missing from {}", id, path.display()))
                })
            })
            .collect()
    }
}

/// Transmission skewers aligned with a set of catalog objects
#[derive(Debug, Clone)]
pub struct Skewers {
    /// Observed wavelengths in Angstrom, shared by every skewer
    pub wave: Vec<f64>,
    /// Transmitted fraction, one row per object
    pub transmission: Array2<f32>,
}

impl Skewers {
    /// Gather the skewer of every object from its transmission file
    ///
    /// Objects are grouped by file; each file is read once. Every file must
    /// share one wavelength grid, and the skewer redshift and coordinates must
    /// agree with the catalog to 1e-6, otherwise the inputs are inconsistent.
    pub fn gather(
        lyafiles: &[String],
        mockid: &[i64],
        z: &[f64],
        ra: &[f64],
        dec: &[f64],
    ) -> Result<Self, MockError> {
        let nobj = lyafiles.len();
        if [mockid.len(), z.len(), ra.len(), dec.len()].iter().any(|&n| n != nobj) {
            return Err(MockError::violation("skewer lookup columns differ in length"));
        }

        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, file) in lyafiles.iter().enumerate() {
            groups.entry(file.as_str()).or_default().push(i);
        }

        let mut wave: Option<Vec<f64>> = None;
        let mut transmission = Array2::<f32>::zeros((0, 0));
        for (file, these) in groups {
            let path = Path::new(file);
            let skewers = SkewerFile::read(path)?;
            let ids: Vec<i64> = these.iter().map(|&i| mockid[i]).collect();
            let rows = skewers.rows_for(&ids, path)?;

            match &wave {
                None => {
                    transmission = Array2::zeros((nobj, skewers.wave.len()));
                    wave = Some(skewers.wave.clone());
                }
                Some(first) => {
                    let dw = if first.len() > 1 { first[1] - first[0] } else { 0.0 };
                    let same = first.len() == skewers.wave.len()
                        && first
                            .iter()
                            .zip(skewers.wave.iter())
                            .all(|(a, b)| (a - b).abs() < 1e-3 * dw.abs());
                    if !same {
                        return Err(MockError::consistency(format!(
                            "{} has a different skewer wavelength grid",
                            file
                        )));
                    }
                }
            }

            for (&obj, &row) in these.iter().zip(rows.iter()) {
                check_match("Z", z[obj], skewers.z[row], mockid[obj])?;
                check_match("RA", ra[obj], skewers.ra[row], mockid[obj])?;
                check_match("DEC", dec[obj], skewers.dec[row], mockid[obj])?;
                transmission.row_mut(obj).assign(&skewers.transmission.row(row));
            }
        }
        Ok(Self {
            wave: wave.unwrap_or_default(),
            transmission,
        })
    }
}

fn check_match(what: &str, catalog: f64, skewer: f64, mockid: i64) -> Result<(), MockError> {
    if (catalog - skewer).abs() < MATCH_TOLERANCE {
        Ok(())
    } else {
        Err(MockError::consistency(format!(
            "MOCKID {}: catalog {}={} but skewer {}={}",
            mockid, what, catalog, what, skewer
        )))
    }
}

/// Multiply a spectrum by a transmission skewer
///
/// Blueward of the skewer grid nothing is transmitted; redward everything is.
pub fn apply_transmission(wave: &[f64], flux: &mut [f32], skewer_wave: &[f64], transmission: &[f32]) {
    let (Some(&lo), Some(&hi)) = (skewer_wave.first(), skewer_wave.last()) else {
        return;
    };
    let trans: Vec<f64> = transmission.iter().map(|&t| t as f64).collect();
    for (f, &w) in flux.iter_mut().zip(wave.iter()) {
        let t = if w < lo {
            0.0
        } else if w > hi {
            1.0
        } else {
            crate::wave::interp(w, skewer_wave, &trans)
        };
        *f = (*f as f64 * t) as f32;
    }
}
