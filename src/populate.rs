//! Shared construction of the targets, truth and object-truth tables.
//!
//! Every maker ends with [`populate_targets_truth`]: it lays the source
//! records and the spectral metadata onto the fixed schemas, injects
//! photometric noise and attenuates the observed fluxes by Galactic dust.

use crate::mock::MockError;
use crate::photometry::{scatter_photometry, Band, PhotSystem};
use crate::schema::{columns, empty_targets_table, empty_truth_table};
use crate::table::{Column, Table};

/// Release number stamped on every mock target
pub const MOCK_RELEASE: i32 = 9999;
/// Astrometric inverse variance of mock positions
pub const RADEC_IVAR: f32 = 1e8;
/// Placeholder chi-squared differences between morphological models
pub const DCHISQ_PLACEHOLDER: [f32; 5] = [0.0, 100.0, 200.0, 300.0, 400.0];
/// Number of exposures in each optical band
pub const NOBS: i16 = 2;

/// A type string given once for all rows or per row
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    /// Same value for every row
    Scalar(String),
    /// One value per row
    PerObject(Vec<String>),
}

impl TypeSpec {
    /// Scalar spec
    pub fn scalar(value: impl Into<String>) -> Self {
        TypeSpec::Scalar(value.into())
    }

    /// Representative value: the scalar, or the first row
    pub fn first(&self) -> &str {
        match self {
            TypeSpec::Scalar(value) => value,
            TypeSpec::PerObject(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    fn column(&self, name: &str, nobj: usize) -> Result<Column, MockError> {
        match self {
            TypeSpec::Scalar(value) => Ok(Column::Utf8(vec![value.clone(); nobj])),
            TypeSpec::PerObject(values) if values.len() == nobj => Ok(Column::Utf8(values.clone())),
            TypeSpec::PerObject(values) => Err(MockError::violation(format!(
                "{} has {} values for {} objects",
                name,
                values.len(),
                nobj
            ))),
        }
    }
}

impl From<&str> for TypeSpec {
    fn from(value: &str) -> Self {
        TypeSpec::Scalar(value.to_string())
    }
}

impl From<Vec<String>> for TypeSpec {
    fn from(values: Vec<String>) -> Self {
        TypeSpec::PerObject(values)
    }
}

/// How a maker's rows are typed and observed
#[derive(Debug, Clone, PartialEq)]
pub struct PopulateOptions {
    /// Point-source (true) or extended-source depth for g, r, z noise
    pub psf: bool,
    /// Seed of the photometric noise
    pub seed: u64,
    /// `TRUESPECTYPE` (GALAXY, QSO, STAR, WD, SKY)
    pub truespectype: TypeSpec,
    /// `TEMPLATETYPE`; its first value also picks the object-truth family
    pub templatetype: TypeSpec,
    /// `TEMPLATESUBTYPE`
    pub templatesubtype: TypeSpec,
}

impl PopulateOptions {
    /// Options with scalar types
    pub fn new(psf: bool, seed: u64, truespectype: &str, templatetype: &str, templatesubtype: &str) -> Self {
        Self {
            psf,
            seed,
            truespectype: truespectype.into(),
            templatetype: templatetype.into(),
            templatesubtype: templatesubtype.into(),
        }
    }

    /// Replace the subtype with per-row values
    pub fn with_subtypes(mut self, subtypes: Vec<String>) -> Self {
        self.templatesubtype = TypeSpec::PerObject(subtypes);
        self
    }
}

/// Output of [`populate_targets_truth`]
#[derive(Debug, Clone, PartialEq)]
pub struct Populated {
    /// Observed catalog rows
    pub targets: Table,
    /// Ground truth, row-aligned with `targets`
    pub truth: Table,
    /// Family-specific truth; no columns for families without extras
    pub objtruth: Table,
}

/// Build targets, truth and object truth for the source rows `indices`
///
/// `meta` (and `objmeta`, unless it has no columns) must hold one row per
/// index. Source columns whose names match targets columns are copied; the
/// spectral metadata fills truth, with `REDSHIFT` landing in `TRUEZ`. Noise is
/// drawn with `options.seed`, then observed fluxes are multiplied by the
/// Galactic transmission while truth fluxes stay unattenuated.
pub fn populate_targets_truth(
    data: &Table,
    meta: &Table,
    objmeta: &Table,
    indices: &[usize],
    options: &PopulateOptions,
) -> Result<Populated, MockError> {
    let nobj = indices.len();
    if meta.len() != nobj {
        return Err(MockError::violation(format!(
            "{} metadata rows for {} objects",
            meta.len(),
            nobj
        )));
    }
    if objmeta.num_columns() > 0 && objmeta.len() != nobj {
        return Err(MockError::violation(format!(
            "{} object metadata rows for {} objects",
            objmeta.len(),
            nobj
        )));
    }
    if let Some(&max) = indices.iter().max() {
        if max >= data.len() {
            return Err(MockError::violation(format!(
                "index {} outside {} source records",
                max,
                data.len()
            )));
        }
    }

    let mut targets = empty_targets_table(nobj);
    let (mut truth, mut objtruth) = empty_truth_table(nobj, options.templatetype.first());

    truth.assign(columns::MOCKID, &data.column(columns::MOCKID)?.gather(indices))?;
    if objtruth.contains(columns::TRUEZ_NORSD) {
        if let Some(znorsd) = data.get("Z_NORSD") {
            objtruth.assign(columns::TRUEZ_NORSD, &znorsd.gather(indices))?;
        }
    }

    for (name, column) in data.iter() {
        if targets.contains(name) {
            targets.assign(name, &column.gather(indices))?;
        }
    }

    targets.fill(columns::RELEASE, MOCK_RELEASE as f64)?;
    let dec = targets.numeric(columns::DEC)?;
    let photsys: Vec<String> = dec
        .iter()
        .map(|&d| PhotSystem::from_dec(d).code().to_string())
        .collect();
    targets.assign(columns::PHOTSYS, &Column::Utf8(photsys))?;
    targets.fill("RA_IVAR", RADEC_IVAR as f64)?;
    targets.fill("DEC_IVAR", RADEC_IVAR as f64)?;
    {
        let (width, dchisq) = targets.list_mut(columns::DCHISQ)?;
        for row in dchisq.chunks_mut(width) {
            row.copy_from_slice(&DCHISQ_PLACEHOLDER[..width]);
        }
    }
    for band in columns::OPTICAL_BANDS {
        targets.fill(&format!("NOBS_{}", band), NOBS as f64)?;
    }

    truth.assign(columns::TRUESPECTYPE, &options.truespectype.column(columns::TRUESPECTYPE, nobj)?)?;
    truth.assign(columns::TEMPLATETYPE, &options.templatetype.column(columns::TEMPLATETYPE, nobj)?)?;
    truth.assign(
        columns::TEMPLATESUBTYPE,
        &options.templatesubtype.column(columns::TEMPLATESUBTYPE, nobj)?,
    )?;

    for (name, column) in meta.iter() {
        if name == columns::REDSHIFT {
            truth.assign(columns::TRUEZ, column)?;
        } else if truth.contains(name) {
            truth.assign(name, column)?;
        }
    }
    if objtruth.num_columns() > 0 && objmeta.num_columns() > 0 {
        for (name, column) in objmeta.iter() {
            if objtruth.contains(name) {
                objtruth.assign(name, column)?;
            }
        }
    }

    scatter_photometry(data, &truth, &mut targets, indices, options.psf, options.seed)?;

    for band in Band::ALL {
        let key = columns::flux(band.name());
        let trans = data.numeric(&columns::mw_transmission(band.name()))?;
        let attenuated: Vec<f64> = targets
            .numeric(&key)?
            .iter()
            .zip(indices.iter())
            .map(|(&f, &i)| f * trans[i])
            .collect();
        targets.assign(&key, &Column::from(attenuated))?;
    }

    Ok(Populated {
        targets,
        truth,
        objtruth,
    })
}
