use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::bgs::{is_bgs_bright, is_bgs_faint};
use super::elg::{is_elg_north, is_elg_south};
use super::forest::QsoForests;
use super::inputs::CutInputs;
use super::lrg::is_lrg_pass;
use super::qso::{is_qso_cuts, is_qso_randomforest};
use super::stars::{is_mws_main, is_mws_nearby, is_mws_wd, is_std};
use super::CutsError;
use crate::masks::{bgs_mask, desi_mask, mws_mask};
use crate::schema::columns;
use crate::table::{Table, TableError};

/// Oldest imaging release the cuts are defined for
const MIN_RELEASE: i64 = 6000;
/// Releases before this need Gaia-matched proper motions
const GAIA_MATCHED_RELEASE: i64 = 7000;

/// Target classes `apply_cuts` can evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetClass {
    /// Emission line galaxies
    Elg,
    /// Quasars
    Qso,
    /// Luminous red galaxies
    Lrg,
    /// Milky Way survey
    Mws,
    /// Bright galaxy survey
    Bgs,
    /// Standard stars
    Std,
}

impl TargetClass {
    /// Every class
    pub const ALL: [TargetClass; 6] = [
        TargetClass::Elg,
        TargetClass::Qso,
        TargetClass::Lrg,
        TargetClass::Mws,
        TargetClass::Bgs,
        TargetClass::Std,
    ];

    /// Upper-case class name
    pub fn name(&self) -> &'static str {
        match self {
            TargetClass::Elg => "ELG",
            TargetClass::Qso => "QSO",
            TargetClass::Lrg => "LRG",
            TargetClass::Mws => "MWS",
            TargetClass::Bgs => "BGS",
            TargetClass::Std => "STD",
        }
    }
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetClass::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown target class: {}", s))
    }
}

/// QSO selection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QsoSelection {
    /// Colour cuts
    ColorCuts,
    /// Random-forest classifier
    #[default]
    RandomForest,
}

impl FromStr for QsoSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "colorcuts" => Ok(QsoSelection::ColorCuts),
            "randomforest" => Ok(QsoSelection::RandomForest),
            other => Err(format!(
                "Unknown qso_selection {}; valid options are colorcuts, randomforest",
                other
            )),
        }
    }
}

/// Options for [`apply_cuts`]
#[derive(Debug, Clone)]
pub struct CutOptions {
    /// Classes to evaluate
    pub tcnames: Vec<TargetClass>,
    /// QSO selection method
    pub qso_selection: QsoSelection,
    /// Skip the WISE colour cuts of the QSO colour selection
    pub qso_optical: bool,
    /// Move north photometry onto the south system before cutting
    pub shift_north_photometry: bool,
    /// Random forests for [`QsoSelection::RandomForest`]
    pub forests: Arc<QsoForests>,
}

impl Default for CutOptions {
    fn default() -> Self {
        Self {
            tcnames: TargetClass::ALL.to_vec(),
            qso_selection: QsoSelection::default(),
            qso_optical: false,
            shift_north_photometry: false,
            forests: Arc::new(QsoForests::default()),
        }
    }
}

impl CutOptions {
    /// Options evaluating only `tcnames`
    pub fn new(tcnames: &[TargetClass]) -> Self {
        Self {
            tcnames: tcnames.to_vec(),
            ..Default::default()
        }
    }

    /// Use `selection` for quasars
    pub fn with_qso_selection(mut self, selection: QsoSelection) -> Self {
        self.qso_selection = selection;
        self
    }

    /// Drop the WISE terms of the QSO colour cuts
    pub fn with_optical_qso(mut self, optical: bool) -> Self {
        self.qso_optical = optical;
        self
    }

    /// Shift north photometry before cutting
    pub fn with_shifted_north(mut self, shift: bool) -> Self {
        self.shift_north_photometry = shift;
        self
    }

    /// Random forests for the QSO selection
    pub fn with_forests(mut self, forests: Arc<QsoForests>) -> Self {
        self.forests = forests;
        self
    }

    fn wants(&self, class: TargetClass) -> bool {
        self.tcnames.contains(&class)
    }
}

/// The three target bitmasks of a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetBits {
    /// `DESI_TARGET`
    pub desi_target: Vec<i64>,
    /// `BGS_TARGET`
    pub bgs_target: Vec<i64>,
    /// `MWS_TARGET`
    pub mws_target: Vec<i64>,
}

impl TargetBits {
    /// All-zero masks for `n` objects
    pub fn zeros(n: usize) -> Self {
        Self {
            desi_target: vec![0; n],
            bgs_target: vec![0; n],
            mws_target: vec![0; n],
        }
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.desi_target.len()
    }

    /// True if there are no objects
    pub fn is_empty(&self) -> bool {
        self.desi_target.is_empty()
    }

    /// OR the masks into the target columns of `targets`
    pub fn or_into(&self, targets: &mut Table) -> Result<(), TableError> {
        for (name, bits) in [
            (columns::DESI_TARGET, &self.desi_target),
            (columns::BGS_TARGET, &self.bgs_target),
            (columns::MWS_TARGET, &self.mws_target),
        ] {
            let column = targets.i64_mut(name)?;
            if column.len() != bits.len() {
                return Err(TableError::LengthMismatch {
                    column: name.to_string(),
                    expected: column.len(),
                    found: bits.len(),
                });
            }
            for (dst, &src) in column.iter_mut().zip(bits.iter()) {
                *dst |= src;
            }
        }
        Ok(())
    }
}

fn bit(selected: bool, mask: i64) -> i64 {
    if selected {
        mask
    } else {
        0
    }
}

/// Evaluate the selection cuts of every requested class
///
/// North and south variants are both evaluated; the per-system bits record
/// each variant while the combined bits use the variant matching the
/// object's `PHOTSYS`.
pub fn apply_cuts(targets: &Table, options: &CutOptions) -> Result<TargetBits, CutsError> {
    let n = targets.len();
    if n == 0 {
        return Ok(TargetBits::zeros(0));
    }
    let inputs = CutInputs::from_table(targets, options.shift_north_photometry)?;

    if let Some(&old) = inputs.release.iter().find(|&&r| r < MIN_RELEASE) {
        log::error!("Selection cuts are only coded for DR6 or above");
        return Err(CutsError::UnsupportedRelease(old));
    }
    let pmra = targets.numeric("PMRA")?;
    let max_pmra = pmra.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_pmra == 0.0 && inputs.release.iter().any(|&r| r < GAIA_MATCHED_RELEASE) {
        log::info!("Zero objects have a proper motion");
        return Err(CutsError::MissingProperMotions);
    }

    let mut bits = TargetBits::zeros(n);
    for i in 0..n {
        let north = inputs.north[i];
        let south = !north;
        let f = inputs.fluxes[i];
        let psflike = inputs.psflike[i];
        let mut desi = 0i64;
        let mut bgs = 0i64;
        let mut mws = 0i64;

        if options.wants(TargetClass::Lrg) {
            // north and south share one LRG selection
            let (lrg, one, two) = is_lrg_pass(&f, &inputs.lrg_quality(i));
            for (selected, combined, n_bit, s_bit) in [
                (lrg, desi_mask::LRG, desi_mask::LRG_NORTH, desi_mask::LRG_SOUTH),
                (one, desi_mask::LRG_1PASS, desi_mask::LRG_1PASS_NORTH, desi_mask::LRG_1PASS_SOUTH),
                (two, desi_mask::LRG_2PASS, desi_mask::LRG_2PASS_NORTH, desi_mask::LRG_2PASS_SOUTH),
            ] {
                desi |= bit(selected, n_bit) | bit(selected, s_bit) | bit(selected, combined);
            }
        }

        if options.wants(TargetClass::Elg) {
            let elg_north = is_elg_north(&f, &inputs.allmask(i));
            let elg_south = is_elg_south(&f);
            desi |= bit(elg_north, desi_mask::ELG_NORTH) | bit(elg_south, desi_mask::ELG_SOUTH);
            desi |= bit((elg_north && north) || (elg_south && south), desi_mask::ELG);
        }

        if options.wants(TargetClass::Qso) {
            let quality = inputs.qso_quality(i);
            let qso = match options.qso_selection {
                QsoSelection::ColorCuts => is_qso_cuts(&f, &quality, options.qso_optical),
                QsoSelection::RandomForest => is_qso_randomforest(&f, &quality, &options.forests)?,
            };
            desi |= bit(qso, desi_mask::QSO_NORTH) | bit(qso, desi_mask::QSO_SOUTH) | bit(qso, desi_mask::QSO);
        }

        if options.wants(TargetClass::Std) {
            let quality = inputs.band_quality(i);
            let gaia = &inputs.gaia[i];
            desi |= bit(is_std(&f, &quality, gaia, psflike, false), desi_mask::STD_FAINT);
            desi |= bit(is_std(&f, &quality, gaia, psflike, true), desi_mask::STD_BRIGHT);
        }

        if options.wants(TargetClass::Bgs) {
            let bright = is_bgs_bright(f.r, psflike);
            let faint = is_bgs_faint(f.r, psflike);
            bgs |= bit(bright, bgs_mask::BGS_BRIGHT_NORTH) | bit(bright, bgs_mask::BGS_BRIGHT_SOUTH);
            bgs |= bit(faint, bgs_mask::BGS_FAINT_NORTH) | bit(faint, bgs_mask::BGS_FAINT_SOUTH);
            bgs |= bit(bright, bgs_mask::BGS_BRIGHT) | bit(faint, bgs_mask::BGS_FAINT);
        }

        if options.wants(TargetClass::Mws) {
            let gaia = &inputs.gaia[i];
            let (main, red, blue) = is_mws_main(&f, inputs.obs_rflux[i], gaia, psflike);
            mws |= bit(main, mws_mask::MWS_MAIN)
                | bit(main, mws_mask::MWS_MAIN_NORTH)
                | bit(main, mws_mask::MWS_MAIN_SOUTH);
            mws |= bit(blue, mws_mask::MWS_MAIN_BLUE)
                | bit(blue, mws_mask::MWS_MAIN_BLUE_NORTH)
                | bit(blue, mws_mask::MWS_MAIN_BLUE_SOUTH);
            mws |= bit(red, mws_mask::MWS_MAIN_RED)
                | bit(red, mws_mask::MWS_MAIN_RED_NORTH)
                | bit(red, mws_mask::MWS_MAIN_RED_SOUTH);
            mws |= bit(is_mws_nearby(gaia), mws_mask::MWS_NEARBY);
            mws |= bit(is_mws_wd(gaia), mws_mask::MWS_WD);
        }

        desi |= bit(bgs != 0, desi_mask::BGS_ANY) | bit(mws != 0, desi_mask::MWS_ANY);
        bits.desi_target[i] = desi;
        bits.bgs_target[i] = bgs;
        bits.mws_target[i] = mws;
    }

    let selected = bits.desi_target.iter().filter(|&&d| d != 0).count();
    log::debug!(
        "Selection cuts ({}) flagged {} of {} objects",
        options
            .tcnames
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(","),
        selected,
        n
    );
    Ok(bits)
}
