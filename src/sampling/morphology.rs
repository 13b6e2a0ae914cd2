use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::gmm::GaussianMixture;
use super::registry::GmmTarget;
use crate::mock::MockError;
use crate::table::Table;
use crate::wave::interp;

/// Morphological types in the order the models are searched for
pub const MORPHOLOGIES: [&str; 5] = ["PSF", "REX", "EXP", "DEV", "COMP"];

/// Half-width of the magnitude window used when matching prior magnitudes
pub const PRIOR_MAG_TOLERANCE: f64 = 0.3;

/// Float32 outputs of [`MorphologyModel::sample`]
pub const MORPHOLOGY_COLUMNS: [&str; 17] = [
    "MAG",
    "FRACDEV",
    "FRACDEV_IVAR",
    "SHAPEDEV_R",
    "SHAPEDEV_R_IVAR",
    "SHAPEDEV_E1",
    "SHAPEDEV_E1_IVAR",
    "SHAPEDEV_E2",
    "SHAPEDEV_E2_IVAR",
    "SHAPEEXP_R",
    "SHAPEEXP_R_IVAR",
    "SHAPEEXP_E1",
    "SHAPEEXP_E1_IVAR",
    "SHAPEEXP_E2",
    "SHAPEEXP_E2_IVAR",
    "GR",
    "RZ",
];

#[derive(Debug, Clone)]
struct MorphComponent {
    morph: String,
    fraction: Vec<f64>,
    gmm: GaussianMixture,
}

/// Magnitude-dependent morphology fractions plus one GMM per morphology
#[derive(Debug, Clone)]
pub struct MorphologyModel {
    target: GmmTarget,
    magbins: Vec<f64>,
    components: Vec<MorphComponent>,
}

/// Split `n` objects across classes in proportion to `weights`
///
/// Counts are rounded and the residual is absorbed by the largest class, so
/// the result always sums to `n`.
pub fn allocate_counts(weights: &[f64], n: usize) -> Vec<usize> {
    if weights.is_empty() {
        return Vec::new();
    }
    let total: f64 = weights.iter().filter(|w| w.is_finite()).sum();
    let mut counts: Vec<i64> = weights
        .iter()
        .map(|&w| {
            if total > 0.0 && w.is_finite() && w > 0.0 {
                (w / total * n as f64).round() as i64
            } else {
                0
            }
        })
        .collect();

    let mut dn = counts.iter().sum::<i64>() - n as i64;
    while dn != 0 {
        let imax = argmax(&counts);
        if dn > 0 {
            let take = dn.min(counts[imax]);
            counts[imax] -= take;
            dn -= take;
        } else {
            counts[imax] -= dn;
            dn = 0;
        }
    }
    counts.into_iter().map(|c| c as usize).collect()
}

fn argmax(values: &[i64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Draw `k` distinct indices with probability proportional to `weights`
///
/// Equivalent to sequential draws without replacement. Once every positive
/// weight is used up the remaining picks are uniform over what is left.
pub fn choose_without_replacement<R: Rng + ?Sized>(
    weights: &[f64],
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut keys: Vec<(f64, f64, usize)> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let u: f64 = rng.gen();
            let tie: f64 = rng.gen();
            let key = if w > 0.0 && w.is_finite() {
                u.ln() / w
            } else {
                f64::NEG_INFINITY
            };
            (key, tie, i)
        })
        .collect();
    keys.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.total_cmp(&a.1)));
    keys.into_iter().take(k).map(|(_, _, i)| i).collect()
}

impl MorphologyModel {
    /// Assemble a model from magnitude bins and `(morphology, fraction, gmm)` triples
    pub fn new(
        target: GmmTarget,
        magbins: Vec<f64>,
        components: Vec<(String, Vec<f64>, GaussianMixture)>,
    ) -> Result<Self, MockError> {
        if magbins.is_empty() || components.is_empty() {
            return Err(MockError::violation(format!(
                "{} morphology model needs magnitude bins and at least one component",
                target.name()
            )));
        }
        let mut parts = Vec::with_capacity(components.len());
        for (morph, fraction, gmm) in components {
            if fraction.len() != magbins.len() {
                return Err(MockError::violation(format!(
                    "{} fractions for {} have {} bins, expected {}",
                    target.name(),
                    morph,
                    fraction.len(),
                    magbins.len()
                )));
            }
            let has_mag = gmm.column_index("z").is_some() || gmm.column_index("r").is_some();
            if !has_mag || gmm.column_index("gr").is_none() || gmm.column_index("rz").is_none() {
                return Err(MockError::violation(format!(
                    "{} {} mixture must model a magnitude, gr and rz",
                    target.name(),
                    morph
                )));
            }
            parts.push(MorphComponent {
                morph: morph.to_uppercase(),
                fraction,
                gmm,
            });
        }
        Ok(Self {
            target,
            magbins,
            components: parts,
        })
    }

    /// Load `fractype_{target}.csv` and every `gmm_{target}_{morph}.json` present in `dir`
    pub fn load(dir: &Path, target: GmmTarget) -> Result<Self, MockError> {
        let tag = target.name().to_lowercase();
        let fracfile = dir.join(format!("fractype_{}.csv", tag));
        if !fracfile.exists() {
            return Err(MockError::NotFound(fracfile));
        }
        let fractions = read_fraction_table(&fracfile)?;
        let magbins = fractions
            .get("MAG")
            .cloned()
            .ok_or_else(|| MockError::violation(format!("{} has no MAG column", fracfile.display())))?;

        let mut components = Vec::new();
        for morph in MORPHOLOGIES {
            let gmmfile = dir.join(format!("gmm_{}_{}.json", tag, morph.to_lowercase()));
            if !gmmfile.exists() {
                continue;
            }
            let fraction = fractions.get(morph).cloned().ok_or_else(|| {
                MockError::violation(format!("{} has no {} column", fracfile.display(), morph))
            })?;
            components.push((morph.to_string(), fraction, GaussianMixture::from_json(&gmmfile)?));
        }
        log::info!(
            "Loaded {} morphology models for {} from {}",
            components.len(),
            target.name(),
            dir.display()
        );
        Self::new(target, magbins, components)
    }

    /// Target class the model describes
    pub fn target(&self) -> GmmTarget {
        self.target
    }

    /// Morphologies with a model, in allocation order
    pub fn morphologies(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.morph.as_str()).collect()
    }

    /// Number of objects of each morphology for a sample of `n`
    pub fn allocate(&self, n: usize) -> Vec<usize> {
        let norms: Vec<f64> = self
            .components
            .iter()
            .map(|c| c.fraction.iter().sum())
            .collect();
        allocate_counts(&norms, n)
    }

    /// Normalisation filter for one object
    pub fn magfilter(&self, south: bool) -> &'static str {
        match (self.target, south) {
            (GmmTarget::Lrg, true) => "decam2014-z",
            (GmmTarget::Lrg, false) => "MzLS-z",
            (_, true) => "decam2014-r",
            (_, false) => "BASS-r",
        }
    }

    /// Draw morphology, shape and colours for `n` objects
    ///
    /// Rows are grouped by morphology. When `prior_mag` is given each row is
    /// replaced by a random draw within [`PRIOR_MAG_TOLERANCE`] of the prior
    /// magnitude, or by the closest draw when none is that close.
    pub fn sample(
        &self,
        n: usize,
        south: &[bool],
        seed: u64,
        prior_mag: Option<&[f64]>,
    ) -> Result<Table, MockError> {
        if south.len() != n {
            return Err(MockError::violation(format!(
                "sample: {} south flags for {} objects",
                south.len(),
                n
            )));
        }
        if let Some(prior) = prior_mag {
            if prior.len() != n {
                return Err(MockError::violation(format!(
                    "sample: {} prior magnitudes for {} objects",
                    prior.len(),
                    n
                )));
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut out: HashMap<&'static str, Vec<f64>> = MORPHOLOGY_COLUMNS
            .iter()
            .map(|&name| (name, vec![0.0; n]))
            .collect();
        let mut types = vec![String::new(); n];

        let counts = self.allocate(n);
        let mut offset = 0;
        for (component, &count) in self.components.iter().zip(counts.iter()) {
            if count == 0 {
                continue;
            }
            let gmm = &component.gmm;
            let draws = gmm.sample(n, &mut rng)?;
            let prob: Vec<f64> = draws
                .iter()
                .map(|row| interp(row[0], &self.magbins, &component.fraction))
                .collect();
            let these = choose_without_replacement(&prob, count, &mut rng);

            let magcol = gmm.column_index("z").or_else(|| gmm.column_index("r"));
            let grcol = gmm.column_index("gr");
            let rzcol = gmm.column_index("rz");
            let (Some(magcol), Some(grcol), Some(rzcol)) = (magcol, grcol, rzcol) else {
                return Err(MockError::violation("mixture is missing magnitude or colours"));
            };

            let shapes = shape_columns(&component.morph, gmm);
            let fracdev = match component.morph.as_str() {
                "DEV" => Some(1.0),
                "EXP" => Some(0.0),
                _ => None,
            };

            for (k, &src) in these.iter().enumerate() {
                let row = &draws[src];
                let dst = offset + k;
                set(&mut out, "MAG", dst, row[magcol]);
                set(&mut out, "GR", dst, row[grcol]);
                set(&mut out, "RZ", dst, row[rzcol]);
                for shape in &shapes {
                    let mut val = row[shape.value];
                    if shape.log10 {
                        val = 10f64.powf(val);
                    }
                    set(&mut out, shape.column, dst, val);
                    if let Some(snr) = shape.snr {
                        set(&mut out, shape.ivar_column, dst, (10f64.powf(row[snr]) / val).powi(2));
                    }
                }
                if let Some(value) = fracdev {
                    set(&mut out, "FRACDEV", dst, value);
                }
                types[dst] = component.morph.clone();
            }
            offset += count;
        }

        if let Some(fracdev) = out.get_mut("FRACDEV") {
            for v in fracdev.iter_mut() {
                *v = v.clamp(0.0, 1.0);
            }
        }

        let mut table = Table::with_rows(n);
        for name in MORPHOLOGY_COLUMNS {
            let values: Vec<f32> = out
                .remove(name)
                .unwrap_or_else(|| vec![0.0; n])
                .into_iter()
                .map(|v| v as f32)
                .collect();
            table.push(name, values)?;
        }
        table.push("TYPE", types)?;

        if let Some(prior) = prior_mag {
            let mags = table.numeric("MAG")?;
            let order = match_prior_magnitudes(prior, &mags, &mut rng);
            table = table.gather(&order);
        }

        let magfilter: Vec<String> = south
            .iter()
            .map(|&s| self.magfilter(s).to_string())
            .collect();
        table.push("MAGFILTER", magfilter)?;
        Ok(table)
    }
}

fn set(out: &mut HashMap<&'static str, Vec<f64>>, name: &str, row: usize, value: f64) {
    if let Some(column) = out.get_mut(name) {
        column[row] = value;
    }
}

struct ShapeColumn {
    column: &'static str,
    ivar_column: &'static str,
    value: usize,
    snr: Option<usize>,
    log10: bool,
}

fn shape_columns(morph: &str, gmm: &GaussianMixture) -> Vec<ShapeColumn> {
    let family = match morph {
        "DEV" => "DEV",
        "EXP" | "REX" => "EXP",
        _ => return Vec::new(),
    };
    let mut shapes = Vec::new();
    for (param, suffix) in [("reff", "R"), ("e1", "E1"), ("e2", "E2")] {
        let sampcol = format!("{}_{}", param, morph.to_lowercase());
        let Some(value) = gmm.column_index(&sampcol) else {
            continue;
        };
        let column = output_shape_column(family, suffix);
        let ivar_column = output_shape_column(family, &format!("{}_IVAR", suffix));
        if let (Some(column), Some(ivar_column)) = (column, ivar_column) {
            shapes.push(ShapeColumn {
                column,
                ivar_column,
                value,
                snr: gmm.column_index(&format!("snr_{}", sampcol)),
                log10: param == "reff",
            });
        }
    }
    shapes
}

fn output_shape_column(family: &str, suffix: &str) -> Option<&'static str> {
    let name = format!("SHAPE{}_{}", family, suffix);
    MORPHOLOGY_COLUMNS.iter().copied().find(|c| *c == name)
}

/// For each prior magnitude pick a sampled row close in magnitude
///
/// A uniformly random row within [`PRIOR_MAG_TOLERANCE`] (exclusive) is
/// chosen; when there is none, the nearest row. Rows may be reused.
pub fn match_prior_magnitudes<R: Rng + ?Sized>(prior: &[f64], mags: &[f64], rng: &mut R) -> Vec<usize> {
    let mut sorted: Vec<usize> = (0..mags.len()).collect();
    sorted.sort_by(|&a, &b| mags[a].total_cmp(&mags[b]).then(a.cmp(&b)));
    let values: Vec<f64> = sorted.iter().map(|&i| mags[i]).collect();

    prior
        .iter()
        .map(|&mg| {
            if values.is_empty() {
                return 0;
            }
            let lo = values.partition_point(|&v| v <= mg - PRIOR_MAG_TOLERANCE);
            let hi = values.partition_point(|&v| v < mg + PRIOR_MAG_TOLERANCE);
            if hi > lo {
                return sorted[rng.gen_range(lo..hi)];
            }
            let pos = values.partition_point(|&v| v < mg);
            let below = pos.checked_sub(1);
            let above = (pos < values.len()).then_some(pos);
            let nearest = match (below, above) {
                (Some(b), Some(a)) => {
                    if (mg - values[b]).abs() <= (values[a] - mg).abs() {
                        b
                    } else {
                        a
                    }
                }
                (Some(b), None) => b,
                (None, Some(a)) => a,
                (None, None) => 0,
            };
            sorted[nearest]
        })
        .collect()
}

/// Parse a morphology fraction table: header row, then one numeric row per magnitude bin
fn read_fraction_table(path: &Path) -> Result<HashMap<String, Vec<f64>>, MockError> {
    let file = File::open(path)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.to_uppercase())
        .collect();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for record in csv_reader.records() {
        let record = record?;
        for (i, value) in record.iter().enumerate().take(headers.len()) {
            let parsed = value.parse::<f64>().map_err(|_| {
                MockError::violation(format!(
                    "{}: non-numeric value '{}' in column {}",
                    path.display(),
                    value,
                    headers[i]
                ))
            })?;
            columns[i].push(parsed);
        }
    }
    Ok(headers.into_iter().zip(columns).collect())
}
