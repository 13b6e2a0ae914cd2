use std::fs;
use std::path::Path;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::Deserialize;

use crate::mock::MockError;

#[derive(Debug, Deserialize)]
struct GmmFile {
    #[serde(default)]
    columns: Vec<String>,
    weights: Vec<f64>,
    means: Vec<Vec<f64>>,
    covars: Vec<Vec<Vec<f64>>>,
}

/// Gaussian mixture with full covariances
#[derive(Debug, Clone)]
pub struct GaussianMixture {
    columns: Vec<String>,
    weights: Vec<f64>,
    means: Vec<Vec<f64>>,
    /// Lower-triangular Cholesky factor of each covariance
    chol: Vec<Vec<Vec<f64>>>,
}

/// Lower-triangular Cholesky factor of a symmetric positive-definite matrix
pub fn cholesky(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        if matrix[i].len() != n {
            return None;
        }
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let d = matrix[i][i] - sum;
                if d <= 0.0 || !d.is_finite() {
                    return None;
                }
                l[i][j] = d.sqrt();
            } else {
                l[i][j] = (matrix[i][j] - sum) / l[j][j];
            }
        }
    }
    Some(l)
}

impl GaussianMixture {
    /// Build from component weights, means and covariances
    pub fn new(
        columns: Vec<String>,
        weights: Vec<f64>,
        means: Vec<Vec<f64>>,
        covars: Vec<Vec<Vec<f64>>>,
    ) -> Result<Self, MockError> {
        let ncomp = weights.len();
        if ncomp == 0 || means.len() != ncomp || covars.len() != ncomp {
            return Err(MockError::violation(format!(
                "mixture has {} weights, {} means and {} covariances",
                ncomp,
                means.len(),
                covars.len()
            )));
        }
        let ndim = means[0].len();
        if !columns.is_empty() && columns.len() != ndim {
            return Err(MockError::violation(format!(
                "mixture has {} column names for {} dimensions",
                columns.len(),
                ndim
            )));
        }
        let mut chol = Vec::with_capacity(ncomp);
        for (k, cov) in covars.iter().enumerate() {
            if means[k].len() != ndim || cov.len() != ndim {
                return Err(MockError::violation(format!(
                    "mixture component {} is not {}-dimensional",
                    k, ndim
                )));
            }
            let factor = cholesky(cov).ok_or_else(|| {
                MockError::violation(format!("covariance of component {} is not positive definite", k))
            })?;
            chol.push(factor);
        }
        Ok(Self {
            columns,
            weights,
            means,
            chol,
        })
    }

    /// Load `{columns, weights, means, covars}` from JSON
    pub fn from_json(path: &Path) -> Result<Self, MockError> {
        if !path.exists() {
            return Err(MockError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let file: GmmFile = serde_json::from_str(&content)?;
        Self::new(file.columns, file.weights, file.means, file.covars)
    }

    /// Names of the modelled quantities (may be empty)
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Dimensionality of one draw
    pub fn ndim(&self) -> usize {
        self.means[0].len()
    }

    /// Position of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Draw `n` samples, one row per sample
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<Vec<f64>>, MockError> {
        let chooser = WeightedIndex::new(&self.weights)
            .map_err(|e| MockError::violation(format!("bad mixture weights: {}", e)))?;
        let ndim = self.ndim();
        let mut out = Vec::with_capacity(n);
        let mut z = vec![0.0; ndim];
        for _ in 0..n {
            let k = chooser.sample(rng);
            for v in z.iter_mut() {
                *v = rng.sample(StandardNormal);
            }
            let l = &self.chol[k];
            let row: Vec<f64> = (0..ndim)
                .map(|i| self.means[k][i] + (0..=i).map(|j| l[i][j] * z[j]).sum::<f64>())
                .collect();
            out.push(row);
        }
        Ok(out)
    }
}
