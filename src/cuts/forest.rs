use std::path::Path;

use serde::Deserialize;

use super::qso::NFEATURES;
use super::CutsError;

/// DR3 forest file name
pub const DR3_FOREST: &str = "rf_model_dr3.json";
/// DR5 forest file name
pub const DR5_FOREST: &str = "rf_model_dr5.json";
/// DR5 high-redshift forest file name
pub const DR5_HIGHZ_FOREST: &str = "rf_model_dr5_HighZ.json";

/// One binary decision tree in flattened node arrays
///
/// Node `i` is a leaf when `left[i] < 0`; otherwise a sample goes left when
/// `x[feature[i]] <= threshold[i]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionTree {
    /// Feature tested at each node
    pub feature: Vec<i64>,
    /// Split threshold at each node
    pub threshold: Vec<f64>,
    /// Left child of each node, negative for leaves
    pub left: Vec<i64>,
    /// Right child of each node, negative for leaves
    pub right: Vec<i64>,
    /// Leaf probability of each node
    pub value: Vec<f64>,
}

impl DecisionTree {
    fn validate(&self) -> Result<(), String> {
        let n = self.feature.len();
        if n == 0 {
            return Err("empty tree".to_string());
        }
        if [self.threshold.len(), self.left.len(), self.right.len(), self.value.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err("node arrays differ in length".to_string());
        }
        for i in 0..n {
            if self.left[i] < 0 {
                continue;
            }
            let children_ok = (self.left[i] as usize) < n
                && self.right[i] >= 0
                && (self.right[i] as usize) < n;
            let feature_ok = self.feature[i] >= 0 && (self.feature[i] as usize) < NFEATURES;
            if !children_ok || !feature_ok {
                return Err(format!("node {} points outside the tree", i));
            }
        }
        Ok(())
    }

    /// Leaf value reached by `x`
    pub fn predict(&self, x: &[f64; NFEATURES]) -> f64 {
        let mut node = 0usize;
        // a well-formed tree never visits more nodes than it has
        for _ in 0..self.feature.len() {
            if self.left[node] < 0 {
                return self.value[node];
            }
            node = if x[self.feature[node] as usize] <= self.threshold[node] {
                self.left[node] as usize
            } else {
                self.right[node] as usize
            };
        }
        self.value[node]
    }
}

/// An ensemble of decision trees scored by the mean leaf value
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RandomForest {
    /// Member trees
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Parse a forest from its JSON form `{"trees": [...]}`
    pub fn from_json_str(name: &'static str, json: &str) -> Result<Self, CutsError> {
        let forest: RandomForest = serde_json::from_str(json).map_err(|e| CutsError::InvalidForest {
            name,
            reason: e.to_string(),
        })?;
        if forest.trees.is_empty() {
            return Err(CutsError::InvalidForest {
                name,
                reason: "no trees".to_string(),
            });
        }
        for tree in &forest.trees {
            tree.validate()
                .map_err(|reason| CutsError::InvalidForest { name, reason })?;
        }
        Ok(forest)
    }

    /// Mean leaf value over all trees
    pub fn predict_proba(&self, x: &[f64; NFEATURES]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        total / self.trees.len() as f64
    }
}

/// The three QSO forests, any of which may be absent
#[derive(Debug, Clone, Default)]
pub struct QsoForests {
    dr3: Option<RandomForest>,
    dr5: Option<RandomForest>,
    dr5_highz: Option<RandomForest>,
}

impl QsoForests {
    /// Load every forest present in `dir`
    pub fn from_dir(dir: &Path) -> Result<Self, CutsError> {
        let load = |name: &'static str| -> Result<Option<RandomForest>, CutsError> {
            let path = dir.join(name);
            if !path.exists() {
                log::debug!("No random forest {} in {}", name, dir.display());
                return Ok(None);
            }
            let json = std::fs::read_to_string(&path).map_err(|e| CutsError::InvalidForest {
                name,
                reason: e.to_string(),
            })?;
            log::info!("Read random forest {}", path.display());
            RandomForest::from_json_str(name, &json).map(Some)
        };
        Ok(Self {
            dr3: load(DR3_FOREST)?,
            dr5: load(DR5_FOREST)?,
            dr5_highz: load(DR5_HIGHZ_FOREST)?,
        })
    }

    /// Register a forest under one of the known file names
    pub fn insert(&mut self, name: &'static str, forest: RandomForest) -> Result<(), CutsError> {
        match name {
            DR3_FOREST => self.dr3 = Some(forest),
            DR5_FOREST => self.dr5 = Some(forest),
            DR5_HIGHZ_FOREST => self.dr5_highz = Some(forest),
            _ => {
                return Err(CutsError::InvalidForest {
                    name,
                    reason: "unknown forest name".to_string(),
                })
            }
        }
        Ok(())
    }

    /// Forest by file name, or [`CutsError::MissingForest`]
    pub fn get(&self, name: &'static str) -> Result<&RandomForest, CutsError> {
        let slot = match name {
            DR3_FOREST => self.dr3.as_ref(),
            DR5_FOREST => self.dr5.as_ref(),
            DR5_HIGHZ_FOREST => self.dr5_highz.as_ref(),
            _ => None,
        };
        slot.ok_or(CutsError::MissingForest(name))
    }
}
