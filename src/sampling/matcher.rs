use std::collections::HashMap;

use super::kdtree::KdTree;
use crate::mock::MockError;

/// Nearest-template lookup over one or more KD-trees
///
/// A matcher holds either one tree for every object, a north/south pair, or
/// one tree per spectral subtype (white dwarfs).
#[derive(Debug, Clone, Default)]
pub struct TemplateMatcher {
    all: Option<KdTree>,
    north: Option<KdTree>,
    south: Option<KdTree>,
    subtypes: HashMap<String, KdTree>,
}

impl TemplateMatcher {
    /// One tree for all objects
    pub fn single(tree: KdTree) -> Self {
        Self {
            all: Some(tree),
            ..Self::default()
        }
    }

    /// Separate trees for the two photometric systems
    pub fn north_south(north: KdTree, south: KdTree) -> Self {
        Self {
            north: Some(north),
            south: Some(south),
            ..Self::default()
        }
    }

    /// One tree per spectral subtype, keyed case-insensitively
    pub fn by_subtype(trees: Vec<(String, KdTree)>) -> Self {
        Self {
            subtypes: trees
                .into_iter()
                .map(|(name, tree)| (name.to_uppercase(), tree))
                .collect(),
            ..Self::default()
        }
    }

    fn tree(&self, subtype: &str, south: bool) -> Result<&KdTree, MockError> {
        if !subtype.is_empty() {
            return self
                .subtypes
                .get(&subtype.to_uppercase())
                .ok_or_else(|| MockError::Configuration(format!("unrecognized subtype {}", subtype)));
        }
        let tree = match (&self.all, south) {
            (Some(all), _) => Some(all),
            (None, true) => self.south.as_ref(),
            (None, false) => self.north.as_ref(),
        };
        tree.ok_or_else(|| MockError::violation("template matcher has no tree for this query"))
    }

    /// Nearest template index and distance for each row of `matrix`
    pub fn query_with_distance(
        &self,
        matrix: &[Vec<f64>],
        subtype: &str,
        south: bool,
    ) -> Result<Vec<(usize, f64)>, MockError> {
        let tree = self.tree(subtype, south)?;
        matrix
            .iter()
            .map(|row| {
                tree.nearest(row).ok_or_else(|| {
                    MockError::violation(format!(
                        "template query has {} features, tree has {}",
                        row.len(),
                        tree.dim()
                    ))
                })
            })
            .collect()
    }

    /// Nearest template index for each row of `matrix`
    pub fn query(&self, matrix: &[Vec<f64>], subtype: &str, south: bool) -> Result<Vec<usize>, MockError> {
        Ok(self
            .query_with_distance(matrix, subtype, south)?
            .into_iter()
            .map(|(i, _)| i)
            .collect())
    }
}
