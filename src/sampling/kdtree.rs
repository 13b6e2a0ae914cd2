//! KD-tree nearest-neighbour search over template parameters.

/// KD-tree over points of a fixed, runtime-chosen dimension
///
/// Nearest-neighbour queries use Euclidean distance. Among equidistant points
/// the one with the lowest index wins, so results are deterministic.
#[derive(Debug, Clone)]
pub struct KdTree {
    dim: usize,
    points: Vec<f64>,
    nodes: Vec<Node>,
    root: Option<usize>,
}

#[derive(Debug, Clone)]
struct Node {
    index: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

impl KdTree {
    /// Build from row-major points; every row must have `dim` values
    pub fn build(dim: usize, rows: &[Vec<f64>]) -> Option<Self> {
        if dim == 0 || rows.iter().any(|r| r.len() != dim) {
            return None;
        }
        let points: Vec<f64> = rows.iter().flatten().copied().collect();
        let mut tree = Self {
            dim,
            points,
            nodes: Vec::with_capacity(rows.len()),
            root: None,
        };
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        tree.root = tree.build_node(&mut indices, 0);
        Some(tree)
    }

    fn coord(&self, index: usize, axis: usize) -> f64 {
        self.points[index * self.dim + axis]
    }

    fn build_node(&mut self, indices: &mut [usize], depth: usize) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }
        let axis = depth % self.dim;
        indices.sort_by(|&a, &b| {
            self.coord(a, axis)
                .total_cmp(&self.coord(b, axis))
                .then(a.cmp(&b))
        });
        let mid = indices.len() / 2;
        let index = indices[mid];
        let node = self.nodes.len();
        self.nodes.push(Node {
            index,
            axis,
            left: None,
            right: None,
        });
        let (lo, hi) = indices.split_at_mut(mid);
        let left = self.build_node(lo, depth + 1);
        let right = self.build_node(&mut hi[1..], depth + 1);
        self.nodes[node].left = left;
        self.nodes[node].right = right;
        Some(node)
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree holds no points
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Dimension of the points
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn dist2(&self, index: usize, query: &[f64]) -> f64 {
        (0..self.dim)
            .map(|k| {
                let d = self.coord(index, k) - query[k];
                d * d
            })
            .sum()
    }

    fn search(&self, node: Option<usize>, query: &[f64], best: &mut Option<(usize, f64)>) {
        let Some(node) = node else {
            return;
        };
        let n = &self.nodes[node];
        let d2 = self.dist2(n.index, query);
        let better = match *best {
            None => true,
            Some((bi, bd)) => d2 < bd || (d2 == bd && n.index < bi),
        };
        if better {
            *best = Some((n.index, d2));
        }

        let diff = query[n.axis] - self.coord(n.index, n.axis);
        let (near, far) = if diff < 0.0 {
            (n.left, n.right)
        } else {
            (n.right, n.left)
        };
        self.search(near, query, best);
        if let Some((_, bd)) = *best {
            if diff * diff <= bd {
                self.search(far, query, best);
            }
        }
    }

    /// Index and distance of the nearest point, or `None` for an empty tree
    pub fn nearest(&self, query: &[f64]) -> Option<(usize, f64)> {
        if query.len() != self.dim {
            return None;
        }
        let mut best = None;
        self.search(self.root, query, &mut best);
        best.map(|(i, d2)| (i, d2.sqrt()))
    }

    /// Nearest-point indices for many queries
    pub fn query(&self, queries: &[Vec<f64>]) -> Vec<Option<usize>> {
        queries
            .iter()
            .map(|q| self.nearest(q).map(|(i, _)| i))
            .collect()
    }
}
