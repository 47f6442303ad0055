//! CART regression tree.
//!
//! Splits minimize the summed squared error of the two children. Nodes are
//! stored in a flat vector; the root is node 0.

use ndarray::{ArrayView1, ArrayView2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ports::{check_training_data, LearnError, Learner, Regressor};

/// Tree hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// Every child must keep at least this many samples
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` examines all of them
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Grow a tree on the rows listed in `indices`.
    ///
    /// Rows may repeat (bootstrap samples). `rng` drives feature subsampling.
    pub(crate) fn grow(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        indices: Vec<usize>,
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        if indices.is_empty() {
            tree.nodes.push(Node::Leaf { value: 0.0 });
        } else {
            tree.build(x, y, indices, 0, params, rng);
        }
        tree
    }

    fn build(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        indices: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let n = indices.len() as f64;
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n;
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let pure = indices.iter().all(|&i| (y[i] - y[indices[0]]).abs() < 1e-12);
        if depth >= params.max_depth || indices.len() < params.min_samples_split.max(2) || pure {
            return node_id;
        }

        let Some(split) = best_split(x, y, &indices, params, rng) else {
            return node_id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, split.feature]] <= split.threshold);

        let left = self.build(x, y, left_idx, depth + 1, params, rng);
        let right = self.build(x, y, right_idx, depth + 1, params, rng);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    /// Number of nodes (splits and leaves).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Feature the root node splits on; `None` when the tree is a single leaf.
    #[must_use]
    pub fn root_feature(&self) -> Option<usize> {
        match self.nodes.first() {
            Some(Node::Split { feature, .. }) => Some(*feature),
            _ => None,
        }
    }

    /// Depth of the deepest leaf.
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

fn best_split(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    indices: &[usize],
    params: &TreeParams,
    rng: &mut ChaCha8Rng,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let min_leaf = params.min_samples_leaf.max(1);

    let mut features: Vec<usize> = (0..x.ncols()).collect();
    if let Some(k) = params.max_features {
        features.shuffle(rng);
        features.truncate(k.clamp(1, x.ncols()));
    }

    let total: f64 = indices.iter().map(|&i| y[i]).sum();
    // Between-group sum of squares of the unsplit node; a split must beat it.
    let parent_score = total * total / n as f64;
    let mut best: Option<SplitCandidate> = None;
    let mut order = indices.to_vec();

    for &f in &features {
        order.sort_by(|&a, &b| x[[a, f]].total_cmp(&x[[b, f]]));

        let mut left_sum = 0.0;
        for pos in 0..n - 1 {
            left_sum += y[order[pos]];
            let left_n = pos + 1;
            let right_n = n - left_n;

            let here = x[[order[pos], f]];
            let next = x[[order[pos + 1], f]];
            if here == next || left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;
            let improves = score > parent_score + 1e-9;
            let better = best.as_ref().map_or(true, |b| score > b.score + 1e-12);
            if improves && better {
                best = Some(SplitCandidate {
                    feature: f,
                    threshold: here + (next - here) / 2.0,
                    score,
                });
            }
        }
    }

    best
}

impl Regressor for RegressionTree {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

impl Learner for TreeParams {
    type Model = RegressionTree;

    fn name(&self) -> &'static str {
        "decision_tree"
    }

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        seed: u64,
    ) -> Result<Self::Model, LearnError> {
        check_training_data(x, y)?;
        if self.max_depth == 0 {
            return Err(LearnError::InvalidParameter("max_depth must be positive".into()));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Ok(RegressionTree::grow(x, y, (0..x.nrows()).collect(), self, &mut rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn test_step_function_is_learned_exactly() {
        let x = Array2::from_shape_fn((20, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(20, |i| if i < 10 { 1.0 } else { 5.0 });

        let tree = TreeParams::default().fit(x.view(), y.view(), 0).expect("fit");
        assert_eq!(tree.depth(), 1);
        assert!((tree.predict_row(array![3.0].view()) - 1.0).abs() < 1e-12);
        assert!((tree.predict_row(array![15.0].view()) - 5.0).abs() < 1e-12);
        // threshold sits halfway between 9 and 10
        assert!((tree.predict_row(array![9.4].view()) - 1.0).abs() < 1e-12);
        assert!((tree.predict_row(array![9.6].view()) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_depth_limit() {
        let x = Array2::from_shape_fn((64, 2), |(i, j)| (i * (j + 1)) as f64);
        let y = Array1::from_shape_fn(64, |i| (i as f64).sin());
        let params = TreeParams {
            max_depth: 3,
            ..TreeParams::default()
        };

        let tree = params.fit(x.view(), y.view(), 0).expect("fit");
        assert!(tree.depth() <= 3);
        assert!(tree.node_count() <= 15);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
        let mut y = Array1::zeros(10);
        y[9] = 100.0;
        let params = TreeParams {
            min_samples_leaf: 3,
            ..TreeParams::default()
        };

        let tree = params.fit(x.view(), y.view(), 0).expect("fit");
        // The outlier cannot be isolated in a leaf of its own.
        assert!(tree.predict_row(array![9.0].view()) < 100.0);
    }

    #[test]
    fn test_max_features_limits_split_candidates() {
        let x = Array2::from_shape_fn((60, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 7) as f64 });
        let y = x.column(0).mapv(|v| 3.0 * v + 1.0);
        let stump = |max_features| TreeParams {
            max_depth: 1,
            max_features,
            ..TreeParams::default()
        };

        // With every feature available the informative one always wins.
        for seed in 0..8 {
            let tree = stump(None).fit(x.view(), y.view(), seed).expect("fit");
            assert_eq!(tree.root_feature(), Some(0));
        }

        // One candidate per split: the noise column is sometimes the only option.
        let roots: Vec<Option<usize>> = (0..32)
            .map(|seed| stump(Some(1)).fit(x.view(), y.view(), seed).expect("fit").root_feature())
            .collect();
        assert!(roots.contains(&Some(0)));
        assert!(roots.contains(&Some(1)));

        let a = stump(Some(1)).fit(x.view(), y.view(), 5).expect("fit");
        let b = stump(Some(1)).fit(x.view(), y.view(), 5).expect("fit");
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x = Array2::from_shape_fn((5, 3), |(i, j)| (i + j) as f64);
        let y = Array1::from_elem(5, 4.2);
        let tree = TreeParams::default().fit(x.view(), y.view(), 0).expect("fit");
        assert_eq!(tree.node_count(), 1);
    }
}
