//! Random forest: bootstrap-aggregated regression trees.

use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use crate::ports::{check_training_data, LearnError, Learner, Regressor};

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub tree: TreeParams,
    /// Draw a bootstrap sample per tree; otherwise every tree sees all rows
    pub bootstrap: bool,
    /// Share of features examined per split, in (0, 1]. Ignored when
    /// `tree.max_features` is set explicitly.
    pub feature_fraction: f64,
}

impl ForestParams {
    /// Tree parameters with the per-split feature count resolved for `n_features`.
    fn tree_params(&self, n_features: usize) -> TreeParams {
        let mut tree = self.tree.clone();
        if tree.max_features.is_none() && self.feature_fraction < 1.0 {
            let k = (n_features as f64 * self.feature_fraction).ceil() as usize;
            tree.max_features = Some(k.clamp(1, n_features.max(1)));
        }
        tree
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeParams {
                max_depth: 10,
                ..TreeParams::default()
            },
            bootstrap: true,
            feature_fraction: 1.0 / 3.0,
        }
    }
}

/// A fitted random forest; predicts the mean of its trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }
}

impl Learner for ForestParams {
    type Model = RandomForest;

    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        seed: u64,
    ) -> Result<Self::Model, LearnError> {
        check_training_data(x, y)?;
        if self.n_trees == 0 {
            return Err(LearnError::InvalidParameter("n_trees must be positive".into()));
        }
        if !(self.feature_fraction > 0.0 && self.feature_fraction <= 1.0) {
            return Err(LearnError::InvalidParameter(format!(
                "feature_fraction {} must be in (0, 1]",
                self.feature_fraction
            )));
        }
        let tree_params = self.tree_params(x.ncols());

        let n = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let trees = (0..self.n_trees)
            .map(|_| {
                let indices: Vec<usize> = if self.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::grow(x, y, indices, &tree_params, &mut rng)
            })
            .collect();

        tracing::debug!(
            "Fitted random forest with {} trees, {:?} features per split",
            self.n_trees,
            tree_params.max_features
        );
        Ok(RandomForest { trees })
    }
}
