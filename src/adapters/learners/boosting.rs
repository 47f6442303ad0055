//! Gradient boosted regression trees with squared loss.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use crate::ports::{check_training_data, LearnError, Learner, Regressor};

/// Gradient boosting hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_stages: usize,
    /// Shrinkage applied to every stage
    pub learning_rate: f64,
    pub tree: TreeParams,
    /// Fraction of rows drawn (without replacement) per stage
    pub subsample: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_stages: 100,
            learning_rate: 0.1,
            tree: TreeParams {
                max_depth: 3,
                ..TreeParams::default()
            },
            subsample: 1.0,
        }
    }
}

/// A fitted boosted ensemble: `init + learning_rate * Σ tree(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    init: f64,
    learning_rate: f64,
    stages: Vec<RegressionTree>,
}

impl GradientBoosting {
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl Regressor for GradientBoosting {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.init
            + self.learning_rate * self.stages.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }
}

impl Learner for BoostingParams {
    type Model = GradientBoosting;

    fn name(&self) -> &'static str {
        "gradient_boosting"
    }

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        seed: u64,
    ) -> Result<Self::Model, LearnError> {
        check_training_data(x, y)?;
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(LearnError::InvalidParameter(format!(
                "learning_rate {} outside (0, 1]",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(LearnError::InvalidParameter(format!(
                "subsample {} outside (0, 1]",
                self.subsample
            )));
        }

        let n = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let init = y.mean().unwrap_or(0.0);
        let mut current = Array1::from_elem(n, init);
        let mut stages = Vec::with_capacity(self.n_stages);
        let per_stage = ((n as f64 * self.subsample).round() as usize).clamp(1, n);

        for _ in 0..self.n_stages {
            // Negative gradient of squared loss
            let residuals = &y - &current;
            let indices = if per_stage < n {
                let mut drawn = sample(&mut rng, n, per_stage).into_vec();
                drawn.sort_unstable();
                drawn
            } else {
                (0..n).collect()
            };

            let tree = RegressionTree::grow(x, residuals.view(), indices, &self.tree, &mut rng);
            for (i, row) in x.outer_iter().enumerate() {
                current[i] += self.learning_rate * tree.predict_row(row);
            }
            stages.push(tree);
        }

        Ok(GradientBoosting {
            init,
            learning_rate: self.learning_rate,
            stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn quadratic() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((50, 1), |(i, _)| i as f64 / 5.0 - 5.0);
        let y = x.column(0).mapv(|v| v * v);
        (x, y)
    }

    fn mse(model: &GradientBoosting, x: &Array2<f64>, y: &Array1<f64>) -> f64 {
        let pred = model.predict(x.view());
        (&pred - y).mapv(|e| e * e).mean().unwrap_or(f64::NAN)
    }

    #[test]
    fn test_more_stages_reduce_training_error() {
        let (x, y) = quadratic();
        let few = BoostingParams {
            n_stages: 3,
            ..BoostingParams::default()
        }
        .fit(x.view(), y.view(), 1)
        .expect("fit");
        let many = BoostingParams {
            n_stages: 60,
            ..BoostingParams::default()
        }
        .fit(x.view(), y.view(), 1)
        .expect("fit");

        assert_eq!(many.stage_count(), 60);
        assert!(mse(&many, &x, &y) < mse(&few, &x, &y));
    }

    #[test]
    fn test_zero_stages_predicts_mean() {
        let (x, y) = quadratic();
        let model = BoostingParams {
            n_stages: 0,
            ..BoostingParams::default()
        }
        .fit(x.view(), y.view(), 1)
        .expect("fit");
        let mean = y.mean().expect("non-empty");
        assert!((model.predict_row(array![0.0].view()) - mean).abs() < 1e-12);
    }

    #[test]
    fn test_subsampled_fit_is_deterministic() {
        let (x, y) = quadratic();
        let params = BoostingParams {
            n_stages: 20,
            subsample: 0.5,
            ..BoostingParams::default()
        };
        let a = params.fit(x.view(), y.view(), 9).expect("fit");
        let b = params.fit(x.view(), y.view(), 9).expect("fit");
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_learning_rate() {
        let (x, y) = quadratic();
        let params = BoostingParams {
            learning_rate: 0.0,
            ..BoostingParams::default()
        };
        assert!(params.fit(x.view(), y.view(), 1).is_err());
    }
}
