//! Epsilon-insensitive support vector regression with an RBF kernel.
//!
//! The target is standardized before fitting. The dual is solved by
//! coordinate descent without a bias term; standardization centers the
//! target, so the intercept is the training mean.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ports::{check_training_data, LearnError, Learner, Regressor};

const SUPPORT_EPS: f64 = 1e-10;

/// SVR hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvrParams {
    /// Box constraint on the dual coefficients
    pub c: f64,
    /// Half-width of the insensitive tube, in standardized target units
    pub epsilon: f64,
    /// Kernel width; `None` uses `1 / (n_features * Var(X))`
    pub gamma: Option<f64>,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for SvrParams {
    fn default() -> Self {
        Self {
            c: 100.0,
            epsilon: 0.1,
            gamma: None,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

/// A fitted SVR model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Svr {
    support: Array2<f64>,
    coef: Array1<f64>,
    gamma: f64,
    y_mean: f64,
    y_std: f64,
}

impl Svr {
    #[must_use]
    pub fn support_count(&self) -> usize {
        self.coef.len()
    }
}

fn rbf(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, gamma: f64) -> f64 {
    let sq: f64 = a.iter().zip(b.iter()).map(|(u, v)| (u - v) * (u - v)).sum();
    (-gamma * sq).exp()
}

fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

impl Regressor for Svr {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let z: f64 = self
            .support
            .outer_iter()
            .zip(self.coef.iter())
            .map(|(sv, &b)| b * rbf(sv, row, self.gamma))
            .sum();
        self.y_mean + self.y_std * z
    }
}

impl Learner for SvrParams {
    type Model = Svr;

    fn name(&self) -> &'static str {
        "svr"
    }

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        seed: u64,
    ) -> Result<Self::Model, LearnError> {
        check_training_data(x, y)?;
        if self.c <= 0.0 || self.epsilon < 0.0 {
            return Err(LearnError::InvalidParameter(format!(
                "C={} epsilon={} (need C > 0, epsilon >= 0)",
                self.c, self.epsilon
            )));
        }

        let n = x.nrows();
        let gamma = match self.gamma {
            Some(g) if g > 0.0 => g,
            Some(g) => return Err(LearnError::InvalidParameter(format!("gamma {g} must be positive"))),
            None => {
                let var = x.var(0.0);
                if var > 0.0 {
                    1.0 / (x.ncols() as f64 * var)
                } else {
                    1.0
                }
            }
        };

        let y_mean = y.mean().unwrap_or(0.0);
        let y_std = match y.std(0.0) {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let z = y.mapv(|v| (v - y_mean) / y_std);

        let mut kernel = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let k = rbf(x.row(i), x.row(j), gamma);
                kernel[[i, j]] = k;
                kernel[[j, i]] = k;
            }
        }

        let mut beta = Array1::<f64>::zeros(n);
        // f = K beta, kept in sync with every coordinate update
        let mut f = Array1::<f64>::zeros(n);
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut passes = 0;

        for _ in 0..self.max_iter {
            passes += 1;
            order.shuffle(&mut rng);
            let mut max_step = 0.0_f64;
            for &i in &order {
                let kii = kernel[[i, i]];
                if kii <= 0.0 {
                    continue;
                }
                let old = beta[i];
                let r = z[i] - (f[i] - kii * old);
                let new = (soft_threshold(r, self.epsilon) / kii).clamp(-self.c, self.c);
                let step = new - old;
                if step != 0.0 {
                    beta[i] = new;
                    f.scaled_add(step, &kernel.column(i));
                    max_step = max_step.max(step.abs());
                }
            }
            if max_step < self.tol {
                break;
            }
        }

        if beta.iter().any(|b| !b.is_finite()) {
            return Err(LearnError::NonFinite("svr dual coefficients"));
        }

        let keep: Vec<usize> = (0..n).filter(|&i| beta[i].abs() > SUPPORT_EPS).collect();
        let support = x.select(Axis(0), &keep);
        let coef = Array1::from_iter(keep.iter().map(|&i| beta[i]));
        tracing::debug!(
            "SVR converged after {} passes with {} support vectors",
            passes,
            keep.len()
        );

        Ok(Svr {
            support,
            coef,
            gamma,
            y_mean,
            y_std,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fits_smooth_curve() {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64 / 10.0);
        let y = x.column(0).mapv(|v| (v * 1.5).sin() * 10.0 + 50.0);

        let model = SvrParams::default().fit(x.view(), y.view(), 3).expect("fit");
        let pred = model.predict(x.view());
        let max_err = (&pred - &y).mapv(f64::abs).fold(0.0_f64, |a, &b| a.max(b));
        // tube is 0.1 std wide; allow a few of those
        assert!(max_err < 3.0, "max error {max_err}");
    }

    #[test]
    fn test_constant_target_has_no_support() {
        let x = Array2::from_shape_fn((8, 2), |(i, j)| (i + j) as f64);
        let y = Array1::from_elem(8, 7.0);
        let model = SvrParams::default().fit(x.view(), y.view(), 0).expect("fit");
        assert_eq!(model.support_count(), 0);
        assert!((model.predict_row(array![1.0, 2.0].view()) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_far_points_revert_to_mean() {
        let x = Array2::from_shape_fn((20, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| 2.0 * v);
        let model = SvrParams::default().fit(x.view(), y.view(), 0).expect("fit");
        let far = model.predict_row(array![1.0e6].view());
        assert!((far - 19.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let x = Array2::from_shape_fn((4, 1), |(i, _)| i as f64);
        let y = x.column(0).to_owned();
        let params = SvrParams {
            c: 0.0,
            ..SvrParams::default()
        };
        assert!(params.fit(x.view(), y.view(), 0).is_err());
        let params = SvrParams {
            gamma: Some(-1.0),
            ..SvrParams::default()
        };
        assert!(params.fit(x.view(), y.view(), 0).is_err());
    }
}
