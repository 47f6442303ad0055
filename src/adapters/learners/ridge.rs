//! Ridge regression solved in closed form.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::ports::{check_training_data, LearnError, Learner, Regressor};

const PIVOT_EPS: f64 = 1e-12;

/// Ridge hyperparameters. The intercept is never penalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeParams {
    pub alpha: f64,
}

impl Default for RidgeParams {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

/// A fitted linear model `intercept + coef · x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ridge {
    coef: Array1<f64>,
    intercept: f64,
}

impl Ridge {
    #[must_use]
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coef
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for Ridge {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.intercept + self.coef.dot(&row)
    }
}

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
///
/// # Errors
/// Returns `SingularSystem` when a pivot falls below `1e-12` in magnitude.
pub fn solve_linear(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, LearnError> {
    let n = b.len();
    if a.nrows() != n || a.ncols() != n {
        return Err(LearnError::ShapeMismatch {
            rows: a.nrows(),
            targets: n,
        });
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot_row, col]].abs() < PIVOT_EPS {
            return Err(LearnError::SingularSystem);
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(x)
}

impl Learner for RidgeParams {
    type Model = Ridge;

    fn name(&self) -> &'static str {
        "ridge"
    }

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        _seed: u64,
    ) -> Result<Self::Model, LearnError> {
        check_training_data(x, y)?;
        if self.alpha < 0.0 {
            return Err(LearnError::InvalidParameter(format!(
                "alpha {} must be non-negative",
                self.alpha
            )));
        }

        let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
        let y_mean = y.mean().unwrap_or(0.0);
        let xc = &x - &x_mean;
        let yc = y.mapv(|v| v - y_mean);

        let mut gram = xc.t().dot(&xc);
        for i in 0..gram.nrows() {
            gram[[i, i]] += self.alpha;
        }
        let rhs = xc.t().dot(&yc);
        let coef = solve_linear(gram, rhs)?;
        let intercept = y_mean - x_mean.dot(&coef);

        Ok(Ridge { coef, intercept })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_solve_known_system() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![3.0, 5.0];
        let x = solve_linear(a, b).expect("solvable");
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_solve_needs_pivoting() {
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let b = array![2.0, 3.0];
        let x = solve_linear(a, b).expect("solvable");
        assert_eq!(x, array![3.0, 2.0]);
    }

    #[test]
    fn test_singular_system() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert_eq!(solve_linear(a, b), Err(LearnError::SingularSystem));
    }

    #[test]
    fn test_unpenalized_fit_recovers_plane() {
        let x = Array2::from_shape_fn((30, 2), |(i, j)| ((i * (j + 2)) % 11) as f64);
        let y = Array1::from_iter(x.outer_iter().map(|r| 4.0 + 2.0 * r[0] - 0.5 * r[1]));
        let model = RidgeParams { alpha: 0.0 }.fit(x.view(), y.view(), 0).expect("fit");

        assert!((model.intercept() - 4.0).abs() < 1e-8);
        assert!((model.coefficients()[0] - 2.0).abs() < 1e-8);
        assert!((model.coefficients()[1] + 0.5).abs() < 1e-8);
    }

    #[test]
    fn test_penalty_shrinks_coefficients() {
        let x = Array2::from_shape_fn((20, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| 3.0 * v);
        let loose = RidgeParams { alpha: 0.0 }.fit(x.view(), y.view(), 0).expect("fit");
        let tight = RidgeParams { alpha: 500.0 }.fit(x.view(), y.view(), 0).expect("fit");
        assert!(tight.coefficients()[0].abs() < loose.coefficients()[0].abs());
    }

    #[test]
    fn test_duplicate_columns_without_penalty_are_singular() {
        let x = Array2::from_shape_fn((10, 2), |(i, _)| i as f64);
        let y = x.column(0).to_owned();
        let err = RidgeParams { alpha: 0.0 }.fit(x.view(), y.view(), 0);
        assert_eq!(err, Err(LearnError::SingularSystem));
    }
}
