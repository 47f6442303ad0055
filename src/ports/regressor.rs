//! Regressor port: Traits for fitting and evaluating base models.
//!
//! The ensemble only sees these traits, so base learners can be swapped
//! without touching the combination logic.

use ndarray::{Array1, ArrayView1, ArrayView2};

/// Errors that can occur while fitting a model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LearnError {
    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Shape mismatch: {rows} feature rows but {targets} targets")]
    ShapeMismatch { rows: usize, targets: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Linear system is singular")]
    SingularSystem,

    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),
}

/// A fitted model that maps one feature row to a prediction.
///
/// Fitted models are immutable; prediction never mutates state, so a model can
/// be shared across threads.
pub trait Regressor: Send + Sync {
    /// Predict a single row.
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64;

    /// Predict every row of a matrix.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.outer_iter().map(|row| self.predict_row(row)).collect()
    }
}

/// A learning algorithm with fixed hyperparameters.
pub trait Learner {
    /// Model produced by [`Learner::fit`].
    type Model: Regressor;

    /// Short identifier used in logs and model descriptions.
    fn name(&self) -> &'static str;

    /// Fit a model on `x` (rows = samples) and targets `y`.
    ///
    /// The same `seed`, data and hyperparameters must produce the same model.
    ///
    /// # Errors
    /// Returns `LearnError` if the data is empty, misshapen or degenerate.
    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        seed: u64,
    ) -> Result<Self::Model, LearnError>;
}

/// Validate the common preconditions of every learner.
///
/// # Errors
/// Returns `LearnError` on empty input, mismatched lengths or non-finite values.
pub fn check_training_data(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), LearnError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(LearnError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(LearnError::ShapeMismatch {
            rows: x.nrows(),
            targets: y.len(),
        });
    }
    if !x.iter().all(|v| v.is_finite()) {
        return Err(LearnError::NonFinite("features"));
    }
    if !y.iter().all(|v| v.is_finite()) {
        return Err(LearnError::NonFinite("targets"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    struct Constant(f64);

    impl Regressor for Constant {
        fn predict_row(&self, _row: ArrayView1<'_, f64>) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_default_batch_predict() {
        let x = Array2::<f64>::zeros((3, 2));
        let out = Constant(7.0).predict(x.view());
        assert_eq!(out.to_vec(), vec![7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_check_training_data() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(check_training_data(x.view(), array![1.0, 2.0].view()).is_ok());
        assert_eq!(
            check_training_data(x.view(), array![1.0].view()),
            Err(LearnError::ShapeMismatch { rows: 2, targets: 1 })
        );
        assert_eq!(
            check_training_data(x.view(), array![1.0, f64::NAN].view()),
            Err(LearnError::NonFinite("targets"))
        );
        let empty = Array2::<f64>::zeros((0, 2));
        assert_eq!(
            check_training_data(empty.view(), Array1::<f64>::zeros(0).view()),
            Err(LearnError::EmptyTrainingSet)
        );
    }
}
