//! Ensemble of heterogeneous base regressors.
//!
//! Base learners are fit independently; their predictions are merged by an
//! explicit [`Combiner`]. With [`EnsembleStrategy::Stacked`] the combiner is a
//! ridge regression fit on K-fold out-of-fold predictions, after which every
//! base learner is refit on all rows.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::adapters::learners::{
    BoostingParams, ForestParams, GradientBoosting, Mlp, MlpParams, RandomForest,
    RegressionTree, RidgeParams, Svr, SvrParams, TreeParams,
};
use crate::ports::{LearnError, Learner, Regressor};

/// A base learning algorithm with its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaseLearner {
    DecisionTree(TreeParams),
    RandomForest(ForestParams),
    GradientBoosting(BoostingParams),
    Svr(SvrParams),
    Mlp(MlpParams),
}

impl BaseLearner {
    /// Random forest, gradient boosting, MLP and SVR with default settings.
    #[must_use]
    pub fn default_set() -> Vec<Self> {
        vec![
            Self::RandomForest(ForestParams::default()),
            Self::GradientBoosting(BoostingParams::default()),
            Self::Mlp(MlpParams::default()),
            Self::Svr(SvrParams::default()),
        ]
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DecisionTree(p) => p.name(),
            Self::RandomForest(p) => p.name(),
            Self::GradientBoosting(p) => p.name(),
            Self::Svr(p) => p.name(),
            Self::Mlp(p) => p.name(),
        }
    }

    /// Fit the wrapped learner.
    ///
    /// # Errors
    /// Propagates the learner's `LearnError`.
    pub fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        seed: u64,
    ) -> Result<BaseModel, LearnError> {
        Ok(match self {
            Self::DecisionTree(p) => BaseModel::DecisionTree(p.fit(x, y, seed)?),
            Self::RandomForest(p) => BaseModel::RandomForest(p.fit(x, y, seed)?),
            Self::GradientBoosting(p) => BaseModel::GradientBoosting(p.fit(x, y, seed)?),
            Self::Svr(p) => BaseModel::Svr(p.fit(x, y, seed)?),
            Self::Mlp(p) => BaseModel::Mlp(p.fit(x, y, seed)?),
        })
    }
}

/// A fitted base model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaseModel {
    DecisionTree(RegressionTree),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
    Svr(Svr),
    Mlp(Mlp),
}

impl BaseModel {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DecisionTree(_) => "decision_tree",
            Self::RandomForest(_) => "random_forest",
            Self::GradientBoosting(_) => "gradient_boosting",
            Self::Svr(_) => "svr",
            Self::Mlp(_) => "mlp",
        }
    }

    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            Self::DecisionTree(m) => m,
            Self::RandomForest(m) => m,
            Self::GradientBoosting(m) => m,
            Self::Svr(m) => m,
            Self::Mlp(m) => m,
        }
    }
}

impl Regressor for BaseModel {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.as_regressor().predict_row(row)
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        self.as_regressor().predict(x)
    }
}

/// How base predictions are merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnsembleStrategy {
    /// Unweighted mean of base predictions
    Average,
    /// Ridge combiner fit on out-of-fold predictions
    Stacked { folds: usize, ridge_alpha: f64 },
}

impl Default for EnsembleStrategy {
    fn default() -> Self {
        Self::Stacked {
            folds: 5,
            ridge_alpha: 1.0,
        }
    }
}

impl EnsembleStrategy {
    /// Parse `average` or `stacked` (default folds and penalty).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "average" | "mean" | "voting" => Some(Self::Average),
            "stacked" | "stacking" => Some(Self::default()),
            _ => None,
        }
    }
}

/// Fitted combination rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Combiner {
    Average,
    Linear { weights: Vec<f64>, intercept: f64 },
}

impl Combiner {
    #[must_use]
    pub fn combine(&self, predictions: &[f64]) -> f64 {
        match self {
            Self::Average => {
                if predictions.is_empty() {
                    f64::NAN
                } else {
                    predictions.iter().sum::<f64>() / predictions.len() as f64
                }
            }
            Self::Linear { weights, intercept } => {
                intercept + weights.iter().zip(predictions).map(|(w, p)| w * p).sum::<f64>()
            }
        }
    }
}

/// A fitted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    members: Vec<BaseModel>,
    combiner: Combiner,
}

fn member_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add(index as u64)
}

fn fit_members(
    learners: &[BaseLearner],
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    seed: u64,
) -> Result<Vec<BaseModel>, LearnError> {
    learners
        .iter()
        .enumerate()
        .map(|(i, learner)| {
            let started = std::time::Instant::now();
            let model = learner.fit(x, y, member_seed(seed, i))?;
            tracing::debug!("Fitted {} in {:?}", learner.name(), started.elapsed());
            Ok(model)
        })
        .collect()
}

/// Out-of-fold predictions of every learner, one column per learner.
fn out_of_fold(
    learners: &[BaseLearner],
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    folds: usize,
    seed: u64,
) -> Result<Array2<f64>, LearnError> {
    let n = x.nrows();
    let mut oof = Array2::<f64>::zeros((n, learners.len()));

    for k in 0..folds {
        let start = k * n / folds;
        let end = (k + 1) * n / folds;
        let held_out: Vec<usize> = (start..end).collect();
        let kept: Vec<usize> = (0..start).chain(end..n).collect();

        let x_fit = x.select(Axis(0), &kept);
        let y_fit = y.select(Axis(0), &kept);
        let x_held = x.select(Axis(0), &held_out);

        for (j, learner) in learners.iter().enumerate() {
            let model = learner.fit(x_fit.view(), y_fit.view(), member_seed(seed, j))?;
            let pred = model.predict(x_held.view());
            for (offset, value) in pred.iter().enumerate() {
                oof[[start + offset, j]] = *value;
            }
        }
    }
    Ok(oof)
}

impl Ensemble {
    /// Fit the ensemble.
    ///
    /// # Errors
    /// Returns `LearnError` if there are no learners, too few rows for the
    /// requested folds, or any learner fails.
    pub fn fit(
        learners: &[BaseLearner],
        strategy: &EnsembleStrategy,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        seed: u64,
    ) -> Result<Self, LearnError> {
        if learners.is_empty() {
            return Err(LearnError::InvalidParameter("ensemble needs at least one learner".into()));
        }

        let combiner = match strategy {
            EnsembleStrategy::Average => Combiner::Average,
            EnsembleStrategy::Stacked { folds, ridge_alpha } => {
                if *folds < 2 {
                    return Err(LearnError::InvalidParameter(format!("folds {folds} must be at least 2")));
                }
                let folds = (*folds).min(x.nrows());
                if folds < 2 {
                    return Err(LearnError::EmptyTrainingSet);
                }

                let oof = out_of_fold(learners, x, y, folds, seed)?;
                let ridge = RidgeParams { alpha: *ridge_alpha }.fit(oof.view(), y, seed)?;
                let weights = ridge.coefficients().to_vec();
                let intercept = ridge.intercept();
                if !intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
                    return Err(LearnError::NonFinite("stacking weights"));
                }
                tracing::info!("Stacking weights {:?}, intercept {:.3}", weights, intercept);
                Combiner::Linear { weights, intercept }
            }
        };

        let members = fit_members(learners, x, y, seed)?;
        Ok(Self { members, combiner })
    }

    #[must_use]
    pub fn members(&self) -> &[BaseModel] {
        &self.members
    }

    #[must_use]
    pub fn combiner(&self) -> &Combiner {
        &self.combiner
    }

    /// Names of the member models, in combination order.
    #[must_use]
    pub fn member_names(&self) -> Vec<&'static str> {
        self.members.iter().map(BaseModel::name).collect()
    }
}

impl Regressor for Ensemble {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let preds: Vec<f64> = self.members.iter().map(|m| m.predict_row(row)).collect();
        self.combiner.combine(&preds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 / 4.0 } else { (i % 5) as f64 });
        let y = Array1::from_iter(x.outer_iter().map(|r| 10.0 + 3.0 * r[0] + r[1]));
        (x, y)
    }

    fn quick_learners() -> Vec<BaseLearner> {
        vec![
            BaseLearner::DecisionTree(TreeParams {
                max_depth: 4,
                ..TreeParams::default()
            }),
            BaseLearner::GradientBoosting(BoostingParams {
                n_stages: 30,
                ..BoostingParams::default()
            }),
        ]
    }

    #[test]
    fn test_average_is_mean_of_members() {
        let (x, y) = data();
        let ensemble = Ensemble::fit(&quick_learners(), &EnsembleStrategy::Average, x.view(), y.view(), 42)
            .expect("fit");

        let row = array![3.0, 2.0];
        let member_mean = ensemble
            .members()
            .iter()
            .map(|m| m.predict_row(row.view()))
            .sum::<f64>()
            / 2.0;
        assert!((ensemble.predict_row(row.view()) - member_mean).abs() < 1e-12);
        assert_eq!(ensemble.member_names(), vec!["decision_tree", "gradient_boosting"]);
    }

    #[test]
    fn test_stacking_yields_finite_linear_combiner() {
        let (x, y) = data();
        let strategy = EnsembleStrategy::Stacked {
            folds: 4,
            ridge_alpha: 1.0,
        };
        let ensemble = Ensemble::fit(&quick_learners(), &strategy, x.view(), y.view(), 42).expect("fit");

        match ensemble.combiner() {
            Combiner::Linear { weights, intercept } => {
                assert_eq!(weights.len(), 2);
                assert!(weights.iter().all(|w| w.is_finite()));
                assert!(intercept.is_finite());
            }
            Combiner::Average => panic!("expected a linear combiner"),
        }
        let pred = ensemble.predict(x.view());
        assert!(pred.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_same_seed_same_ensemble() {
        let (x, y) = data();
        let strategy = EnsembleStrategy::default();
        let a = Ensemble::fit(&quick_learners(), &strategy, x.view(), y.view(), 7).expect("fit");
        let b = Ensemble::fit(&quick_learners(), &strategy, x.view(), y.view(), 7).expect("fit");
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_empty_learner_list() {
        let (x, y) = data();
        let result = Ensemble::fit(&[], &EnsembleStrategy::Average, x.view(), y.view(), 0);
        assert!(matches!(result, Err(LearnError::InvalidParameter(_))));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(EnsembleStrategy::parse("Average"), Some(EnsembleStrategy::Average));
        assert_eq!(EnsembleStrategy::parse("stacked"), Some(EnsembleStrategy::default()));
        assert_eq!(EnsembleStrategy::parse("bagging"), None);
    }

    #[test]
    fn test_base_learner_serde_tag() {
        let json = serde_json::to_value(BaseLearner::Svr(SvrParams::default())).expect("serialize");
        assert_eq!(json["kind"], "svr");
        let back: BaseLearner = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, BaseLearner::Svr(SvrParams::default()));
    }
}
