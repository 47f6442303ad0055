//! Training use case: split, scale, fit the ensemble, evaluate.
//!
//! The result is a [`TrainedModel`]: a read-only bundle of the fitted scaler,
//! ensemble and metrics that can be shared behind an `Arc` and cached as a
//! JSON artifact.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::{Array1, ArrayView1, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::config::PipelineConfig;
use super::dataset::{feature_matrix, load_training_records, TrainingData};
use super::ensemble::{BaseLearner, Ensemble, EnsembleStrategy};
use super::prediction::PredictionError;
use super::preprocessing::StandardScaler;
use crate::adapters::{CsvDatasetSource, JsonModelStore, SyntheticDatasetSource};
use crate::domain::{FeatureVector, MissionRecord, FEATURE_NAMES};
use crate::ports::{ModelStore, Regressor};
use crate::{AstroriskError, Result};

/// Version tag written into every trained model.
pub const MODEL_VERSION: &str = "1.0.0";
/// Lower bound of the reported duration interval, in hours.
pub const MIN_INTERVAL_HOURS: f64 = 24.0;
/// z-score of a two-sided 95% interval.
const Z_95: f64 = 1.96;

const DEFAULT_SEED: u64 = 42;
const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Training settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub seed: u64,
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
    pub strategy: EnsembleStrategy,
    pub learners: Vec<BaseLearner>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            strategy: EnsembleStrategy::default(),
            learners: BaseLearner::default_set(),
        }
    }
}

impl TrainingConfig {
    /// Small learners for tests.
    #[cfg(test)]
    pub(crate) fn fast() -> Self {
        use crate::adapters::learners::{BoostingParams, ForestParams, MlpParams, SvrParams};

        Self {
            learners: vec![
                BaseLearner::RandomForest(ForestParams {
                    n_trees: 10,
                    ..ForestParams::default()
                }),
                BaseLearner::GradientBoosting(BoostingParams {
                    n_stages: 30,
                    ..BoostingParams::default()
                }),
                BaseLearner::Mlp(MlpParams {
                    hidden: vec![8],
                    epochs: 50,
                    ..MlpParams::default()
                }),
                BaseLearner::Svr(SvrParams {
                    max_iter: 100,
                    ..SvrParams::default()
                }),
            ],
            strategy: EnsembleStrategy::Stacked {
                folds: 3,
                ridge_alpha: 1.0,
            },
            ..Self::default()
        }
    }
}

/// Goodness of fit on the training and held-out rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub train_r2: f64,
    pub test_r2: f64,
    pub train_rmse: f64,
    pub test_rmse: f64,
    pub train_mae: f64,
    pub test_mae: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

struct Fit {
    r2: f64,
    rmse: f64,
    mae: f64,
}

fn evaluate(truth: ArrayView1<'_, f64>, pred: ArrayView1<'_, f64>) -> Fit {
    let n = truth.len();
    if n == 0 {
        return Fit {
            r2: 0.0,
            rmse: 0.0,
            mae: 0.0,
        };
    }
    let mean = truth.mean().unwrap_or(0.0);
    let residuals = &truth - &pred;
    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
    let ss_tot: f64 = truth.iter().map(|t| (t - mean) * (t - mean)).sum();
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };
    Fit {
        r2,
        rmse: (ss_res / n as f64).sqrt(),
        mae: residuals.iter().map(|r| r.abs()).sum::<f64>() / n as f64,
    }
}

/// A duration estimate for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationEstimate {
    pub hours: f64,
    /// 95% interval, lower bound never below 24 hours
    pub interval: [f64; 2],
    /// The ensemble produced a non-finite value and the training mean was used
    pub used_fallback: bool,
}

/// A fitted, immutable prediction model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    version: String,
    model_type: String,
    feature_names: Vec<String>,
    scaler: StandardScaler,
    ensemble: Ensemble,
    metrics: TrainingMetrics,
    fallback_prediction: f64,
    data_origin: String,
    trained_at: DateTime<Utc>,
}

impl TrainedModel {
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn fallback_prediction(&self) -> f64 {
        self.fallback_prediction
    }

    #[must_use]
    pub fn data_origin(&self) -> &str {
        &self.data_origin
    }

    #[must_use]
    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    #[must_use]
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Predict mission duration for one encoded profile.
    ///
    /// # Errors
    /// Returns `FeatureMismatch` if the vector length differs from the
    /// fitted feature layout.
    pub fn predict(&self, features: &FeatureVector) -> std::result::Result<DurationEstimate, PredictionError> {
        if features.len() != self.feature_names.len() {
            return Err(PredictionError::FeatureMismatch {
                expected: self.feature_names.len(),
                actual: features.len(),
            });
        }

        let scaled = self.scaler.transform_row(ArrayView1::from(features.as_slice()));
        let raw = self.ensemble.predict_row(scaled.view());
        let (hours, used_fallback) = if raw.is_finite() {
            (raw, false)
        } else {
            tracing::warn!("Ensemble produced a non-finite prediction; using fallback");
            (self.fallback_prediction, true)
        };

        let margin = Z_95 * self.metrics.test_rmse;
        let lower = (hours - margin).max(MIN_INTERVAL_HOURS);
        Ok(DurationEstimate {
            hours,
            interval: [lower, (hours + margin).max(lower)],
            used_fallback,
        })
    }

    /// Serialize to JSON bytes.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from JSON bytes and check the feature layout.
    ///
    /// # Errors
    /// Returns error if the bytes do not parse or the model was trained on a
    /// different feature layout.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let model: Self = serde_json::from_slice(bytes)?;
        let expected: Vec<&str> = FEATURE_NAMES.to_vec();
        let actual: Vec<&str> = model.feature_names.iter().map(String::as_str).collect();
        if actual != expected {
            return Err(AstroriskError::ModelNotLoaded(format!(
                "artifact feature layout {actual:?} does not match {expected:?}"
            )));
        }
        if model.scaler.n_features() != expected.len() {
            return Err(AstroriskError::ModelNotLoaded("artifact scaler width mismatch".into()));
        }
        Ok(model)
    }
}

/// Split row indices into `(train, test)` after a seeded shuffle.
fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    let n_test = ((n as f64 * test_fraction.clamp(0.0, 1.0)).round() as usize).clamp(1, n - 1);
    let train = order.split_off(n_test);
    (train, order)
}

/// Train a model on cleaned records.
///
/// # Errors
/// Returns `NoTrainingData` with fewer than two rows, or a learner error.
pub fn train(records: &[MissionRecord], origin: &str, config: &TrainingConfig) -> Result<TrainedModel> {
    if records.len() < 2 {
        return Err(AstroriskError::NoTrainingData);
    }
    let started = std::time::Instant::now();

    let (x, y) = feature_matrix(records);
    let (train_idx, test_idx) = split_indices(records.len(), config.test_fraction, config.seed);
    let x_train = x.select(Axis(0), &train_idx);
    let y_train = y.select(Axis(0), &train_idx);
    let x_test = x.select(Axis(0), &test_idx);
    let y_test = y.select(Axis(0), &test_idx);

    let scaler = StandardScaler::fit(x_train.view());
    let xs_train = scaler.transform(x_train.view());
    let xs_test = scaler.transform(x_test.view());

    let ensemble = Ensemble::fit(
        &config.learners,
        &config.strategy,
        xs_train.view(),
        y_train.view(),
        config.seed,
    )?;

    let pred_train: Array1<f64> = ensemble.predict(xs_train.view());
    let pred_test: Array1<f64> = ensemble.predict(xs_test.view());
    let fit_train = evaluate(y_train.view(), pred_train.view());
    let fit_test = evaluate(y_test.view(), pred_test.view());

    let metrics = TrainingMetrics {
        train_r2: fit_train.r2,
        test_r2: fit_test.r2,
        train_rmse: fit_train.rmse,
        test_rmse: fit_test.rmse,
        train_mae: fit_train.mae,
        test_mae: fit_test.mae,
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
    };

    let strategy = match config.strategy {
        EnsembleStrategy::Average => "average",
        EnsembleStrategy::Stacked { .. } => "stacked",
    };
    let model_type = format!("{strategy}_ensemble({})", ensemble.member_names().join(","));

    tracing::info!(
        "Trained {} on {} rows in {:.1?}: test r2={:.3} rmse={:.1}h mae={:.1}h",
        model_type,
        records.len(),
        started.elapsed(),
        metrics.test_r2,
        metrics.test_rmse,
        metrics.test_mae
    );

    Ok(TrainedModel {
        version: MODEL_VERSION.to_string(),
        model_type,
        feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
        scaler,
        ensemble,
        metrics,
        fallback_prediction: y_train.mean().unwrap_or(MIN_INTERVAL_HOURS),
        data_origin: origin.to_string(),
        trained_at: Utc::now(),
    })
}

/// Load a cached model from `store`, or train one and cache it.
///
/// A missing, tampered or unreadable artifact is logged and replaced.
///
/// # Errors
/// Returns error only if training itself fails.
pub fn load_or_train<S, F>(store: Option<&S>, load_data: F, config: &TrainingConfig) -> Result<Arc<TrainedModel>>
where
    S: ModelStore,
    F: FnOnce() -> Result<TrainingData>,
{
    if let Some(store) = store {
        match store.load() {
            Ok(Some(bytes)) => match TrainedModel::from_json(&bytes) {
                Ok(model) => {
                    tracing::info!(
                        "Loaded cached model {} ({}) trained {}",
                        model.version(),
                        model.model_type(),
                        model.trained_at()
                    );
                    return Ok(Arc::new(model));
                }
                Err(e) => tracing::warn!("Cached model unusable, retraining: {}", e),
            },
            Ok(None) => tracing::info!("No cached model, training"),
            Err(e) => tracing::warn!("Cached model rejected, retraining: {}", e),
        }
    }

    let data = load_data()?;
    if data.synthetic {
        tracing::warn!("Training on synthetic data from {}", data.origin);
    }
    let model = train(&data.records, &data.origin, config)?;

    if let Some(store) = store {
        match model.to_json().map(|bytes| store.save(&bytes)) {
            Ok(Ok(info)) => tracing::info!("Cached model artifact (sha256 {})", info.sha256),
            Ok(Err(e)) => tracing::warn!("Failed to cache model: {}", e),
            Err(e) => tracing::warn!("Failed to serialize model: {}", e),
        }
    }

    Ok(Arc::new(model))
}

/// Run the configured pipeline: reuse the cached artifact when it verifies,
/// otherwise load the dataset (or synthetic stand-in) and train.
///
/// # Errors
/// Returns error if no training data is available or training fails.
pub fn prepare_model(config: &PipelineConfig) -> Result<Arc<TrainedModel>> {
    let csv = CsvDatasetSource::new(&config.dataset_path);
    let synthetic = SyntheticDatasetSource::new(config.synthetic_seed, config.synthetic_rows);
    let store = config.model_dir.as_ref().map(JsonModelStore::new);

    load_or_train(
        store.as_ref(),
        || load_training_records(Some(&csv), &synthetic, &config.cleaning),
        &config.training,
    )
}
