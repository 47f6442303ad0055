//! Prediction service: JSON request in, scored prediction out.
//!
//! The service holds the trained model behind an `Arc` and never mutates it.
//! The only shared mutable state is a relaxed atomic prediction counter, so a
//! single service can be shared freely across threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::training::{TrainedModel, TrainingMetrics};
use crate::domain::{AstronautProfile, FeatureVector, PredictionResponse, RiskScorer, ValidationError};

/// Seconds a client should wait before retrying while the model loads.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Errors surfaced to callers of the prediction service.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model is not loaded yet")]
    ModelUnavailable,

    #[error("Feature vector has {actual} values but the model expects {expected}")]
    FeatureMismatch { expected: usize, actual: usize },
}

impl PredictionError {
    /// HTTP-style status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::ModelUnavailable => 503,
            Self::FeatureMismatch { .. } => 500,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::ModelUnavailable => "model_unavailable",
            Self::FeatureMismatch { .. } => "feature_mismatch",
        }
    }

    #[must_use]
    pub fn to_response(&self, retry_after_secs: u64) -> ErrorResponse {
        let (message, details) = match self {
            Self::Validation(e) => ("Invalid astronaut data".to_string(), e.errors.clone()),
            other => (other.to_string(), Vec::new()),
        };
        ErrorResponse {
            error: self.code(),
            status: self.status_code(),
            message,
            details,
            retry_after_secs: matches!(self, Self::ModelUnavailable).then_some(retry_after_secs),
        }
    }
}

/// Structured error body. Never carries prediction fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Snapshot of the service state.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub is_trained: bool,
    pub model_version: Option<String>,
    pub model_type: Option<String>,
    pub feature_names: Vec<String>,
    pub training_metrics: Option<TrainingMetrics>,
    pub data_origin: Option<String>,
    pub prediction_count: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Scores astronaut profiles against a shared trained model.
pub struct PredictionService {
    model: OnceLock<Arc<TrainedModel>>,
    scorer: RiskScorer,
    predictions: AtomicU64,
    retry_after_secs: u64,
}

impl PredictionService {
    /// Service backed by an already trained model.
    #[must_use]
    pub fn with_model(model: Arc<TrainedModel>) -> Self {
        let service = Self::unloaded();
        let _ = service.model.set(model);
        service
    }

    /// Service whose model will be installed later; until then every request
    /// is answered with `ModelUnavailable`.
    #[must_use]
    pub fn unloaded() -> Self {
        Self {
            model: OnceLock::new(),
            scorer: RiskScorer::default(),
            predictions: AtomicU64::new(0),
            retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
        }
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: RiskScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Install the model once. Returns `false` if one was already installed.
    pub fn install(&self, model: Arc<TrainedModel>) -> bool {
        let installed = self.model.set(model).is_ok();
        if !installed {
            tracing::warn!("Model already installed; ignoring replacement");
        }
        installed
    }

    #[must_use]
    pub fn model(&self) -> Option<&Arc<TrainedModel>> {
        self.model.get()
    }

    #[must_use]
    pub fn prediction_count(&self) -> u64 {
        self.predictions.load(Ordering::Relaxed)
    }

    /// Predict for a validated profile.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` before a model is installed, or
    /// `FeatureMismatch` if the model's feature layout differs.
    pub fn predict_profile(&self, profile: &AstronautProfile) -> Result<PredictionResponse, PredictionError> {
        let model = self.model.get().ok_or(PredictionError::ModelUnavailable)?;

        let features = FeatureVector::encode(&profile.mission);
        let estimate = model.predict(&features)?;
        let assessment = self.scorer.assess(&profile.mission, estimate.hours);

        self.predictions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Predicted {:.1}h, risk {:.3} ({})",
            estimate.hours,
            assessment.score,
            assessment.level
        );

        Ok(PredictionResponse::new(
            profile,
            estimate.hours,
            estimate.interval,
            estimate.used_fallback,
            assessment,
            model.version(),
            model.metrics().test_r2,
        ))
    }

    /// Validate a JSON request body and predict.
    ///
    /// # Errors
    /// Validation problems come first; see also [`Self::predict_profile`].
    pub fn predict_json(&self, body: &str) -> Result<PredictionResponse, PredictionError> {
        let profile = AstronautProfile::from_json_str(body)?;
        self.predict_profile(&profile)
    }

    /// Answer one request line with either a response or an error body.
    #[must_use]
    pub fn handle_line(&self, line: &str) -> Value {
        let result = self
            .predict_json(line)
            .map(|response| serde_json::to_value(response));
        match result {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::error!("Failed to serialize prediction: {}", e);
                serde_json::json!({
                    "error": "internal",
                    "status": 500,
                    "message": "Failed to serialize prediction",
                })
            }
            Err(e) => {
                tracing::info!("Request rejected ({}): {}", e.status_code(), e);
                serde_json::to_value(e.to_response(self.retry_after_secs))
                    .unwrap_or_else(|_| serde_json::json!({ "error": e.code() }))
            }
        }
    }

    /// Current model and counter state.
    #[must_use]
    pub fn status(&self) -> ModelStatus {
        let model = self.model.get();
        ModelStatus {
            is_trained: model.is_some(),
            model_version: model.map(|m| m.version().to_string()),
            model_type: model.map(|m| m.model_type().to_string()),
            feature_names: model.map(|m| m.feature_names().to_vec()).unwrap_or_default(),
            training_metrics: model.map(|m| m.metrics().clone()),
            data_origin: model.map(|m| m.data_origin().to_string()),
            prediction_count: self.prediction_count(),
            last_updated: model.map(|m| m.trained_at()),
        }
    }
}
