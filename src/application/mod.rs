//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases: cleaning a mission table, training the ensemble,
//! and serving risk predictions.

pub mod config;
pub mod dataset;
pub mod ensemble;
pub mod prediction;
pub mod preprocessing;
pub mod training;

pub use config::PipelineConfig;
pub use dataset::{clean, load_training_records, CleaningOptions, CleaningReport, TrainingData};
pub use ensemble::{BaseLearner, BaseModel, Combiner, Ensemble, EnsembleStrategy};
pub use prediction::{ErrorResponse, ModelStatus, PredictionError, PredictionService};
pub use preprocessing::StandardScaler;
pub use training::{load_or_train, train, DurationEstimate, TrainedModel, TrainingConfig, TrainingMetrics};
