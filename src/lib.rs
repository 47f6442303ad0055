//! # Astrorisk
//!
//! Astronaut mission-duration and risk prediction pipeline.
//!
//! This crate provides:
//! - Loading and cleaning of historical astronaut/mission tables
//! - A fixed-layout feature encoder with "Other" fallbacks
//! - An ensemble of tree, boosting, kernel and neural regressors
//! - A deterministic risk scorer on top of the predicted duration
//! - A JSON-in / JSON-out prediction service over a shared read-only model
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (mission records, requests, risk rules)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (CSV, synthetic data, learners, artifacts)
//! - `application`: Use cases orchestrating domain and ports

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use application::{PredictionService, TrainedModel};
pub use domain::{AstronautProfile, PredictionResponse, RiskLevel};

/// Result type for Astrorisk operations
pub type Result<T> = std::result::Result<T, AstroriskError>;

/// Main error type for Astrorisk
#[derive(Debug, thiserror::Error)]
pub enum AstroriskError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] adapters::DatasetError),

    #[error("Model artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Training failed: {0}")]
    Learn(#[from] ports::LearnError),

    #[error("Invalid astronaut data: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("No training data available from the dataset or the synthetic generator")]
    NoTrainingData,

    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
