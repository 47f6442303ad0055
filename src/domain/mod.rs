//! Domain layer: Core business types and logic.
//!
//! This module contains plain Rust types and deterministic rules with no I/O.
//! All types are serializable and validated at construction.

pub mod features;
mod prediction;
mod record;
mod request;
mod risk;

pub use features::{EncodingTable, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use prediction::{AstronautEcho, PredictionResponse};
pub use record::{
    AgeGroup, CareerStage, ExperienceLevel, MissionProfile, MissionRecord, RawRecord,
    DEFAULT_LAUNCH_WEATHER, DEFAULT_MANUFACTURER, DEFAULT_MISSION_COMPLEXITY,
    DEFAULT_MISSION_TYPE, DEFAULT_ROLE, DEFAULT_SUCCESS_PROBABILITY,
};
pub use request::{AstronautProfile, ValidationError};
pub use risk::{RiskAssessment, RiskContribution, RiskLevel, RiskScorer, RiskThresholds};
