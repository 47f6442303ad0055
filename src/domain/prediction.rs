//! Prediction result types.
//!
//! Represents the output of one duration prediction and its risk assessment,
//! shaped as the JSON response of the prediction service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::MissionProfile;
use super::request::AstronautProfile;
use super::risk::{RiskAssessment, RiskLevel};

/// Hours per day, for the duration echo in days.
const HOURS_PER_DAY: f64 = 24.0;

/// Normalized echo of the request fields used for the prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstronautEcho {
    pub name: String,
    pub age: u32,
    pub nationality: String,
    pub missions: u32,
    pub space_time: f64,
    pub mission_type: String,
    pub role: String,
    pub launch_weather: String,
    pub manufacturer: String,
    pub mission_complexity: f64,
    pub success_probability: f64,
    pub military: bool,
    pub experience_level: String,
    pub age_group: String,
    pub career_stage: String,
}

impl From<&AstronautProfile> for AstronautEcho {
    fn from(profile: &AstronautProfile) -> Self {
        let MissionProfile {
            age,
            nationality,
            missions,
            space_time,
            mission_type,
            role,
            launch_weather,
            manufacturer,
            mission_complexity,
            success_probability,
            military,
            experience_level,
            age_group,
            career_stage,
        } = profile.mission.clone();

        Self {
            name: profile.name.clone(),
            age,
            nationality,
            missions,
            space_time,
            mission_type,
            role,
            launch_weather,
            manufacturer,
            mission_complexity,
            success_probability,
            military,
            experience_level,
            age_group,
            career_stage,
        }
    }
}

/// Successful prediction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Unique identifier of this prediction
    pub id: String,

    /// Risk score in [0, 1]
    pub risk_score: f64,

    pub risk_level: RiskLevel,

    /// At most a handful of triggered risk factors, largest first
    pub risk_factors: Vec<String>,

    pub recommendations: Vec<String>,

    /// Ensemble duration prediction, hours
    pub predicted_duration_hours: f64,

    pub predicted_duration_days: f64,

    /// 95% interval from the held-out RMSE, hours
    pub confidence_interval_hours: [f64; 2],

    /// Whether the raw prediction was non-finite and replaced by the fallback
    pub used_fallback: bool,

    pub model_version: String,

    /// Held-out R² of the model that produced this prediction
    pub model_confidence: f64,

    pub astronaut: AstronautEcho,

    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl PredictionResponse {
    /// Assemble a response from a validated request and its scored prediction.
    #[must_use]
    pub fn new(
        profile: &AstronautProfile,
        duration_hours: f64,
        interval: [f64; 2],
        used_fallback: bool,
        assessment: RiskAssessment,
        model_version: impl Into<String>,
        model_confidence: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            risk_score: assessment.score,
            risk_level: assessment.level,
            risk_factors: assessment.factors,
            recommendations: assessment.recommendations,
            predicted_duration_hours: round_to(duration_hours, 1),
            predicted_duration_days: round_to(duration_hours / HOURS_PER_DAY, 1),
            confidence_interval_hours: [round_to(interval[0], 1), round_to(interval[1], 1)],
            used_fallback,
            model_version: model_version.into(),
            model_confidence: round_to(model_confidence, 3),
            astronaut: AstronautEcho::from(profile),
            timestamp: chrono::Utc::now(),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskScorer;

    fn profile() -> AstronautProfile {
        AstronautProfile {
            name: "Test Astronaut".into(),
            mission: MissionProfile::derived(42, "USA", 3, 200.0),
        }
    }

    #[test]
    fn test_echo_round_trips_known_fields() {
        let p = profile();
        let echo = AstronautEcho::from(&p);

        assert_eq!(echo.name, "Test Astronaut");
        assert_eq!(echo.age, 42);
        assert_eq!(echo.nationality, "USA");
        assert_eq!(echo.missions, 3);
        assert!((echo.space_time - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_response_rounding_and_days() {
        let p = profile();
        let assessment = RiskScorer::default().assess(&p.mission, 240.04);
        let r = PredictionResponse::new(&p, 240.04, [100.0, 380.0], false, assessment, "1.0.0", 0.6712);

        assert!((r.predicted_duration_hours - 240.0).abs() < 1e-9);
        assert!((r.predicted_duration_days - 10.0).abs() < 1e-9);
        assert!((r.model_confidence - 0.671).abs() < 1e-9);
        assert_eq!(r.model_version, "1.0.0");
    }

    #[test]
    fn test_response_json_shape() {
        let p = profile();
        let assessment = RiskScorer::default().assess(&p.mission, 200.0);
        let r = PredictionResponse::new(&p, 200.0, [60.0, 340.0], false, assessment, "1.0.0", 0.67);
        let json = serde_json::to_value(&r).expect("serialize");

        for key in ["risk_score", "risk_level", "risk_factors", "model_version", "astronaut"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["astronaut"]["age"], 42);
    }

    #[test]
    fn test_ids_are_unique_v4() {
        let p = profile();
        let scorer = RiskScorer::default();
        let a = PredictionResponse::new(&p, 200.0, [60.0, 340.0], false, scorer.assess(&p.mission, 200.0), "1.0.0", 0.5);
        let b = PredictionResponse::new(&p, 200.0, [60.0, 340.0], false, scorer.assess(&p.mission, 200.0), "1.0.0", 0.5);

        assert_ne!(a.id, b.id);
        let parsed = Uuid::parse_str(&a.id).expect("uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_reported_score_matches_level() {
        let mut p = profile();
        p.mission.missions = 0;
        p.mission.role = "commander".into();
        p.mission.launch_weather = "Poor".into();
        p.mission.mission_complexity = 0.8653;

        let assessment = RiskScorer::default().assess(&p.mission, 200.0);
        let r = PredictionResponse::new(&p, 200.0, [60.0, 340.0], false, assessment, "1.0.0", 0.5);
        let json = serde_json::to_value(&r).expect("serialize");
        assert_eq!(json["risk_score"], 0.6);
        assert_eq!(json["risk_level"], "High");
    }
}
