//! Rule-based mission risk scoring.
//!
//! The ensemble predicts mission duration in hours. This module turns that
//! prediction plus the request fields into a bounded risk score, a discrete
//! risk level and a short list of risk factors. Nothing here is learned: every
//! threshold lives in [`RiskThresholds`].

use serde::{Deserialize, Serialize};

use super::record::MissionProfile;

pub const FACTOR_ADVANCED_AGE: &str = "Advanced age factor";
pub const FACTOR_NO_FLIGHT_EXPERIENCE: &str = "No prior flight experience";
pub const FACTOR_LIMITED_EXPERIENCE: &str = "Limited flight experience";
pub const FACTOR_EXTENDED_DURATION: &str = "Extended mission duration";
pub const FACTOR_HIGH_COMPLEXITY: &str = "High mission complexity";
pub const FACTOR_LOW_SUCCESS_PROBABILITY: &str = "Low success probability";
pub const FACTOR_LEADERSHIP_ROLE: &str = "Leadership role responsibility";
pub const FACTOR_ADVERSE_WEATHER: &str = "Adverse launch weather";

/// Decimal places of the reported score. The level is chosen from the
/// rounded value so the two always agree.
const SCORE_DECIMALS: i32 = 3;

fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (score * factor).round() / factor
}

/// Discrete risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    /// All levels, lowest first.
    pub const ALL: [RiskLevel; 5] = [
        Self::VeryLow,
        Self::Low,
        Self::Moderate,
        Self::High,
        Self::VeryHigh,
    ];

    /// Classify a score against ascending cutoffs.
    #[must_use]
    pub fn from_score(score: f64, cutoffs: &[f64; 4]) -> Self {
        if score < cutoffs[0] {
            Self::VeryLow
        } else if score < cutoffs[1] {
            Self::Low
        } else if score < cutoffs[2] {
            Self::Moderate
        } else if score < cutoffs[3] {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::VeryLow | Self::Low => "Low risk profile - standard mission protocols apply",
            Self::Moderate => {
                "Moderate risk profile - standard protocols with additional precautions"
            }
            Self::High | Self::VeryHigh => {
                "High overall risk profile - requires enhanced monitoring"
            }
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds and weights of the risk rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Ages above this add `age_weight` per year
    pub age_threshold: f64,
    pub age_weight: f64,
    /// Fewer missions than this add `inexperience_weight` per missing mission
    pub experienced_missions: u32,
    pub inexperience_weight: f64,
    /// Predicted durations above this add `duration_weight` per hour
    pub duration_threshold_hours: f64,
    pub duration_weight: f64,
    pub complexity_threshold: f64,
    pub complexity_weight: f64,
    /// Success probabilities below this add `success_weight` per unit
    pub success_threshold: f64,
    pub success_weight: f64,
    pub commander_risk: f64,
    pub pilot_risk: f64,
    pub poor_weather_risk: f64,
    pub overcast_weather_risk: f64,
    /// Applied (negative) for a military background
    pub military_adjustment: f64,
    /// Floor of the final score
    pub min_score: f64,
    /// Level cutoffs: Very Low / Low / Moderate / High / Very High
    pub level_cutoffs: [f64; 4],
    /// Maximum number of risk factors reported
    pub max_factors: usize,
    /// Success probabilities below this trigger a mitigation recommendation
    pub mitigation_success_threshold: f64,
    /// Scores above this trigger enhanced safety protocols
    pub enhanced_protocol_score: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            age_threshold: 50.0,
            age_weight: 0.02,
            experienced_missions: 3,
            inexperience_weight: 0.1,
            duration_threshold_hours: 300.0,
            duration_weight: 0.001,
            complexity_threshold: 0.7,
            complexity_weight: 0.3,
            success_threshold: 0.9,
            success_weight: 0.5,
            commander_risk: 0.1,
            pilot_risk: 0.05,
            poor_weather_risk: 0.15,
            overcast_weather_risk: 0.08,
            military_adjustment: -0.05,
            min_score: 0.05,
            level_cutoffs: [0.2, 0.4, 0.6, 0.8],
            max_factors: 4,
            mitigation_success_threshold: 0.85,
            enhanced_protocol_score: 0.6,
        }
    }
}

/// One triggered rule and how much it added to the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskContribution {
    pub factor: String,
    pub contribution: f64,
}

/// Output of the risk scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Score in [0, 1]
    pub score: f64,
    pub level: RiskLevel,
    /// Triggered factors, largest contribution first, capped
    pub factors: Vec<String>,
    /// Every triggered rule, largest contribution first
    pub contributions: Vec<RiskContribution>,
    pub recommendations: Vec<String>,
}

/// Deterministic post-processing of a duration prediction.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    thresholds: RiskThresholds,
}

impl RiskScorer {
    #[must_use]
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Score one profile given the predicted duration in hours.
    #[must_use]
    pub fn assess(&self, profile: &MissionProfile, predicted_hours: f64) -> RiskAssessment {
        let t = &self.thresholds;
        let age = f64::from(profile.age);
        let mut contributions: Vec<(&'static str, f64)> = Vec::new();

        if age > t.age_threshold {
            contributions.push((FACTOR_ADVANCED_AGE, (age - t.age_threshold) * t.age_weight));
        }

        if profile.missions < t.experienced_missions {
            let missing = f64::from(t.experienced_missions - profile.missions);
            let factor = if profile.missions == 0 {
                FACTOR_NO_FLIGHT_EXPERIENCE
            } else {
                FACTOR_LIMITED_EXPERIENCE
            };
            contributions.push((factor, missing * t.inexperience_weight));
        }

        if predicted_hours.is_finite() && predicted_hours > t.duration_threshold_hours {
            contributions.push((
                FACTOR_EXTENDED_DURATION,
                (predicted_hours - t.duration_threshold_hours) * t.duration_weight,
            ));
        }

        if profile.mission_complexity > t.complexity_threshold {
            contributions.push((
                FACTOR_HIGH_COMPLEXITY,
                (profile.mission_complexity - t.complexity_threshold) * t.complexity_weight,
            ));
        }

        if profile.success_probability < t.success_threshold {
            contributions.push((
                FACTOR_LOW_SUCCESS_PROBABILITY,
                (t.success_threshold - profile.success_probability) * t.success_weight,
            ));
        }

        let role = profile.role.trim();
        let role_risk = if role.eq_ignore_ascii_case("commander") {
            t.commander_risk
        } else if role.eq_ignore_ascii_case("pilot") {
            t.pilot_risk
        } else {
            0.0
        };
        if role_risk > 0.0 {
            contributions.push((FACTOR_LEADERSHIP_ROLE, role_risk));
        }

        let weather = profile.launch_weather.trim();
        let weather_risk = if weather.eq_ignore_ascii_case("poor") {
            t.poor_weather_risk
        } else if weather.eq_ignore_ascii_case("overcast") {
            t.overcast_weather_risk
        } else {
            0.0
        };
        if weather_risk > 0.0 {
            contributions.push((FACTOR_ADVERSE_WEATHER, weather_risk));
        }

        let adjustment = if profile.military {
            t.military_adjustment
        } else {
            0.0
        };
        let raw: f64 = contributions.iter().map(|(_, c)| c).sum::<f64>() + adjustment;
        let floor = t.min_score.clamp(0.0, 1.0);
        let score = round_score(if raw.is_finite() {
            raw.clamp(floor, 1.0)
        } else {
            floor
        });

        // Stable: equal contributions keep rule order
        contributions.sort_by(|a, b| b.1.total_cmp(&a.1));

        let factors = contributions
            .iter()
            .take(t.max_factors)
            .map(|(f, _)| (*f).to_string())
            .collect();

        let level = RiskLevel::from_score(score, &t.level_cutoffs);
        let recommendations = self.recommendations(profile, predicted_hours, score);

        RiskAssessment {
            score,
            level,
            factors,
            contributions: contributions
                .into_iter()
                .map(|(factor, contribution)| RiskContribution {
                    factor: factor.to_string(),
                    contribution,
                })
                .collect(),
            recommendations,
        }
    }

    fn recommendations(&self, profile: &MissionProfile, predicted_hours: f64, score: f64) -> Vec<String> {
        let t = &self.thresholds;
        let role = profile.role.trim();
        let weather = profile.launch_weather.trim();

        let rules: [(bool, &str); 9] = [
            (
                f64::from(profile.age) > t.age_threshold,
                "Consider additional health monitoring for older astronaut",
            ),
            (
                profile.missions < t.experienced_missions,
                "Provide additional training and mentorship",
            ),
            (
                predicted_hours > t.duration_threshold_hours,
                "Plan for extended mission support and regular check-ins",
            ),
            (
                profile.mission_complexity > t.complexity_threshold,
                "Enhanced mission planning and contingency protocols for high complexity",
            ),
            (
                profile.success_probability < t.mitigation_success_threshold,
                "Additional risk mitigation measures and backup plans required",
            ),
            (
                role.eq_ignore_ascii_case("commander") || role.eq_ignore_ascii_case("pilot"),
                "Leadership training and stress management protocols",
            ),
            (
                weather.eq_ignore_ascii_case("poor") || weather.eq_ignore_ascii_case("overcast"),
                "Monitor weather conditions and consider launch delay if necessary",
            ),
            (
                !profile.military,
                "Additional stress and emergency response training recommended",
            ),
            (
                score > t.enhanced_protocol_score,
                "Implement enhanced safety protocols",
            ),
        ];

        let mut out: Vec<String> = rules
            .iter()
            .filter(|(hit, _)| *hit)
            .map(|(_, text)| (*text).to_string())
            .collect();
        if out.is_empty() {
            out.push("Standard mission protocols apply".to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> MissionProfile {
        let mut p = MissionProfile::derived(40, "USA", 4, 300.0);
        p.military = true;
        p
    }

    #[test]
    fn test_level_thresholds() {
        let cutoffs = RiskThresholds::default().level_cutoffs;
        assert_eq!(RiskLevel::from_score(0.0, &cutoffs), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_score(0.2, &cutoffs), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.45, &cutoffs), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0.6, &cutoffs), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.99, &cutoffs), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_level_monotonic_in_score() {
        let cutoffs = RiskThresholds::default().level_cutoffs;
        let mut previous = RiskLevel::VeryLow;
        for i in 0..=1000 {
            let level = RiskLevel::from_score(f64::from(i) / 1000.0, &cutoffs);
            assert!(level >= previous);
            previous = level;
        }
        assert_eq!(previous, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_low_risk_profile_gets_floor() {
        let scorer = RiskScorer::default();
        let a = scorer.assess(&baseline(), 200.0);

        assert!((a.score - 0.05).abs() < 1e-12);
        assert_eq!(a.level, RiskLevel::VeryLow);
        assert!(a.factors.is_empty());
    }

    #[test]
    fn test_factor_strings_and_order() {
        let scorer = RiskScorer::default();
        let mut p = baseline();
        p.age = 58; // 0.16
        p.missions = 0; // 0.3
        p.launch_weather = "Poor".into(); // 0.15
        p.military = false;

        let a = scorer.assess(&p, 200.0);
        assert_eq!(
            a.factors,
            vec![
                FACTOR_NO_FLIGHT_EXPERIENCE.to_string(),
                FACTOR_ADVANCED_AGE.to_string(),
                FACTOR_ADVERSE_WEATHER.to_string(),
            ]
        );
        assert!((a.score - 0.61).abs() < 1e-9);
        assert_eq!(a.level, RiskLevel::High);
    }

    #[test]
    fn test_factors_capped_and_score_clipped() {
        let scorer = RiskScorer::default();
        let mut p = MissionProfile::derived(90, "USA", 0, 0.0);
        p.role = "commander".into();
        p.launch_weather = "Poor".into();
        p.mission_complexity = 1.0;
        p.success_probability = 0.1;

        let a = scorer.assess(&p, 5_000.0);
        assert_eq!(a.factors.len(), 4);
        assert!(a.contributions.len() > 4);
        assert!((a.score - 1.0).abs() < f64::EPSILON);
        assert_eq!(a.level, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_non_finite_prediction_is_bounded() {
        let scorer = RiskScorer::default();
        let a = scorer.assess(&baseline(), f64::NAN);
        assert!((0.0..=1.0).contains(&a.score));

        let a = scorer.assess(&baseline(), f64::INFINITY);
        assert!((0.0..=1.0).contains(&a.score));
    }

    #[test]
    fn test_level_follows_reported_score() {
        let scorer = RiskScorer::default();
        let mut p = baseline();
        p.missions = 0; // 0.3
        p.role = "commander".into(); // 0.1
        p.launch_weather = "Poor".into(); // 0.15
        p.mission_complexity = 0.8653; // 0.04959
        p.military = false;

        let a = scorer.assess(&p, 200.0);
        assert_eq!(a.score, 0.6);
        assert_eq!(a.level, RiskLevel::High);
        assert_eq!(a.level, RiskLevel::from_score(a.score, &scorer.thresholds().level_cutoffs));
    }

    #[test]
    fn test_each_recommendation_rule() {
        let scorer = RiskScorer::default();
        let cases: [(&str, fn(&mut MissionProfile), f64, Option<&str>); 16] = [
            ("age 51", |p: &mut MissionProfile| p.age = 51, 100.0,
                Some("Consider additional health monitoring for older astronaut")),
            ("age 50", |p: &mut MissionProfile| p.age = 50, 100.0, None),
            ("two missions", |p: &mut MissionProfile| p.missions = 2, 100.0,
                Some("Provide additional training and mentorship")),
            ("three missions", |p: &mut MissionProfile| p.missions = 3, 100.0, None),
            ("301 hours", |_: &mut MissionProfile| {}, 301.0,
                Some("Plan for extended mission support and regular check-ins")),
            ("300 hours", |_: &mut MissionProfile| {}, 300.0, None),
            ("complexity 0.71", |p: &mut MissionProfile| p.mission_complexity = 0.71, 100.0,
                Some("Enhanced mission planning and contingency protocols for high complexity")),
            ("complexity 0.7", |p: &mut MissionProfile| p.mission_complexity = 0.7, 100.0, None),
            ("success 0.84", |p: &mut MissionProfile| p.success_probability = 0.84, 100.0,
                Some("Additional risk mitigation measures and backup plans required")),
            ("success 0.85", |p: &mut MissionProfile| p.success_probability = 0.85, 100.0, None),
            ("success 0.89", |p: &mut MissionProfile| p.success_probability = 0.89, 100.0, None),
            ("pilot", |p: &mut MissionProfile| p.role = "pilot".into(), 100.0,
                Some("Leadership training and stress management protocols")),
            ("commander", |p: &mut MissionProfile| p.role = "Commander".into(), 100.0,
                Some("Leadership training and stress management protocols")),
            ("overcast", |p: &mut MissionProfile| p.launch_weather = "Overcast".into(), 100.0,
                Some("Monitor weather conditions and consider launch delay if necessary")),
            ("poor weather", |p: &mut MissionProfile| p.launch_weather = "poor".into(), 100.0,
                Some("Monitor weather conditions and consider launch delay if necessary")),
            ("civilian", |p: &mut MissionProfile| p.military = false, 100.0,
                Some("Additional stress and emergency response training recommended")),
        ];

        for (label, tweak, hours, expected) in cases {
            let mut p = baseline();
            tweak(&mut p);
            let a = scorer.assess(&p, hours);
            let expected = expected.unwrap_or("Standard mission protocols apply");
            assert_eq!(a.recommendations, vec![expected.to_string()], "{label}");
        }
    }

    #[test]
    fn test_success_scoring_and_mitigation_thresholds_differ() {
        let scorer = RiskScorer::default();
        let mut p = baseline();
        p.success_probability = 0.87;

        let a = scorer.assess(&p, 100.0);
        assert!(a
            .contributions
            .iter()
            .any(|c| c.factor == FACTOR_LOW_SUCCESS_PROBABILITY));
        assert_eq!(a.recommendations, vec!["Standard mission protocols apply".to_string()]);
    }

    #[test]
    fn test_enhanced_protocol_recommendation() {
        let high = RiskScorer::default();
        let mut p = baseline();
        p.age = 75; // 0.5
        p.launch_weather = "Poor".into(); // 0.15
        p.role = "commander".into(); // 0.1
        let a = high.assess(&p, 100.0);
        assert!(a.score > 0.6);
        assert!(a
            .recommendations
            .contains(&"Implement enhanced safety protocols".to_string()));

        let low_cutoff = RiskScorer::new(RiskThresholds {
            enhanced_protocol_score: 0.04,
            ..RiskThresholds::default()
        });
        let a = low_cutoff.assess(&baseline(), 100.0);
        assert_eq!(a.recommendations, vec!["Implement enhanced safety protocols".to_string()]);
    }

    #[test]
    fn test_recommendations_default() {
        let scorer = RiskScorer::default();
        let a = scorer.assess(&baseline(), 100.0);
        assert_eq!(a.recommendations, vec!["Standard mission protocols apply".to_string()]);
    }

    #[test]
    fn test_level_serializes_with_spaces() {
        let json = serde_json::to_string(&RiskLevel::VeryHigh).expect("serialize");
        assert_eq!(json, "\"Very High\"");
        assert_eq!(RiskLevel::ALL.len(), 5);
    }
}
