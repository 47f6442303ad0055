//! Astronaut mission records.
//!
//! A `MissionProfile` holds every model input for one astronaut/mission pair.
//! Historical rows wrap it in a `MissionRecord` together with the observed
//! duration; live requests wrap it in an `AstronautProfile`.

use serde::{Deserialize, Serialize};

/// Mission type assumed when a request does not provide one.
pub const DEFAULT_MISSION_TYPE: &str = "ISS Expedition";
/// Crew role assumed when a request does not provide one.
pub const DEFAULT_ROLE: &str = "mission_specialist";
/// Launch weather assumed when a request does not provide one.
pub const DEFAULT_LAUNCH_WEATHER: &str = "Clear";
/// Manufacturer assumed when a request does not provide one.
pub const DEFAULT_MANUFACTURER: &str = "Other";
/// Mission complexity assumed when a request does not provide one.
pub const DEFAULT_MISSION_COMPLEXITY: f64 = 0.5;
/// Success probability assumed when a request does not provide one.
pub const DEFAULT_SUCCESS_PROBABILITY: f64 = 0.9;

/// Age bucket derived from astronaut age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    /// Younger than 35
    Young,
    /// 35 to 50 inclusive
    Middle,
    /// Older than 50
    Senior,
}

impl AgeGroup {
    /// Bucket an age in years. Ages beyond any realistic range clamp into `Senior`.
    #[must_use]
    pub fn from_age(age: u32) -> Self {
        if age < 35 {
            Self::Young
        } else if age > 50 {
            Self::Senior
        } else {
            Self::Middle
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Young => "Young",
            Self::Middle => "Middle",
            Self::Senior => "Senior",
        }
    }
}

/// Experience bucket derived from the number of completed missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    /// Fewer than 2 missions
    Junior,
    /// 2 to 4 missions
    Intermediate,
    /// More than 4 missions
    Senior,
}

impl ExperienceLevel {
    #[must_use]
    pub fn from_missions(missions: u32) -> Self {
        if missions < 2 {
            Self::Junior
        } else if missions > 4 {
            Self::Senior
        } else {
            Self::Intermediate
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "Junior",
            Self::Intermediate => "Intermediate",
            Self::Senior => "Senior",
        }
    }
}

/// Career stage derived from the number of completed missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CareerStage {
    Early,
    Mid,
    Experienced,
}

impl CareerStage {
    #[must_use]
    pub fn from_missions(missions: u32) -> Self {
        if missions < 3 {
            Self::Early
        } else if missions > 5 {
            Self::Experienced
        } else {
            Self::Mid
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Early => "Early",
            Self::Mid => "Mid",
            Self::Experienced => "Experienced",
        }
    }
}

/// Every model input describing one astronaut on one mission.
///
/// Categorical fields keep the caller's (trimmed) text; encoding into numeric
/// codes happens in [`crate::domain::FeatureVector::encode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionProfile {
    /// Age in years
    pub age: u32,
    /// Nationality or space agency
    pub nationality: String,
    /// Completed missions before this one
    pub missions: u32,
    /// Accumulated time in space, hours
    pub space_time: f64,
    pub mission_type: String,
    pub role: String,
    pub launch_weather: String,
    pub manufacturer: String,
    /// Mission complexity, 0.0 to 1.0
    pub mission_complexity: f64,
    /// Estimated success probability, 0.0 to 1.0
    pub success_probability: f64,
    /// Military background
    pub military: bool,
    pub experience_level: String,
    pub age_group: String,
    pub career_stage: String,
}

impl MissionProfile {
    /// Build a profile with the optional fields at their defaults and the
    /// buckets derived from age and mission count.
    #[must_use]
    pub fn derived(age: u32, nationality: impl Into<String>, missions: u32, space_time: f64) -> Self {
        Self {
            age,
            nationality: nationality.into(),
            missions,
            space_time,
            mission_type: DEFAULT_MISSION_TYPE.to_string(),
            role: DEFAULT_ROLE.to_string(),
            launch_weather: DEFAULT_LAUNCH_WEATHER.to_string(),
            manufacturer: DEFAULT_MANUFACTURER.to_string(),
            mission_complexity: DEFAULT_MISSION_COMPLEXITY,
            success_probability: DEFAULT_SUCCESS_PROBABILITY,
            military: false,
            experience_level: ExperienceLevel::from_missions(missions).as_str().to_string(),
            age_group: AgeGroup::from_age(age).as_str().to_string(),
            career_stage: CareerStage::from_missions(missions).as_str().to_string(),
        }
    }
}

/// One cleaned historical row of the training table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRecord {
    pub name: String,
    pub profile: MissionProfile,
    /// Observed mission duration in hours (training label)
    pub duration_hours: f64,
}

/// A dataset row before cleaning: every column as optional raw text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub name: Option<String>,
    pub age: Option<String>,
    pub nationality: Option<String>,
    pub missions: Option<String>,
    pub space_time: Option<String>,
    pub mission_type: Option<String>,
    pub role: Option<String>,
    pub launch_weather: Option<String>,
    pub manufacturer: Option<String>,
    pub mission_complexity: Option<String>,
    pub success_probability: Option<String>,
    pub military: Option<String>,
    pub duration_hours: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_group_thresholds() {
        assert_eq!(AgeGroup::from_age(25), AgeGroup::Young);
        assert_eq!(AgeGroup::from_age(35), AgeGroup::Middle);
        assert_eq!(AgeGroup::from_age(50), AgeGroup::Middle);
        assert_eq!(AgeGroup::from_age(51), AgeGroup::Senior);
        assert_eq!(AgeGroup::from_age(150), AgeGroup::Senior);
    }

    #[test]
    fn test_experience_and_career_thresholds() {
        assert_eq!(ExperienceLevel::from_missions(0), ExperienceLevel::Junior);
        assert_eq!(ExperienceLevel::from_missions(2), ExperienceLevel::Intermediate);
        assert_eq!(ExperienceLevel::from_missions(5), ExperienceLevel::Senior);

        assert_eq!(CareerStage::from_missions(2), CareerStage::Early);
        assert_eq!(CareerStage::from_missions(3), CareerStage::Mid);
        assert_eq!(CareerStage::from_missions(6), CareerStage::Experienced);
    }

    #[test]
    fn test_derived_profile() {
        let profile = MissionProfile::derived(42, "USA", 3, 200.0);
        assert_eq!(profile.age_group, "Middle");
        assert_eq!(profile.experience_level, "Intermediate");
        assert_eq!(profile.career_stage, "Mid");
        assert_eq!(profile.role, DEFAULT_ROLE);
        assert!(!profile.military);
    }
}
