//! Prediction request validation.
//!
//! Requests arrive as loosely-typed JSON. They are checked once at the
//! boundary and turned into an [`AstronautProfile`] with every optional field
//! resolved to its default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::{
    MissionProfile, DEFAULT_LAUNCH_WEATHER, DEFAULT_MANUFACTURER, DEFAULT_MISSION_COMPLEXITY,
    DEFAULT_MISSION_TYPE, DEFAULT_ROLE, DEFAULT_SUCCESS_PROBABILITY,
};

/// Experience level assumed when a request does not provide one.
pub const DEFAULT_EXPERIENCE_LEVEL: &str = "Intermediate";
/// Age group assumed when a request does not provide one.
pub const DEFAULT_AGE_GROUP: &str = "Middle";
/// Career stage assumed when a request does not provide one.
pub const DEFAULT_CAREER_STAGE: &str = "Mid";

/// Upper bound accepted for accumulated space time, hours.
const MAX_SPACE_TIME_HOURS: f64 = 1_000_000.0;

/// One or more request fields are missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid astronaut data: {}", .errors.join("; "))]
pub struct ValidationError {
    /// Human-readable message per offending field
    pub errors: Vec<String>,
}

impl ValidationError {
    #[must_use]
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

/// A validated prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstronautProfile {
    pub name: String,
    pub mission: MissionProfile,
}

impl AstronautProfile {
    /// Parse and validate a request body.
    ///
    /// # Errors
    /// Returns `ValidationError` if the body is not a JSON object or any field
    /// is missing or malformed. All field problems are reported together.
    pub fn from_json_str(body: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ValidationError::single(format!("Request body is not valid JSON: {e}")))?;
        Self::from_json(&value)
    }

    /// Validate an already-parsed request body.
    ///
    /// # Errors
    /// See [`AstronautProfile::from_json_str`].
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let Some(obj) = value.as_object() else {
            return Err(ValidationError::single("Request body must be a JSON object"));
        };

        let mut errors = Vec::new();

        let name = match obj.get("name") {
            None | Some(Value::Null) => {
                errors.push("Missing required field: name".to_string());
                None
            }
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(_) => {
                errors.push("Name must be a non-empty string".to_string());
                None
            }
        };

        let nationality = match obj.get("nationality") {
            None | Some(Value::Null) => {
                errors.push("Missing required field: nationality".to_string());
                None
            }
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(_) => {
                errors.push("Nationality must be a string".to_string());
                None
            }
        };

        let age = required_count(obj, "age", &mut errors);
        let missions = required_count(obj, "missions", &mut errors);

        let space_time = match obj.get("space_time") {
            None | Some(Value::Null) => {
                errors.push("Missing required field: space_time".to_string());
                None
            }
            Some(v) => match as_number(v) {
                Some(x) if (0.0..=MAX_SPACE_TIME_HOURS).contains(&x) => Some(x),
                Some(_) => {
                    errors.push(format!(
                        "Space time must be between 0 and {MAX_SPACE_TIME_HOURS} hours"
                    ));
                    None
                }
                None => {
                    errors.push("Space time must be a valid number".to_string());
                    None
                }
            },
        };

        let mission_type = optional_string(obj, "mission_type", DEFAULT_MISSION_TYPE, &mut errors);
        let role = optional_string(obj, "role", DEFAULT_ROLE, &mut errors);
        let launch_weather =
            optional_string(obj, "launch_weather", DEFAULT_LAUNCH_WEATHER, &mut errors);
        let manufacturer = optional_string(obj, "manufacturer", DEFAULT_MANUFACTURER, &mut errors);
        let experience_level =
            optional_string(obj, "experience_level", DEFAULT_EXPERIENCE_LEVEL, &mut errors);
        let age_group = optional_string(obj, "age_group", DEFAULT_AGE_GROUP, &mut errors);
        let career_stage = optional_string(obj, "career_stage", DEFAULT_CAREER_STAGE, &mut errors);

        let mission_complexity = optional_unit(
            obj,
            "mission_complexity",
            DEFAULT_MISSION_COMPLEXITY,
            &mut errors,
        );
        let success_probability = optional_unit(
            obj,
            "success_probability",
            DEFAULT_SUCCESS_PROBABILITY,
            &mut errors,
        );

        let military = match obj.get("military") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(v) => match as_number(v) {
                Some(x) if x == 0.0 => false,
                Some(x) if x == 1.0 => true,
                _ => {
                    errors.push("Military must be a boolean".to_string());
                    false
                }
            },
        };

        if !errors.is_empty() {
            return Err(ValidationError { errors });
        }

        match (name, nationality, age, missions, space_time) {
            (Some(name), Some(nationality), Some(age), Some(missions), Some(space_time)) => {
                Ok(Self {
                    name,
                    mission: MissionProfile {
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
                    },
                })
            }
            _ => Err(ValidationError::single("Incomplete astronaut data")),
        }
    }
}

/// Read a JSON number, or a string holding one.
fn as_number(value: &Value) -> Option<f64> {
    let x = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}

fn required_count(obj: &Map<String, Value>, field: &str, errors: &mut Vec<String>) -> Option<u32> {
    let Some(value) = obj.get(field).filter(|v| !v.is_null()) else {
        errors.push(format!("Missing required field: {field}"));
        return None;
    };
    match as_number(value) {
        Some(x) if x < 0.0 => {
            errors.push(format!("{} must not be negative", capitalize(field)));
            None
        }
        Some(x) if x.fract() != 0.0 || x > f64::from(u32::MAX) => {
            errors.push(format!("{} must be a whole number", capitalize(field)));
            None
        }
        Some(x) => Some(x as u32),
        None => {
            errors.push(format!("{} must be a valid number", capitalize(field)));
            None
        }
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    field: &str,
    default: &str,
    errors: &mut Vec<String>,
) -> String {
    match obj.get(field) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => default.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            errors.push(format!("{} must be a string", capitalize(field)));
            default.to_string()
        }
    }
}

fn optional_unit(
    obj: &Map<String, Value>,
    field: &str,
    default: f64,
    errors: &mut Vec<String>,
) -> f64 {
    match obj.get(field) {
        None | Some(Value::Null) => default,
        Some(v) => match as_number(v) {
            Some(x) if (0.0..=1.0).contains(&x) => x,
            Some(_) => {
                errors.push(format!("{} must be between 0 and 1", capitalize(field)));
                default
            }
            None => {
                errors.push(format!("{} must be a valid number", capitalize(field)));
                default
            }
        },
    }
}

fn capitalize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_request_uses_defaults() {
        let profile = AstronautProfile::from_json(&json!({
            "name": "Test Astronaut",
            "age": 42,
            "nationality": "USA",
            "missions": 3,
            "space_time": 200
        }))
        .expect("Should validate");

        assert_eq!(profile.name, "Test Astronaut");
        assert_eq!(profile.mission.age, 42);
        assert_eq!(profile.mission.missions, 3);
        assert!((profile.mission.space_time - 200.0).abs() < f64::EPSILON);
        assert_eq!(profile.mission.mission_type, DEFAULT_MISSION_TYPE);
        assert_eq!(profile.mission.role, DEFAULT_ROLE);
        assert_eq!(profile.mission.experience_level, DEFAULT_EXPERIENCE_LEVEL);
        assert_eq!(profile.mission.age_group, DEFAULT_AGE_GROUP);
        assert_eq!(profile.mission.career_stage, DEFAULT_CAREER_STAGE);
        assert!(!profile.mission.military);
    }

    #[test]
    fn test_missing_name_rejected() {
        let err = AstronautProfile::from_json(&json!({
            "age": 42,
            "nationality": "USA",
            "missions": 3,
            "space_time": 200
        }))
        .unwrap_err();

        assert_eq!(err.errors, vec!["Missing required field: name".to_string()]);
    }

    #[test]
    fn test_non_numeric_age_rejected() {
        let err = AstronautProfile::from_json(&json!({
            "name": "A",
            "age": "forty",
            "nationality": "USA",
            "missions": 3,
            "space_time": 200
        }))
        .unwrap_err();

        assert!(err.errors.iter().any(|e| e == "Age must be a valid number"));
    }

    #[test]
    fn test_errors_are_collected() {
        let err = AstronautProfile::from_json(&json!({
            "name": "",
            "missions": -1,
            "space_time": "lots",
            "mission_complexity": 3.0
        }))
        .unwrap_err();

        assert_eq!(err.errors.len(), 6);
    }

    #[test]
    fn test_space_time_upper_bound() {
        let body = |space_time: f64| {
            json!({
                "name": "Test Astronaut",
                "age": 42,
                "nationality": "USA",
                "missions": 3,
                "space_time": space_time
            })
        };

        assert!(AstronautProfile::from_json(&body(MAX_SPACE_TIME_HOURS)).is_ok());
        let err = AstronautProfile::from_json(&body(MAX_SPACE_TIME_HOURS + 1.0)).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert!(err.errors[0].starts_with("Space time must be between 0 and"));
    }

    #[test]
    fn test_extreme_age_accepted() {
        let profile = AstronautProfile::from_json(&json!({
            "name": "Old Timer",
            "age": 150,
            "nationality": "Atlantis",
            "missions": 0,
            "space_time": 0
        }))
        .expect("Out-of-table values are not validation errors");
        assert_eq!(profile.mission.age, 150);
        assert_eq!(profile.mission.nationality, "Atlantis");
    }

    #[test]
    fn test_numeric_strings_and_optional_fields() {
        let profile = AstronautProfile::from_json(&json!({
            "name": "B",
            "age": "38",
            "nationality": "ESA",
            "missions": 2.0,
            "space_time": 120.5,
            "role": "commander",
            "launch_weather": "Poor",
            "military": true,
            "mission_complexity": 0.8
        }))
        .expect("Should validate");

        assert_eq!(profile.mission.age, 38);
        assert_eq!(profile.mission.missions, 2);
        assert_eq!(profile.mission.role, "commander");
        assert!(profile.mission.military);
        assert!((profile.mission.mission_complexity - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_object_and_bad_json() {
        assert!(AstronautProfile::from_json(&json!([1, 2, 3])).is_err());
        assert!(AstronautProfile::from_json_str("{not json").is_err());
    }
}
