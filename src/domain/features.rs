//! Feature encoding for the ensemble predictor.
//!
//! Categorical fields are mapped to integer codes through fixed tables. Any
//! value missing from a table falls back to that table's "Other" code, so
//! encoding never fails on arbitrary input text.

use serde::{Deserialize, Serialize};

use super::record::MissionProfile;

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 14;

/// Feature names in the exact order of [`FeatureVector`] values.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "missions",
    "space_time",
    "mission_complexity",
    "success_probability",
    "military",
    "nationality",
    "mission_type",
    "role",
    "launch_weather",
    "manufacturer",
    "experience_level",
    "age_group",
    "career_stage",
];

/// A fixed categorical lookup table. The last category is the fallback bucket.
#[derive(Debug, Clone, Copy)]
pub struct EncodingTable {
    /// Field the table encodes
    pub field: &'static str,
    /// Known categories; the last entry is the "Other" bucket
    pub categories: &'static [&'static str],
}

impl EncodingTable {
    /// Code used for values not present in the table.
    #[must_use]
    pub fn other_code(&self) -> usize {
        self.categories.len() - 1
    }

    /// Look up a value (trimmed, ASCII case-insensitive).
    #[must_use]
    pub fn lookup(&self, value: &str) -> Option<usize> {
        let value = value.trim();
        self.categories
            .iter()
            .position(|c| c.eq_ignore_ascii_case(value))
    }

    /// Encode a value, substituting the "Other" code for unknown values.
    ///
    /// Returns the code and whether the fallback was used.
    #[must_use]
    pub fn encode(&self, value: &str) -> (usize, bool) {
        match self.lookup(value) {
            Some(code) => (code, false),
            None => (self.other_code(), true),
        }
    }
}

pub const NATIONALITY: EncodingTable = EncodingTable {
    field: "nationality",
    categories: &[
        "USA", "Russia", "Japan", "ESA", "Canada", "China", "India", "France", "Germany", "Italy",
        "UK", "Other",
    ],
};

pub const MISSION_TYPE: EncodingTable = EncodingTable {
    field: "mission_type",
    categories: &[
        "ISS Expedition",
        "Space Shuttle",
        "Commercial Crew",
        "Lunar Mission",
        "Other",
    ],
};

pub const ROLE: EncodingTable = EncodingTable {
    field: "role",
    categories: &[
        "commander",
        "pilot",
        "mission_specialist",
        "flight_engineer",
        "other",
    ],
};

pub const LAUNCH_WEATHER: EncodingTable = EncodingTable {
    field: "launch_weather",
    categories: &["Clear", "Partly Cloudy", "Overcast", "Poor", "Other"],
};

pub const MANUFACTURER: EncodingTable = EncodingTable {
    field: "manufacturer",
    categories: &["SpaceX", "Boeing", "Roscosmos", "Other"],
};

pub const EXPERIENCE_LEVEL: EncodingTable = EncodingTable {
    field: "experience_level",
    categories: &["Junior", "Intermediate", "Senior", "Other"],
};

pub const AGE_GROUP: EncodingTable = EncodingTable {
    field: "age_group",
    categories: &["Young", "Middle", "Senior", "Other"],
};

pub const CAREER_STAGE: EncodingTable = EncodingTable {
    field: "career_stage",
    categories: &["Early", "Mid", "Experienced", "Other"],
};

/// Fixed-order numeric encoding of one mission profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
    /// Categorical fields that fell back to the "Other" code
    #[serde(skip)]
    fallbacks: Vec<&'static str>,
}

impl FeatureVector {
    /// Encode a profile in [`FEATURE_NAMES`] order.
    #[must_use]
    pub fn encode(profile: &MissionProfile) -> Self {
        let mut fallbacks = Vec::new();
        let mut code = |table: &EncodingTable, value: &str| -> f64 {
            let (code, fallback) = table.encode(value);
            if fallback {
                tracing::debug!(
                    field = table.field,
                    "Unknown category, substituting fallback code {}",
                    code
                );
                fallbacks.push(table.field);
            }
            code as f64
        };

        let categorical = [
            code(&NATIONALITY, &profile.nationality),
            code(&MISSION_TYPE, &profile.mission_type),
            code(&ROLE, &profile.role),
            code(&LAUNCH_WEATHER, &profile.launch_weather),
            code(&MANUFACTURER, &profile.manufacturer),
            code(&EXPERIENCE_LEVEL, &profile.experience_level),
            code(&AGE_GROUP, &profile.age_group),
            code(&CAREER_STAGE, &profile.career_stage),
        ];

        let mut values = Vec::with_capacity(FEATURE_COUNT);
        values.extend_from_slice(&[
            f64::from(profile.age),
            f64::from(profile.missions),
            profile.space_time,
            profile.mission_complexity,
            profile.success_probability,
            if profile.military { 1.0 } else { 0.0 },
        ]);
        values.extend_from_slice(&categorical);

        Self { values, fallbacks }
    }

    /// Wrap raw values (used when replaying stored vectors).
    #[must_use]
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            values,
            fallbacks: Vec::new(),
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Categorical fields that were encoded with the fallback code.
    #[must_use]
    pub fn fallbacks(&self) -> &[&'static str] {
        &self.fallbacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories() {
        assert_eq!(NATIONALITY.encode("USA"), (0, false));
        assert_eq!(NATIONALITY.encode("  russia "), (1, false));
        assert_eq!(ROLE.encode("Commander"), (0, false));
        assert_eq!(LAUNCH_WEATHER.encode("Partly Cloudy"), (1, false));
    }

    #[test]
    fn test_unknown_category_uses_other() {
        assert_eq!(NATIONALITY.encode("Atlantis"), (NATIONALITY.other_code(), true));
        assert_eq!(MANUFACTURER.encode(""), (MANUFACTURER.other_code(), true));
        // "Other" itself is a known category
        assert_eq!(NATIONALITY.encode("Other"), (NATIONALITY.other_code(), false));
    }

    #[test]
    fn test_vector_order_and_length() {
        let profile = MissionProfile::derived(42, "Japan", 3, 200.0);
        let v = FeatureVector::encode(&profile);

        assert_eq!(v.len(), FEATURE_COUNT);
        assert_eq!(v.as_slice()[0], 42.0);
        assert_eq!(v.as_slice()[1], 3.0);
        assert_eq!(v.as_slice()[2], 200.0);
        assert_eq!(v.as_slice()[5], 0.0);
        assert_eq!(v.as_slice()[6], 2.0); // Japan
        assert!(v.fallbacks().is_empty());
    }

    #[test]
    fn test_arbitrary_strings_never_fail() {
        let mut profile = MissionProfile::derived(150, "\u{1F680}", 0, 0.0);
        profile.role = "janitor".into();
        profile.launch_weather = "hail of meteors".into();

        let v = FeatureVector::encode(&profile);
        assert_eq!(v.len(), FEATURE_COUNT);
        assert!(v.as_slice().iter().all(|x| x.is_finite()));
        assert_eq!(v.fallbacks(), &["nationality", "role", "launch_weather"]);
    }
}
