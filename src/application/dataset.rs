//! Dataset use case: load, clean and tabulate historical mission rows.
//!
//! Cleaning happens in two passes. The first parses every raw row, dropping
//! rows that cannot be trusted (no name, no usable label, or a core numeric
//! field that is present but invalid). The second imputes what is missing
//! from column medians, optionally removes IQR outliers, and derives the
//! age/experience/career buckets.

use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::adapters::SyntheticDatasetSource;
use crate::domain::{
    AgeGroup, CareerStage, ExperienceLevel, FeatureVector, MissionProfile, MissionRecord,
    RawRecord, DEFAULT_LAUNCH_WEATHER, DEFAULT_MANUFACTURER, DEFAULT_MISSION_COMPLEXITY,
    DEFAULT_MISSION_TYPE, DEFAULT_ROLE, DEFAULT_SUCCESS_PROBABILITY, FEATURE_COUNT,
};
use crate::ports::DatasetSource;
use crate::{AstroriskError, Result};

/// Accepted range of astronaut ages in training data.
pub const AGE_RANGE: (f64, f64) = (18.0, 80.0);
/// Accepted range of prior mission counts in training data.
pub const MISSIONS_RANGE: (f64, f64) = (0.0, 20.0);
/// Accepted range of accumulated space time (hours) in training data.
pub const SPACE_TIME_RANGE: (f64, f64) = (0.0, 10_000.0);
/// Fewest cleaned rows a real table must keep to be trained on. Smaller
/// tables leave too few rows for the held-out split and the stacking folds.
pub const MIN_TRAINING_ROWS: usize = 10;

const FALLBACK_AGE: f64 = 40.0;
const FALLBACK_NATIONALITY: &str = "Other";

/// Cleaning switches.
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningOptions {
    /// Drop rows outside `iqr_factor` interquartile ranges on age, missions
    /// and space time
    pub remove_outliers: bool,
    pub iqr_factor: f64,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            remove_outliers: true,
            iqr_factor: 1.5,
        }
    }
}

/// What the cleaner did to a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub dropped_missing_name: usize,
    pub dropped_missing_label: usize,
    pub dropped_invalid: usize,
    pub dropped_outliers: usize,
    pub imputed_age: usize,
    pub imputed_missions: usize,
    pub imputed_space_time: usize,
    pub imputed_complexity: usize,
    pub imputed_success_probability: usize,
    pub imputed_military: usize,
    pub rows_kept: usize,
}

impl CleaningReport {
    #[must_use]
    pub fn rows_dropped(&self) -> usize {
        self.dropped_missing_name
            + self.dropped_missing_label
            + self.dropped_invalid
            + self.dropped_outliers
    }
}

/// A row after parsing, before imputation.
struct ParsedRow {
    name: String,
    age: Option<f64>,
    missions: Option<f64>,
    space_time: Option<f64>,
    complexity: Option<f64>,
    success: Option<f64>,
    military: Option<bool>,
    nationality: Option<String>,
    mission_type: Option<String>,
    role: Option<String>,
    launch_weather: Option<String>,
    manufacturer: Option<String>,
    duration_hours: f64,
}

enum Parsed<T> {
    Missing,
    Valid(T),
    Invalid,
}

fn parse_in_range(raw: Option<&str>, (lo, hi): (f64, f64)) -> Parsed<f64> {
    match raw {
        None => Parsed::Missing,
        Some(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && (lo..=hi).contains(&v) => Parsed::Valid(v),
            _ => Parsed::Invalid,
        },
    }
}

fn parse_unit(raw: Option<&str>) -> Option<f64> {
    match parse_in_range(raw, (0.0, 1.0)) {
        Parsed::Valid(v) => Some(v),
        _ => None,
    }
}

fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn text(raw: Option<&String>) -> Option<String> {
    raw.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Linear-interpolated quantile of unsorted values.
fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo]))
}

fn median_of(rows: &[ParsedRow], field: impl Fn(&ParsedRow) -> Option<f64>) -> Option<f64> {
    let present: Vec<f64> = rows.iter().filter_map(field).collect();
    quantile(&present, 0.5)
}

fn parse_row(raw: &RawRecord, report: &mut CleaningReport) -> Option<ParsedRow> {
    let Some(name) = text(raw.name.as_ref()) else {
        report.dropped_missing_name += 1;
        return None;
    };

    let duration_hours = match parse_in_range(raw.duration_hours.as_deref(), (f64::MIN_POSITIVE, f64::MAX)) {
        Parsed::Valid(v) => v,
        _ => {
            report.dropped_missing_label += 1;
            return None;
        }
    };

    let mut core = [
        (raw.age.as_deref(), AGE_RANGE),
        (raw.missions.as_deref(), MISSIONS_RANGE),
        (raw.space_time.as_deref(), SPACE_TIME_RANGE),
    ]
    .map(|(value, range)| parse_in_range(value, range));
    if core.iter().any(|p| matches!(p, Parsed::Invalid)) {
        report.dropped_invalid += 1;
        return None;
    }
    let mut take = |i: usize| match std::mem::replace(&mut core[i], Parsed::Missing) {
        Parsed::Valid(v) => Some(v),
        _ => None,
    };

    Some(ParsedRow {
        name,
        age: take(0),
        missions: take(1).map(f64::round),
        space_time: take(2),
        complexity: parse_unit(raw.mission_complexity.as_deref()),
        success: parse_unit(raw.success_probability.as_deref()),
        military: parse_flag(raw.military.as_deref()),
        nationality: text(raw.nationality.as_ref()),
        mission_type: text(raw.mission_type.as_ref()),
        role: text(raw.role.as_ref()),
        launch_weather: text(raw.launch_weather.as_ref()),
        manufacturer: text(raw.manufacturer.as_ref()),
        duration_hours,
    })
}

/// Keep rows whose value lies within `factor` IQRs of the quartiles.
fn iqr_filter(rows: Vec<MissionRecord>, factor: f64, field: impl Fn(&MissionRecord) -> f64) -> Vec<MissionRecord> {
    let values: Vec<f64> = rows.iter().map(&field).collect();
    let (Some(q1), Some(q3)) = (quantile(&values, 0.25), quantile(&values, 0.75)) else {
        return rows;
    };
    let iqr = q3 - q1;
    let (lo, hi) = (q1 - factor * iqr, q3 + factor * iqr);
    rows.into_iter()
        .filter(|r| {
            let v = field(r);
            v >= lo && v <= hi
        })
        .collect()
}

/// Clean raw rows into training records.
#[must_use]
pub fn clean(raw: &[RawRecord], options: &CleaningOptions) -> (Vec<MissionRecord>, CleaningReport) {
    let mut report = CleaningReport {
        rows_read: raw.len(),
        ..CleaningReport::default()
    };

    let parsed: Vec<ParsedRow> = raw.iter().filter_map(|r| parse_row(r, &mut report)).collect();

    let age_median = median_of(&parsed, |r| r.age).unwrap_or(FALLBACK_AGE);
    let space_time_median = median_of(&parsed, |r| r.space_time).unwrap_or(0.0);
    let complexity_median = median_of(&parsed, |r| r.complexity).unwrap_or(DEFAULT_MISSION_COMPLEXITY);
    let success_median = median_of(&parsed, |r| r.success).unwrap_or(DEFAULT_SUCCESS_PROBABILITY);

    let mut records: Vec<MissionRecord> = parsed
        .into_iter()
        .map(|row| {
            let age = row.age.unwrap_or_else(|| {
                report.imputed_age += 1;
                age_median
            });
            let missions = row.missions.unwrap_or_else(|| {
                report.imputed_missions += 1;
                0.0
            });
            let space_time = row.space_time.unwrap_or_else(|| {
                report.imputed_space_time += 1;
                space_time_median
            });
            let mission_complexity = row.complexity.unwrap_or_else(|| {
                report.imputed_complexity += 1;
                complexity_median
            });
            let success_probability = row.success.unwrap_or_else(|| {
                report.imputed_success_probability += 1;
                success_median
            });
            let military = row.military.unwrap_or_else(|| {
                report.imputed_military += 1;
                false
            });

            let age = age.round() as u32;
            let missions = missions as u32;
            let profile = MissionProfile {
                age,
                nationality: row.nationality.unwrap_or_else(|| FALLBACK_NATIONALITY.to_string()),
                missions,
                space_time,
                mission_type: row.mission_type.unwrap_or_else(|| DEFAULT_MISSION_TYPE.to_string()),
                role: row.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
                launch_weather: row
                    .launch_weather
                    .unwrap_or_else(|| DEFAULT_LAUNCH_WEATHER.to_string()),
                manufacturer: row.manufacturer.unwrap_or_else(|| DEFAULT_MANUFACTURER.to_string()),
                mission_complexity,
                success_probability,
                military,
                experience_level: ExperienceLevel::from_missions(missions).as_str().to_string(),
                age_group: AgeGroup::from_age(age).as_str().to_string(),
                career_stage: CareerStage::from_missions(missions).as_str().to_string(),
            };

            MissionRecord {
                name: row.name,
                profile,
                duration_hours: row.duration_hours,
            }
        })
        .collect();

    if options.remove_outliers && records.len() >= 4 {
        let before = records.len();
        records = iqr_filter(records, options.iqr_factor, |r| f64::from(r.profile.age));
        records = iqr_filter(records, options.iqr_factor, |r| f64::from(r.profile.missions));
        records = iqr_filter(records, options.iqr_factor, |r| r.profile.space_time);
        report.dropped_outliers = before - records.len();
    }

    report.rows_kept = records.len();
    tracing::info!(
        "Cleaned dataset: {} read, {} kept, {} dropped",
        report.rows_read,
        report.rows_kept,
        report.rows_dropped()
    );
    (records, report)
}

/// Cleaned training rows and where they came from.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub records: Vec<MissionRecord>,
    pub report: CleaningReport,
    /// Description of the source that supplied the rows
    pub origin: String,
    /// True when the synthetic generator stood in for the real table
    pub synthetic: bool,
}

/// Load and clean `primary`, falling back to `synthetic` when the primary
/// source is absent, unreadable or keeps fewer than [`MIN_TRAINING_ROWS`].
///
/// # Errors
/// Returns `NoTrainingData` only when the synthetic source is empty too.
pub fn load_training_records<S: DatasetSource>(
    primary: Option<&S>,
    synthetic: &SyntheticDatasetSource,
    options: &CleaningOptions,
) -> Result<TrainingData> {
    if let Some(source) = primary {
        match source.load() {
            Ok(raw) => {
                let (records, report) = clean(&raw, options);
                if records.len() >= MIN_TRAINING_ROWS {
                    return Ok(TrainingData {
                        records,
                        report,
                        origin: source.describe(),
                        synthetic: false,
                    });
                }
                tracing::warn!(
                    "{} has {} usable rows (need {}); using synthetic data",
                    source.describe(),
                    records.len(),
                    MIN_TRAINING_ROWS
                );
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}; using synthetic data", source.describe(), e);
            }
        }
    }

    let raw = match synthetic.load() {
        Ok(raw) => raw,
        Err(never) => match never {},
    };
    let (records, report) = clean(&raw, options);
    if records.is_empty() {
        return Err(AstroriskError::NoTrainingData);
    }
    if records.len() < MIN_TRAINING_ROWS {
        tracing::warn!("Synthetic source kept only {} rows", records.len());
    }
    Ok(TrainingData {
        records,
        report,
        origin: synthetic.describe(),
        synthetic: true,
    })
}

/// Encode records into a feature matrix and target vector.
#[must_use]
pub fn feature_matrix(records: &[MissionRecord]) -> (Array2<f64>, Array1<f64>) {
    let mut x = Array2::<f64>::zeros((records.len(), FEATURE_COUNT));
    for (mut row, record) in x.outer_iter_mut().zip(records) {
        let encoded = FeatureVector::encode(&record.profile);
        for (dst, &src) in row.iter_mut().zip(encoded.as_slice()) {
            *dst = src;
        }
    }
    let y = records.iter().map(|r| r.duration_hours).collect();
    (x, y)
}
