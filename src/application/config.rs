//! Runtime configuration from `ASTRORISK_*` environment variables.
//!
//! Every variable is optional. Values that fail to parse are ignored with a
//! warning and the default is kept.

use std::path::PathBuf;

use super::dataset::{CleaningOptions, MIN_TRAINING_ROWS};
use super::ensemble::EnsembleStrategy;
use super::training::TrainingConfig;
use crate::adapters::synthetic::{DEFAULT_SYNTHETIC_ROWS, DEFAULT_SYNTHETIC_SEED};

pub const DATASET_ENV: &str = "ASTRORISK_DATASET";
pub const MODEL_DIR_ENV: &str = "ASTRORISK_MODEL_DIR";
pub const SEED_ENV: &str = "ASTRORISK_SEED";
pub const STRATEGY_ENV: &str = "ASTRORISK_STRATEGY";
pub const TEST_FRACTION_ENV: &str = "ASTRORISK_TEST_FRACTION";
pub const SYNTHETIC_ROWS_ENV: &str = "ASTRORISK_SYNTHETIC_ROWS";
pub const REMOVE_OUTLIERS_ENV: &str = "ASTRORISK_REMOVE_OUTLIERS";

const DEFAULT_DATASET: &str = "data/astronauts.csv";

/// Settings for the whole load / clean / train pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Historical mission table; the synthetic generator stands in if absent
    pub dataset_path: PathBuf,
    /// Directory for the cached model artifact; `None` disables caching
    pub model_dir: Option<PathBuf>,
    pub synthetic_seed: u64,
    pub synthetic_rows: usize,
    pub cleaning: CleaningOptions,
    pub training: TrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            model_dir: None,
            synthetic_seed: DEFAULT_SYNTHETIC_SEED,
            synthetic_rows: DEFAULT_SYNTHETIC_ROWS,
            cleaning: CleaningOptions::default(),
            training: TrainingConfig::default(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn ignored(key: &str, value: &str) {
    tracing::warn!("Ignoring invalid {}={:?}", key, value);
}

impl PipelineConfig {
    /// Load overrides from the process environment (best-effort).
    #[must_use]
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load overrides through `lookup`, which maps a variable name to its value.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup(DATASET_ENV).filter(|v| !v.trim().is_empty()) {
            cfg.dataset_path = PathBuf::from(v.trim());
        }

        if let Some(v) = lookup(MODEL_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            cfg.model_dir = Some(PathBuf::from(v.trim()));
        }

        if let Some(v) = lookup(SEED_ENV) {
            match v.trim().parse::<u64>() {
                Ok(seed) => {
                    cfg.training.seed = seed;
                    cfg.synthetic_seed = seed;
                }
                Err(_) => ignored(SEED_ENV, &v),
            }
        }

        if let Some(v) = lookup(STRATEGY_ENV) {
            match EnsembleStrategy::parse(&v) {
                Some(strategy) => cfg.training.strategy = strategy,
                None => ignored(STRATEGY_ENV, &v),
            }
        }

        if let Some(v) = lookup(TEST_FRACTION_ENV) {
            match v.trim().parse::<f64>() {
                Ok(x) if x.is_finite() && x > 0.0 && x < 1.0 => cfg.training.test_fraction = x,
                _ => ignored(TEST_FRACTION_ENV, &v),
            }
        }

        if let Some(v) = lookup(SYNTHETIC_ROWS_ENV) {
            match v.trim().parse::<usize>() {
                Ok(n) if n >= MIN_TRAINING_ROWS => cfg.synthetic_rows = n,
                _ => ignored(SYNTHETIC_ROWS_ENV, &v),
            }
        }

        if let Some(v) = lookup(REMOVE_OUTLIERS_ENV) {
            match parse_bool(&v) {
                Some(flag) => cfg.cleaning.remove_outliers = flag,
                None => ignored(REMOVE_OUTLIERS_ENV, &v),
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> PipelineConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        PipelineConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        assert_eq!(from_map(&[]), PipelineConfig::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let cfg = from_map(&[
            (DATASET_ENV, "/data/astronauts.csv"),
            (MODEL_DIR_ENV, "/var/lib/astrorisk"),
            (SEED_ENV, "7"),
            (STRATEGY_ENV, "average"),
            (TEST_FRACTION_ENV, "0.25"),
            (SYNTHETIC_ROWS_ENV, "500"),
            (REMOVE_OUTLIERS_ENV, "off"),
        ]);

        assert_eq!(cfg.dataset_path, PathBuf::from("/data/astronauts.csv"));
        assert_eq!(cfg.model_dir, Some(PathBuf::from("/var/lib/astrorisk")));
        assert_eq!(cfg.training.seed, 7);
        assert_eq!(cfg.synthetic_seed, 7);
        assert_eq!(cfg.training.strategy, EnsembleStrategy::Average);
        assert!((cfg.training.test_fraction - 0.25).abs() < 1e-12);
        assert_eq!(cfg.synthetic_rows, 500);
        assert!(!cfg.cleaning.remove_outliers);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let cfg = from_map(&[
            (SEED_ENV, "forty-two"),
            (STRATEGY_ENV, "bagging"),
            (TEST_FRACTION_ENV, "1.5"),
            (SYNTHETIC_ROWS_ENV, "0"),
            (REMOVE_OUTLIERS_ENV, "maybe"),
        ]);
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn test_synthetic_rows_below_training_minimum_ignored() {
        let cfg = from_map(&[(SYNTHETIC_ROWS_ENV, "3")]);
        assert_eq!(cfg.synthetic_rows, DEFAULT_SYNTHETIC_ROWS);
    }
}
