//! Adapters layer: Concrete implementations of ports.
//!
//! - `csv_source`: historical mission tables via the `csv` crate
//! - `synthetic`: seeded generator used when no table is available
//! - `learners`: base regressors on `ndarray`
//! - `artifact`: JSON model artifacts with SHA-256 verification
//! - `sanitize`: name/secret filtering for logs
//! - `logging`: subscriber setup for the binaries

pub mod artifact;
pub mod csv_source;
pub mod learners;
pub mod logging;
pub mod sanitize;
pub mod synthetic;

pub use artifact::{ArtifactError, JsonModelStore};
pub use csv_source::{CsvDatasetSource, DatasetError};
pub use synthetic::SyntheticDatasetSource;
