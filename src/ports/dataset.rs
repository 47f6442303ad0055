//! Dataset port: Trait for sources of historical mission rows.
//!
//! Sources return raw text columns; parsing, imputation and filtering belong
//! to the cleaning step so that every source is cleaned the same way.

use crate::domain::RawRecord;

/// A source of raw training rows.
pub trait DatasetSource: Send + Sync {
    /// Error type for load operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short description for logs (path, generator seed, ...).
    fn describe(&self) -> String;

    /// Load every row.
    ///
    /// # Errors
    /// Returns error if the underlying data cannot be read.
    fn load(&self) -> Result<Vec<RawRecord>, Self::Error>;
}
