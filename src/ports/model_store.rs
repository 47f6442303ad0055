//! Model store port: Trait for persisting trained model artifacts.
//!
//! The store deals in serialized bytes. It owns integrity checking; the
//! application owns the artifact format.

/// Metadata recorded next to a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    /// Hex-encoded SHA-256 of the artifact bytes
    pub sha256: String,
    /// Artifact size in bytes
    pub size_bytes: usize,
}

/// Trait for model artifact persistence.
pub trait ModelStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save an artifact, replacing any previous one.
    ///
    /// # Errors
    /// Returns error if the artifact cannot be written.
    fn save(&self, bytes: &[u8]) -> Result<ArtifactInfo, Self::Error>;

    /// Load the stored artifact after verifying its digest.
    ///
    /// # Returns
    /// `None` if no artifact is stored.
    ///
    /// # Errors
    /// Returns error if the artifact cannot be read or fails verification.
    fn load(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Check if an artifact exists.
    fn exists(&self) -> bool;

    /// Delete the stored artifact.
    ///
    /// # Errors
    /// Returns error if deletion fails.
    fn delete(&self) -> Result<(), Self::Error>;
}
