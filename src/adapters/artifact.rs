//! Artifact adapter: Implementation of `ModelStore` on the local filesystem.
//!
//! Layout inside the model directory:
//! - `model.json`: the serialized model
//! - `model.sha256`: lowercase hex SHA-256 of `model.json`
//!
//! Both files are written to a temporary name and renamed into place, so a
//! crash mid-write never leaves a digest pointing at a partial artifact.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::ports::{ArtifactInfo, ModelStore};

const MODEL_FILE: &str = "model.json";
const DIGEST_FILE: &str = "model.sha256";

/// Error type for artifact operations.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact digest missing for {0}")]
    MissingDigest(PathBuf),

    #[error("Artifact digest mismatch (expected {expected}, found {actual})")]
    DigestMismatch { expected: String, actual: String },
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}

fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// JSON model artifact store rooted at a directory.
#[derive(Debug, Clone)]
pub struct JsonModelStore {
    dir: PathBuf,
}

impl JsonModelStore {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    #[must_use]
    pub fn digest_path(&self) -> PathBuf {
        self.dir.join(DIGEST_FILE)
    }

    fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
        move |source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).map_err(Self::io_err(&tmp))?;
        fs::rename(&tmp, path).map_err(Self::io_err(path))
    }
}

impl ModelStore for JsonModelStore {
    type Error = ArtifactError;

    fn save(&self, bytes: &[u8]) -> Result<ArtifactInfo, Self::Error> {
        fs::create_dir_all(&self.dir).map_err(Self::io_err(&self.dir))?;

        let digest = sha256_hex(bytes);
        // Remove the old digest first; a model without a digest is never loaded.
        let digest_path = self.digest_path();
        if digest_path.exists() {
            fs::remove_file(&digest_path).map_err(Self::io_err(&digest_path))?;
        }
        Self::write_atomic(&self.model_path(), bytes)?;
        Self::write_atomic(&digest_path, format!("{digest}\n").as_bytes())?;

        tracing::info!(
            "Saved model artifact to {} ({} bytes)",
            self.model_path().display(),
            bytes.len()
        );
        Ok(ArtifactInfo {
            sha256: digest,
            size_bytes: bytes.len(),
        })
    }

    fn load(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let model_path = self.model_path();
        if !model_path.exists() {
            return Ok(None);
        }

        let digest_path = self.digest_path();
        if !digest_path.exists() {
            return Err(ArtifactError::MissingDigest(digest_path));
        }

        let bytes = fs::read(&model_path).map_err(Self::io_err(&model_path))?;
        let expected = fs::read_to_string(&digest_path).map_err(Self::io_err(&digest_path))?;
        let expected = expected.trim().to_ascii_lowercase();
        let actual = sha256_hex(&bytes);

        if !constant_time_eq_str(&expected, &actual) {
            return Err(ArtifactError::DigestMismatch { expected, actual });
        }

        tracing::debug!("Verified model artifact {}", model_path.display());
        Ok(Some(bytes))
    }

    fn exists(&self) -> bool {
        self.model_path().exists() && self.digest_path().exists()
    }

    fn delete(&self) -> Result<(), Self::Error> {
        for path in [self.model_path(), self.digest_path()] {
            if path.exists() {
                fs::remove_file(&path).map_err(Self::io_err(&path))?;
            }
        }
        Ok(())
    }
}
