//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and its collaborators (data sources, learning
//! algorithms, artifact storage).

mod dataset;
mod model_store;
mod regressor;

pub use dataset::DatasetSource;
pub use model_store::{ArtifactInfo, ModelStore};
pub use regressor::{check_training_data, LearnError, Learner, Regressor};
