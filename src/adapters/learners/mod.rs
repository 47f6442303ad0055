//! Base learners implemented on `ndarray`.
//!
//! Every learner implements [`crate::ports::Learner`] and is seeded explicitly,
//! so a fixed seed and table always yield the same fitted model.

mod boosting;
mod forest;
mod mlp;
mod ridge;
mod svr;
mod tree;

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use mlp::{Mlp, MlpParams};
pub use ridge::{solve_linear, Ridge, RidgeParams};
pub use svr::{Svr, SvrParams};
pub use tree::{RegressionTree, TreeParams};
