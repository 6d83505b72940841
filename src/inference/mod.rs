//! Artifact serving
//!
//! Stateless per-request inference over immutable, pre-fitted artifacts: an
//! explicit registry constructed once at process start replaces any hidden
//! module-level model state.

mod features;
mod predictor;
mod registry;

pub use features::{feature_label, feature_range, FEATURE_NAMES};
pub use predictor::{predict, PredictRequest, PredictResponse};
pub use registry::{ModelRecord, ModelRegistry};
