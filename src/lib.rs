//! diarisk - Diabetes-risk scenario training and serving
//!
//! This crate trains four fixed tabular classification scenarios offline
//! and serves their persisted artifacts through an immutable registry:
//! - [`data`] - CSV ingestion, sentinel recoding, stratified splits
//! - [`preprocessing`] - Quartile clipping, standardization, quantile grading
//! - [`imputation`] - KNN imputation of missing cells
//! - [`training`] - The candidate model bank, winner selection, threshold tuning
//! - [`ensemble`] - Soft-voting ensemble of the top candidates
//! - [`pipeline`] - Scenario orchestration and artifact validation
//! - [`export`] - Artifact and manifest persistence
//! - [`inference`] - The model registry and single-row predictor
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod data;
pub mod ensemble;
pub mod error;
pub mod export;
pub mod imputation;
pub mod inference;
pub mod pipeline;
pub mod preprocessing;
pub mod scenario;
pub mod training;

pub use error::{DiariskError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::data::{stratified_three_way, SplitIndices};
    pub use crate::ensemble::SoftVotingEnsemble;
    pub use crate::error::{DiariskError, Result};
    pub use crate::export::{ArtifactWriter, Manifest, ScenarioArtifacts};
    pub use crate::imputation::KnnImputer;
    pub use crate::inference::{predict, ModelRegistry, PredictRequest, PredictResponse};
    pub use crate::pipeline::{run_validation, train_scenarios, TrainOptions, ValidationReport};
    pub use crate::preprocessing::{ClipBounds, QuantileGrader, StandardScaler};
    pub use crate::scenario::{scenarios, Mode, Scenario, ScenarioKey};
    pub use crate::training::{
        candidate_roster, fit_candidates, select_winner, tune_threshold, CandidateModel,
        ClassificationMetrics,
    };
}
