//! Candidate model training
//!
//! The fixed roster of binary classifier families fitted per scenario:
//! - Regularized logistic regression
//! - K-Nearest Neighbors (k=15)
//! - Random forest (100 trees, depth 3)
//! - Gradient boosting (30 stages, depth 2)
//! - AdaBoost over decision stumps (100 rounds, learning rate 0.1)
//! - RBF-kernel SVM with probability output (C=1)
//! - One-hidden-layer MLP (50 units)
//! - Decision tree (depth 3)
//!
//! Every family exposes `fit`, a class-1 `predict_proba`, and a discrete
//! `predict`; hyperparameters and seeds are fixed so runs are reproducible.

pub mod adaboost;
pub mod bank;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod knn;
pub mod logistic;
pub mod metrics;
pub mod mlp;
pub mod random_forest;
pub mod selection;
pub mod svm;
pub mod threshold;

pub use adaboost::AdaBoostClassifier;
pub use bank::{candidate_roster, fit_candidates, CandidateModel, FittedCandidate};
pub use decision_tree::DecisionTreeClassifier;
pub use gradient_boosting::GradientBoostingClassifier;
pub use knn::KnnClassifier;
pub use logistic::LogisticRegression;
pub use metrics::ClassificationMetrics;
pub use mlp::MlpClassifier;
pub use random_forest::RandomForestClassifier;
pub use selection::{select_winner, RankedCandidate, SelectionOutcome};
pub use svm::SvmClassifier;
pub use threshold::tune_threshold;

/// Seed shared by every stochastic candidate
pub const RANDOM_SEED: u64 = 42;

/// Accuracy against 0/1 labels for thresholded predictions
pub fn accuracy_of(y_true: &ndarray::Array1<f64>, y_pred: &ndarray::Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}
