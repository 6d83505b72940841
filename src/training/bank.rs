//! Candidate model bank

use super::adaboost::AdaBoostClassifier;
use super::decision_tree::DecisionTreeClassifier;
use super::gradient_boosting::GradientBoostingClassifier;
use super::knn::KnnClassifier;
use super::logistic::LogisticRegression;
use super::mlp::MlpClassifier;
use super::random_forest::RandomForestClassifier;
use super::svm::SvmClassifier;
use super::RANDOM_SEED;
use crate::ensemble::SoftVotingEnsemble;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A classifier tied to its family, as trained and persisted per scenario.
/// The voting variant carries the soft-voting ensemble built from the top
/// candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CandidateModel {
    Logistic(LogisticRegression),
    Knn(KnnClassifier),
    RandomForest(RandomForestClassifier),
    GradientBoosting(GradientBoostingClassifier),
    AdaBoost(AdaBoostClassifier),
    Svm(SvmClassifier),
    Mlp(MlpClassifier),
    DecisionTree(DecisionTreeClassifier),
    Voting(SoftVotingEnsemble),
}

impl CandidateModel {
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            CandidateModel::Logistic(m) => m.fit(x, y).map(|_| ()),
            CandidateModel::Knn(m) => m.fit(x, y).map(|_| ()),
            CandidateModel::RandomForest(m) => m.fit(x, y).map(|_| ()),
            CandidateModel::GradientBoosting(m) => m.fit(x, y).map(|_| ()),
            CandidateModel::AdaBoost(m) => m.fit(x, y).map(|_| ()),
            CandidateModel::Svm(m) => m.fit(x, y).map(|_| ()),
            CandidateModel::Mlp(m) => m.fit(x, y).map(|_| ()),
            CandidateModel::DecisionTree(m) => m.fit(x, y).map(|_| ()),
            CandidateModel::Voting(m) => m.fit(x, y).map(|_| ()),
        }
    }

    /// Class-1 probability
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            CandidateModel::Logistic(m) => m.predict_proba(x),
            CandidateModel::Knn(m) => m.predict_proba(x),
            CandidateModel::RandomForest(m) => m.predict_proba(x),
            CandidateModel::GradientBoosting(m) => m.predict_proba(x),
            CandidateModel::AdaBoost(m) => m.predict_proba(x),
            CandidateModel::Svm(m) => m.predict_proba(x),
            CandidateModel::Mlp(m) => m.predict_proba(x),
            CandidateModel::DecisionTree(m) => m.predict_proba(x),
            CandidateModel::Voting(m) => m.predict_proba(x),
        }
    }

    /// Discrete prediction at an explicit probability cutoff
    pub fn predict_with_threshold(
        &self,
        x: &Array2<f64>,
        threshold: f64,
    ) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= threshold { 1.0 } else { 0.0 }))
    }

    /// Validation accuracy at the default 0.5 cutoff
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let preds = self.predict_with_threshold(x, 0.5)?;
        Ok(super::accuracy_of(y, &preds))
    }

    /// Capability tag resolved at load time, replacing runtime attribute
    /// probing on the serving side.
    pub fn supports_feature_importance(&self) -> bool {
        matches!(
            self,
            CandidateModel::RandomForest(_)
                | CandidateModel::DecisionTree(_)
                | CandidateModel::AdaBoost(_)
        )
    }

    /// Normalized per-feature importances, for families that expose them
    pub fn feature_importances(&self, n_features: usize) -> Option<Array1<f64>> {
        match self {
            CandidateModel::RandomForest(m) => m.feature_importances().cloned(),
            CandidateModel::DecisionTree(m) => m.feature_importances().cloned(),
            CandidateModel::AdaBoost(m) => m.feature_importances(n_features),
            _ => None,
        }
    }
}

/// A fitted candidate with its roster name
#[derive(Debug, Clone)]
pub struct FittedCandidate {
    pub name: String,
    pub model: CandidateModel,
}

/// The fixed candidate roster, fresh and unfitted, in discovery order.
/// Hyperparameters and seeds are identical for every scenario.
pub fn candidate_roster() -> Vec<(String, CandidateModel)> {
    vec![
        (
            "LR".to_string(),
            CandidateModel::Logistic(LogisticRegression::new().with_alpha(1.0).with_max_iter(1000)),
        ),
        (
            "KNN".to_string(),
            CandidateModel::Knn(KnnClassifier::new(15)),
        ),
        (
            "RF".to_string(),
            CandidateModel::RandomForest(
                RandomForestClassifier::new(100)
                    .with_max_depth(3)
                    .with_random_state(RANDOM_SEED),
            ),
        ),
        (
            "GB".to_string(),
            CandidateModel::GradientBoosting(GradientBoostingClassifier::new(30, 0.1, 2)),
        ),
        (
            "Ada".to_string(),
            CandidateModel::AdaBoost(AdaBoostClassifier::new(100, 0.1)),
        ),
        (
            "SVM".to_string(),
            CandidateModel::Svm(SvmClassifier::new(1.0).with_random_state(RANDOM_SEED)),
        ),
        (
            "MLP".to_string(),
            CandidateModel::Mlp(
                MlpClassifier::new(50)
                    .with_max_iter(1000)
                    .with_random_state(RANDOM_SEED),
            ),
        ),
        (
            "DT".to_string(),
            CandidateModel::DecisionTree(
                DecisionTreeClassifier::new()
                    .with_max_depth(3)
                    .with_random_state(RANDOM_SEED),
            ),
        ),
    ]
}

/// Fit the whole roster. A family that fails to fit is skipped with a
/// warning; the scenario never aborts because one candidate failed.
pub fn fit_candidates(x_train: &Array2<f64>, y_train: &Array1<f64>) -> Vec<FittedCandidate> {
    let mut fitted = Vec::new();
    for (name, mut model) in candidate_roster() {
        match model.fit(x_train, y_train) {
            Ok(()) => fitted.push(FittedCandidate { name, model }),
            Err(e) => warn!(candidate = %name, error = %e, "candidate failed to fit; skipping"),
        }
    }
    fitted
}
