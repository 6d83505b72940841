//! Soft-voting ensemble

use crate::error::{DiariskError, Result};
use crate::training::bank::CandidateModel;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Equal-weight soft-voting ensemble: the class-1 probability is the mean of
/// the members' class-1 probabilities.
///
/// Built from the top-ranked candidate specs and refit on the same training
/// matrix the individual candidates saw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftVotingEnsemble {
    members: Vec<CandidateModel>,
    member_names: Vec<String>,
}

impl SoftVotingEnsemble {
    pub fn new(members: Vec<(String, CandidateModel)>) -> Self {
        let (member_names, members) = members.into_iter().unzip();
        Self {
            members,
            member_names,
        }
    }

    pub fn member_names(&self) -> &[String] {
        &self.member_names
    }

    pub fn n_members(&self) -> usize {
        self.members.len()
    }

    /// Refit every member on the training matrix.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if self.members.is_empty() {
            return Err(DiariskError::TrainingError(
                "voting ensemble has no members".to_string(),
            ));
        }
        for member in &mut self.members {
            member.fit(x, y)?;
        }
        Ok(self)
    }

    /// Class-1 probability: equal-weight mean over the members
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.members.is_empty() {
            return Err(DiariskError::ModelNotFitted);
        }

        let mut acc = Array1::<f64>::zeros(x.nrows());
        for member in &self.members {
            acc = acc + member.predict_proba(x)?;
        }
        Ok(acc / self.members.len() as f64)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::bank::CandidateModel;
    use crate::training::logistic::LogisticRegression;
    use crate::training::knn::KnnClassifier;
    use ndarray::array;

    fn members() -> Vec<(String, CandidateModel)> {
        vec![
            (
                "LR".to_string(),
                CandidateModel::Logistic(LogisticRegression::new()),
            ),
            (
                "KNN".to_string(),
                CandidateModel::Knn(KnnClassifier::new(3)),
            ),
        ]
    }

    #[test]
    fn test_ensemble_proba_is_member_mean() {
        let x = array![
            [0.0, 0.0],
            [0.2, 0.1],
            [0.1, 0.3],
            [3.0, 3.1],
            [3.2, 2.9],
            [2.9, 3.2],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut ensemble = SoftVotingEnsemble::new(members());
        ensemble.fit(&x, &y).unwrap();

        let proba = ensemble.predict_proba(&x).unwrap();
        assert_eq!(proba.len(), 6);
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
        // Clear cluster membership should dominate the vote
        assert!(proba[0] < 0.5);
        assert!(proba[5] > 0.5);
    }

    #[test]
    fn test_empty_ensemble_errors() {
        let mut ensemble = SoftVotingEnsemble::new(Vec::new());
        let x = array![[0.0]];
        let y = array![0.0];
        assert!(ensemble.fit(&x, &y).is_err());
    }
}
