//! Random forest classifier

use super::decision_tree::DecisionTreeClassifier;
use crate::error::{DiariskError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Bagged ensemble of gini trees with per-split feature subsampling
/// (√n_features). Trees are trained in parallel with per-tree derived seeds
/// so results are reproducible regardless of thread scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub random_state: Option<u64>,
    trees: Vec<DecisionTreeClassifier>,
    feature_importances: Option<Array1<f64>>,
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            max_depth: None,
            min_samples_leaf: 1,
            random_state: None,
            trees: Vec::new(),
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(DiariskError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(DiariskError::TrainingError(
                "cannot fit a forest on zero samples".to_string(),
            ));
        }

        let base_seed = self.random_state.unwrap_or(42);
        let max_features = (n_features as f64).sqrt().round().max(1.0) as usize;
        let max_depth = self.max_depth;
        let min_samples_leaf = self.min_samples_leaf;

        let trees: Result<Vec<DecisionTreeClassifier>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                // Bootstrap sample with replacement
                let indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let x_boot =
                    Array2::from_shape_fn((n_samples, n_features), |(i, j)| x[[indices[i], j]]);
                let y_boot = Array1::from_iter(indices.iter().map(|&i| y[i]));

                let mut tree = DecisionTreeClassifier::new()
                    .with_min_samples_leaf(min_samples_leaf)
                    .with_max_features(max_features)
                    .with_random_state(seed);
                if let Some(depth) = max_depth {
                    tree = tree.with_max_depth(depth);
                }
                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;

        // Forest importances: mean of per-tree importances
        let mut importances = Array1::<f64>::zeros(n_features);
        let mut counted = 0usize;
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                importances = importances + imp;
                counted += 1;
            }
        }
        if counted > 0 {
            importances /= counted as f64;
        }
        self.feature_importances = Some(importances);

        Ok(self)
    }

    /// Class-1 probability: mean of the trees' leaf probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(DiariskError::ModelNotFitted);
        }

        let mut acc = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            acc = acc + tree.predict_proba(x)?;
        }
        Ok(acc / self.trees.len() as f64)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn clusters() -> (Array2<f64>, Array1<f64>) {
        (
            array![
                [0.0, 0.2],
                [0.3, 0.1],
                [0.1, 0.4],
                [0.2, 0.3],
                [5.0, 5.2],
                [5.3, 5.1],
                [5.1, 5.4],
                [5.2, 5.3],
            ],
            array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
        )
    }

    #[test]
    fn test_forest_fits_and_predicts() {
        let (x, y) = clusters();
        let mut forest = RandomForestClassifier::new(20)
            .with_max_depth(3)
            .with_random_state(42);
        forest.fit(&x, &y).unwrap();
        assert_eq!(forest.n_trees(), 20);
        let preds = forest.predict(&x).unwrap();
        assert_eq!(preds, y);
    }

    #[test]
    fn test_same_seed_same_probabilities() {
        let (x, y) = clusters();
        let fit = |seed| {
            let mut f = RandomForestClassifier::new(10)
                .with_max_depth(3)
                .with_random_state(seed);
            f.fit(&x, &y).unwrap();
            f.predict_proba(&x).unwrap()
        };
        assert_eq!(fit(42), fit(42));
    }

    #[test]
    fn test_proba_in_unit_interval() {
        let (x, y) = clusters();
        let mut forest = RandomForestClassifier::new(10).with_max_depth(2);
        forest.fit(&x, &y).unwrap();
        let proba = forest.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}
