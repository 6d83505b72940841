//! CART decision tree for binary classification

use crate::error::{DiariskError, Result};
use ndarray::{Array1, Array2};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Tree node. Leaves keep the positive-class fraction so the tree yields a
/// real probability instead of a hard label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        /// Positive-class fraction of the training rows in this leaf
        proba: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Gini-criterion decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features sampled per split; `None` considers all
    pub max_features: Option<usize>,
    pub random_state: Option<u64>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(DiariskError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(DiariskError::TrainingError(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(42));

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build(x, y, &indices, 0, &mut importances, &mut rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(self)
    }

    fn positive_fraction(y: &Array1<f64>, indices: &[usize]) -> f64 {
        let positives = indices.iter().filter(|&&i| y[i] >= 0.5).count();
        positives as f64 / indices.len() as f64
    }

    fn gini(p: f64) -> f64 {
        2.0 * p * (1.0 - p)
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let p = Self::positive_fraction(y, indices);

        let should_stop = n_samples < self.min_samples_split
            || self.max_depth.is_some_and(|d| depth >= d)
            || p == 0.0
            || p == 1.0;

        if should_stop {
            return TreeNode::Leaf {
                proba: p,
                n_samples,
            };
        }

        match self.find_best_split(x, y, indices, rng) {
            Some((feature_idx, threshold, gain)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);

                if left_idx.len() < self.min_samples_leaf
                    || right_idx.len() < self.min_samples_leaf
                {
                    return TreeNode::Leaf {
                        proba: p,
                        n_samples,
                    };
                }

                importances[feature_idx] += n_samples as f64 * gain;

                let left = Box::new(self.build(x, y, &left_idx, depth + 1, importances, rng));
                let right = Box::new(self.build(x, y, &right_idx, depth + 1, importances, rng));

                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    n_samples,
                }
            }
            None => TreeNode::Leaf {
                proba: p,
                n_samples,
            },
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n_features = x.ncols();
        let candidate_features: Vec<usize> = match self.max_features {
            Some(m) if m < n_features => sample(rng, n_features, m).into_vec(),
            _ => (0..n_features).collect(),
        };

        let parent_gini = Self::gini(Self::positive_fraction(y, indices));
        let n = indices.len() as f64;

        let mut best: Option<(usize, f64, f64)> = None;

        for &feature_idx in &candidate_features {
            let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let mut left_count = 0usize;
                let mut left_pos = 0usize;
                let mut right_count = 0usize;
                let mut right_pos = 0usize;

                for &i in indices {
                    if x[[i, feature_idx]] <= threshold {
                        left_count += 1;
                        if y[i] >= 0.5 {
                            left_pos += 1;
                        }
                    } else {
                        right_count += 1;
                        if y[i] >= 0.5 {
                            right_pos += 1;
                        }
                    }
                }

                if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                    continue;
                }

                let left_gini = Self::gini(left_pos as f64 / left_count as f64);
                let right_gini = Self::gini(right_pos as f64 / right_count as f64);
                let weighted = (left_count as f64 * left_gini + right_count as f64 * right_gini) / n;
                let gain = parent_gini - weighted;

                if gain > 0.0 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best
    }

    fn proba_one(&self, node: &TreeNode, sample: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { proba, .. } => *proba,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    self.proba_one(left, sample)
                } else {
                    self.proba_one(right, sample)
                }
            }
        }
    }

    /// Class-1 probability: the training positive fraction of the reached leaf
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(DiariskError::ModelNotFitted)?;
        let probs: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let sample: Vec<f64> = row.iter().copied().collect();
                self.proba_one(root, &sample)
            })
            .collect();
        Ok(Array1::from_vec(probs))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        (
            array![
                [1.0, 5.0],
                [2.0, 4.0],
                [3.0, 6.0],
                [7.0, 1.0],
                [8.0, 2.0],
                [9.0, 0.5],
            ],
            array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        )
    }

    #[test]
    fn test_perfect_split_on_separable_data() {
        let (x, y) = separable();
        let mut tree = DecisionTreeClassifier::new().with_max_depth(3);
        tree.fit(&x, &y).unwrap();
        let preds = tree.predict(&x).unwrap();
        assert_eq!(preds, y);
    }

    #[test]
    fn test_leaf_proba_is_class_fraction() {
        // depth 0 forces a single leaf: proba = overall positive rate
        let (x, y) = separable();
        let mut tree = DecisionTreeClassifier::new().with_max_depth(0);
        tree.fit(&x, &y).unwrap();
        let proba = tree.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| (p - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_importances_normalized() {
        let (x, y) = separable();
        let mut tree = DecisionTreeClassifier::new().with_max_depth(3);
        tree.fit(&x, &y).unwrap();
        let imp = tree.feature_importances().unwrap();
        assert!((imp.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_depth_limit_respected() {
        let (x, y) = separable();
        let mut tree = DecisionTreeClassifier::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();
        if let Some(TreeNode::Split { left, right, .. }) = &tree.root {
            assert!(matches!(**left, TreeNode::Leaf { .. }));
            assert!(matches!(**right, TreeNode::Leaf { .. }));
        } else {
            panic!("expected a split at the root");
        }
    }
}
