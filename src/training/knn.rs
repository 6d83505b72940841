//! K-Nearest Neighbors classifier

use crate::error::{DiariskError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// (distance, label) pair ordered for a max-heap by distance
#[derive(Debug, Clone, Copy)]
struct DistLabel(f64, f64);

impl PartialEq for DistLabel {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for DistLabel {}

impl PartialOrd for DistLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// KNN classifier, euclidean distance, uniform weighting.
///
/// `fit` stores the training matrix; prediction is a parallel scan over
/// test rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnClassifier {
    pub n_neighbors: usize,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl KnnClassifier {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            x_train: None,
            y_train: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(DiariskError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() < self.n_neighbors {
            return Err(DiariskError::TrainingError(format!(
                "KNN needs at least {} training rows, got {}",
                self.n_neighbors,
                x.nrows()
            )));
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(self)
    }

    fn neighbor_labels(&self, sample: &[f64]) -> Vec<f64> {
        let x_train = self.x_train.as_ref().unwrap();
        let y_train = self.y_train.as_ref().unwrap();
        let k = self.n_neighbors;

        let mut heap: BinaryHeap<DistLabel> = BinaryHeap::with_capacity(k + 1);
        for (i, row) in x_train.rows().into_iter().enumerate() {
            let dist: f64 = row
                .iter()
                .zip(sample.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt();
            if heap.len() < k {
                heap.push(DistLabel(dist, y_train[i]));
            } else if let Some(&DistLabel(max_dist, _)) = heap.peek() {
                if dist < max_dist {
                    heap.pop();
                    heap.push(DistLabel(dist, y_train[i]));
                }
            }
        }
        heap.into_iter().map(|DistLabel(_, label)| label).collect()
    }

    /// Class-1 probability: the positive fraction among the k neighbors
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.x_train.is_none() {
            return Err(DiariskError::ModelNotFitted);
        }

        let probs: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row: Vec<f64> = x.row(i).iter().copied().collect();
                let labels = self.neighbor_labels(&row);
                let positives = labels.iter().filter(|&&l| l >= 0.5).count();
                positives as f64 / labels.len() as f64
            })
            .collect();

        Ok(Array1::from_vec(probs))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_knn_separable_clusters() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.0],
            [5.0, 5.0],
            [5.1, 4.9],
            [4.9, 5.1],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = KnnClassifier::new(3);
        model.fit(&x, &y).unwrap();

        let test = array![[0.05, 0.05], [5.05, 5.0]];
        let preds = model.predict(&test).unwrap();
        assert_eq!(preds[0], 0.0);
        assert_eq!(preds[1], 1.0);
    }

    #[test]
    fn test_proba_is_neighbor_fraction() {
        let x = array![[0.0], [1.0], [2.0], [10.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = KnnClassifier::new(3);
        model.fit(&x, &y).unwrap();

        // Neighbors of 1.5 within k=3: {0,1,2} → one positive
        let proba = model.predict_proba(&array![[1.5]]).unwrap();
        assert!((proba[0] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_rows_errors() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 1.0];
        let mut model = KnnClassifier::new(15);
        assert!(model.fit(&x, &y).is_err());
    }
}
