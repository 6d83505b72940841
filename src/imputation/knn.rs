//! KNN-based imputation
//!
//! Fills missing cells with the mean of the k nearest complete training
//! rows, measured by NaN-skipping euclidean distance in the standardized
//! feature space.

use super::is_missing;
use crate::error::{DiariskError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Ordered (distance, row) pair for the neighbor heap
#[derive(Debug, Clone, Copy)]
struct DistanceIdx(f64, usize);

impl PartialEq for DistanceIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for DistanceIdx {}

impl PartialOrd for DistanceIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max heap by distance: the farthest kept neighbor is popped first
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// k-nearest-neighbor imputer, uniform weighting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnImputer {
    n_neighbors: usize,
    /// Complete training rows, stored at fit time
    complete_data: Option<Array2<f64>>,
    /// Per-feature means over the complete rows, used when no finite-distance
    /// neighbor exists
    feature_means: Option<Array1<f64>>,
}

impl KnnImputer {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            complete_data: None,
            feature_means: None,
        }
    }

    /// Fit on the training subset only: retain its complete rows.
    pub fn fit(&mut self, x_train: &Array2<f64>) -> Result<&mut Self> {
        let complete_rows: Vec<usize> = x_train
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| !row.iter().any(|&v| is_missing(v)))
            .map(|(i, _)| i)
            .collect();

        if complete_rows.is_empty() {
            return Err(DiariskError::PreprocessingError(
                "no complete rows available for KNN imputation".to_string(),
            ));
        }

        let n_features = x_train.ncols();
        let mut complete_data = Array2::zeros((complete_rows.len(), n_features));
        for (i, &row_idx) in complete_rows.iter().enumerate() {
            for j in 0..n_features {
                complete_data[[i, j]] = x_train[[row_idx, j]];
            }
        }

        let feature_means = complete_data.mean_axis(ndarray::Axis(0)).ok_or_else(|| {
            DiariskError::PreprocessingError("failed to compute feature means".to_string())
        })?;

        self.complete_data = Some(complete_data);
        self.feature_means = Some(feature_means);
        Ok(self)
    }

    /// Fill every missing cell of `x`.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let data = self
            .complete_data
            .as_ref()
            .ok_or(DiariskError::ModelNotFitted)?;

        if x.ncols() != data.ncols() {
            return Err(DiariskError::ShapeError {
                expected: format!("{} columns", data.ncols()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut result = x.clone();
        let n_features = x.ncols();
        let mut row_buf: Vec<f64> = Vec::with_capacity(n_features);

        for (row_idx, row) in x.rows().into_iter().enumerate() {
            if !row.iter().any(|&v| is_missing(v)) {
                continue;
            }

            row_buf.clear();
            row_buf.extend(row.iter().copied());

            let neighbors = self.find_neighbors(&row_buf);
            for j in 0..n_features {
                if is_missing(row_buf[j]) {
                    result[[row_idx, j]] = self.impute_value(&neighbors, j);
                }
            }
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, x_train: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x_train)?;
        self.transform(x_train)
    }

    /// Euclidean distance over the coordinates observed in both rows
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let mut count = 0usize;
        let mut accum = 0.0f64;
        for (&ai, &bi) in a.iter().zip(b.iter()) {
            if is_missing(ai) || is_missing(bi) {
                continue;
            }
            count += 1;
            let d = ai - bi;
            accum += d * d;
        }
        if count == 0 {
            return f64::INFINITY;
        }
        (accum / count as f64).sqrt()
    }

    fn find_neighbors(&self, sample: &[f64]) -> Vec<usize> {
        let data = self.complete_data.as_ref().unwrap();
        let k = self.n_neighbors;
        let mut heap: BinaryHeap<DistanceIdx> = BinaryHeap::with_capacity(k + 1);

        for (i, row) in data.rows().into_iter().enumerate() {
            let dist = match row.as_slice() {
                Some(s) => Self::distance(sample, s),
                None => {
                    let row_vec: Vec<f64> = row.iter().copied().collect();
                    Self::distance(sample, &row_vec)
                }
            };

            if dist.is_finite() {
                if heap.len() < k {
                    heap.push(DistanceIdx(dist, i));
                } else if let Some(&DistanceIdx(max_dist, _)) = heap.peek() {
                    if dist < max_dist {
                        heap.pop();
                        heap.push(DistanceIdx(dist, i));
                    }
                }
            }
        }

        heap.into_iter().map(|DistanceIdx(_, i)| i).collect()
    }

    fn impute_value(&self, neighbors: &[usize], feature_idx: usize) -> f64 {
        let data = self.complete_data.as_ref().unwrap();
        if neighbors.is_empty() {
            return self
                .feature_means
                .as_ref()
                .map(|m| m[feature_idx])
                .unwrap_or(0.0);
        }
        let sum: f64 = neighbors.iter().map(|&i| data[[i, feature_idx]]).sum();
        sum / neighbors.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_all_missing_cells() {
        let data = Array2::from_shape_vec(
            (6, 2),
            vec![
                1.0,
                10.0,
                2.0,
                20.0,
                3.0,
                30.0,
                4.0,
                40.0,
                f64::NAN,
                25.0,
                2.5,
                f64::NAN,
            ],
        )
        .unwrap();

        let mut imputer = KnnImputer::new(3);
        let result = imputer.fit_transform(&data).unwrap();

        assert!(!result.iter().any(|&v| v.is_nan()));
        assert!(result[[4, 0]] >= 1.0 && result[[4, 0]] <= 4.0);
        assert!(result[[5, 1]] >= 10.0 && result[[5, 1]] <= 40.0);
    }

    #[test]
    fn test_complete_rows_untouched() {
        let data =
            Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut imputer = KnnImputer::new(2);
        let result = imputer.fit_transform(&data).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_all_missing_row_falls_back_to_means() {
        let data = Array2::from_shape_vec(
            (4, 2),
            vec![0.0, 0.0, 2.0, 2.0, 4.0, 4.0, f64::NAN, f64::NAN],
        )
        .unwrap();
        let mut imputer = KnnImputer::new(2);
        let result = imputer.fit_transform(&data).unwrap();
        assert!((result[[3, 0]] - 2.0).abs() < 1e-12);
        assert!((result[[3, 1]] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_complete_rows_errors() {
        let data = Array2::from_shape_vec((2, 2), vec![1.0, f64::NAN, f64::NAN, 2.0]).unwrap();
        let mut imputer = KnnImputer::new(2);
        assert!(imputer.fit(&data).is_err());
    }

    #[test]
    fn test_transform_before_fit_errors() {
        let imputer = KnnImputer::new(2);
        let data = Array2::zeros((1, 2));
        assert!(matches!(
            imputer.transform(&data),
            Err(DiariskError::ModelNotFitted)
        ));
    }
}
