//! Ordinal grading by training-set quantiles

use super::percentile;
use crate::error::{DiariskError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Per-feature p25/p50/p75 cut points mapping every value to a grade in
/// 1..=4.
///
/// A missing value fails every `≤` comparison and therefore grades 4. That
/// fallthrough is load-bearing legacy behavior: deployed simple-mode models
/// were trained on it, so it is preserved and pinned by tests rather than
/// remapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantileGrader {
    cuts: Vec<[f64; 3]>,
}

impl QuantileGrader {
    /// Derive cut points from the training subset only.
    pub fn fit(x_train: &Array2<f64>) -> Result<Self> {
        let n_features = x_train.ncols();
        if x_train.nrows() == 0 {
            return Err(DiariskError::PreprocessingError(
                "cannot fit quantile cuts on an empty matrix".to_string(),
            ));
        }

        let mut cuts = Vec::with_capacity(n_features);
        for j in 0..n_features {
            let col: Vec<f64> = x_train.column(j).to_vec();
            let q1 = percentile(&col, 0.25);
            let q2 = percentile(&col, 0.5);
            let q3 = percentile(&col, 0.75);
            if q1.is_nan() || q2.is_nan() || q3.is_nan() {
                return Err(DiariskError::PreprocessingError(format!(
                    "feature {j} has no observed values in the training subset"
                )));
            }
            cuts.push([q1, q2, q3]);
        }

        Ok(Self { cuts })
    }

    /// Build a grader from externally supplied cut points (serving side).
    pub fn from_cuts(cuts: Vec<[f64; 3]>) -> Self {
        Self { cuts }
    }

    /// Grade a single value against one feature's cuts. NaN grades 4.
    pub fn grade(value: f64, cuts: &[f64; 3]) -> f64 {
        if value <= cuts[0] {
            1.0
        } else if value <= cuts[1] {
            2.0
        } else if value <= cuts[2] {
            3.0
        } else {
            4.0
        }
    }

    /// Grade every cell of a matrix.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.cuts.len() {
            return Err(DiariskError::ShapeError {
                expected: format!("{} columns", self.cuts.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for (j, cuts) in self.cuts.iter().enumerate() {
            for v in out.column_mut(j).iter_mut() {
                *v = Self::grade(*v, cuts);
            }
        }
        Ok(out)
    }

    pub fn feature_cuts(&self, j: usize) -> Option<&[f64; 3]> {
        self.cuts.get(j)
    }

    pub fn n_features(&self) -> usize {
        self.cuts.len()
    }
}
