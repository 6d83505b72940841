//! IQR-fence outlier clipping

use super::percentile;
use crate::error::{DiariskError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Per-feature clip bounds derived from training-subset quartiles:
/// `lower = Q1 − 1.5·IQR`, `upper = Q3 + 1.5·IQR`.
///
/// Computed once per scenario, applied to every split, persisted for
/// inference. Missing cells pass through clipping unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipBounds {
    bounds: Vec<(f64, f64)>,
}

impl ClipBounds {
    /// Derive bounds from the training subset only.
    pub fn fit(x_train: &Array2<f64>) -> Result<Self> {
        let n_features = x_train.ncols();
        if x_train.nrows() == 0 {
            return Err(DiariskError::PreprocessingError(
                "cannot fit clip bounds on an empty matrix".to_string(),
            ));
        }

        let mut bounds = Vec::with_capacity(n_features);
        for j in 0..n_features {
            let col: Vec<f64> = x_train.column(j).to_vec();
            let q1 = percentile(&col, 0.25);
            let q3 = percentile(&col, 0.75);
            if q1.is_nan() || q3.is_nan() {
                return Err(DiariskError::PreprocessingError(format!(
                    "feature {j} has no observed values in the training subset"
                )));
            }
            let iqr = q3 - q1;
            bounds.push((q1 - 1.5 * iqr, q3 + 1.5 * iqr));
        }

        Ok(Self { bounds })
    }

    /// Clip every value into its feature's fence. NaN passes through.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.bounds.len() {
            return Err(DiariskError::ShapeError {
                expected: format!("{} columns", self.bounds.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for (j, &(lo, up)) in self.bounds.iter().enumerate() {
            for v in out.column_mut(j).iter_mut() {
                if !v.is_nan() {
                    *v = v.clamp(lo, up);
                }
            }
        }
        Ok(out)
    }

    /// Bounds for one feature
    pub fn feature_bounds(&self, j: usize) -> Option<(f64, f64)> {
        self.bounds.get(j).copied()
    }

    pub fn n_features(&self) -> usize {
        self.bounds.len()
    }
}
