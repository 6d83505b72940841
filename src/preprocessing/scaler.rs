//! Feature-wise standardization

use crate::error::{DiariskError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Zero-mean / unit-variance standardizer.
///
/// Fit statistics ignore missing cells; transform maps a missing cell to
/// NaN (the imputer runs afterwards). A zero-variance feature transforms to
/// exactly 0.0 rather than dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            means: Vec::new(),
            stds: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit per-feature mean and (population) standard deviation on the
    /// training subset only.
    pub fn fit(&mut self, x_train: &Array2<f64>) -> Result<&mut Self> {
        let n_features = x_train.ncols();
        self.means.clear();
        self.stds.clear();

        for j in 0..n_features {
            let observed: Vec<f64> = x_train
                .column(j)
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .collect();
            if observed.is_empty() {
                return Err(DiariskError::PreprocessingError(format!(
                    "feature {j} has no observed values to standardize"
                )));
            }
            let n = observed.len() as f64;
            let mean = observed.iter().sum::<f64>() / n;
            let var = observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            self.means.push(mean);
            self.stds.push(var.sqrt());
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Standardize all cells; NaN stays NaN, zero-variance features map to 0.0.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(DiariskError::ModelNotFitted);
        }
        if x.ncols() != self.means.len() {
            return Err(DiariskError::ShapeError {
                expected: format!("{} columns", self.means.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for j in 0..self.means.len() {
            let mean = self.means[j];
            let std = self.stds[j];
            for v in out.column_mut(j).iter_mut() {
                if v.is_nan() {
                    continue;
                }
                *v = if std == 0.0 { 0.0 } else { (*v - mean) / std };
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x_train: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x_train)?;
        self.transform(x_train)
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stds(&self) -> &[f64] {
        &self.stds
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}
