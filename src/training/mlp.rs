//! Feed-forward network classifier

use crate::error::{DiariskError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// One-hidden-layer MLP: ReLU hidden units, sigmoid output, full-batch
/// gradient descent with L2 weight decay. Weight init is seeded so fits are
/// reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    pub hidden_units: usize,
    pub max_iter: usize,
    pub learning_rate: f64,
    pub alpha: f64,
    pub tol: f64,
    pub random_state: Option<u64>,
    w1: Option<Array2<f64>>,
    b1: Option<Array1<f64>>,
    w2: Option<Array1<f64>>,
    b2: f64,
}

impl MlpClassifier {
    pub fn new(hidden_units: usize) -> Self {
        Self {
            hidden_units: hidden_units.max(1),
            max_iter: 1000,
            learning_rate: 0.01,
            alpha: 1e-4,
            tol: 1e-6,
            random_state: None,
            w1: None,
            b1: None,
            w2: None,
            b2: 0.0,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn sigmoid(v: f64) -> f64 {
        1.0 / (1.0 + (-v).exp())
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
                "cannot fit an MLP on zero samples".to_string(),
            ));
        }

        let mut rng = match self.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::seed_from_u64(42),
        };

        // He-style init scaled by the fan-in
        let scale = (2.0 / n_features as f64).sqrt();
        let h = self.hidden_units;
        let mut w1 = Array2::from_shape_fn((n_features, h), |_| {
            (rng.gen::<f64>() * 2.0 - 1.0) * scale
        });
        let mut b1: Array1<f64> = Array1::zeros(h);
        let out_scale = (2.0 / h as f64).sqrt();
        let mut w2: Array1<f64> =
            Array1::from_shape_fn(h, |_| (rng.gen::<f64>() * 2.0 - 1.0) * out_scale);
        let mut b2 = 0.0;

        let n = n_samples as f64;

        for _epoch in 0..self.max_iter {
            // Forward
            let z1 = x.dot(&w1) + &b1; // (n, h)
            let a1 = z1.mapv(|v| v.max(0.0)); // ReLU
            let z2 = a1.dot(&w2) + b2; // (n,)
            let out = z2.mapv(Self::sigmoid);

            // Backward (cross-entropy + sigmoid → delta is the residual)
            let delta2 = &out - y; // (n,)
            let dw2 = a1.t().dot(&delta2) / n + self.alpha * &w2;
            let db2 = delta2.mean().unwrap_or(0.0);

            let mut delta1 = Array2::zeros((n_samples, h));
            for i in 0..n_samples {
                for j in 0..h {
                    if z1[[i, j]] > 0.0 {
                        delta1[[i, j]] = delta2[i] * w2[j];
                    }
                }
            }
            let dw1 = x.t().dot(&delta1) / n + self.alpha * &w1;
            let db1 = delta1.sum_axis(ndarray::Axis(0)) / n;

            let grad_norm = (dw1.mapv(|v| v * v).sum()
                + dw2.mapv(|v| v * v).sum()
                + db1.mapv(|v| v * v).sum()
                + db2 * db2)
                .sqrt();
            if grad_norm < self.tol {
                break;
            }

            w1 = w1 - self.learning_rate * dw1;
            b1 = b1 - self.learning_rate * db1;
            w2 = w2 - self.learning_rate * dw2;
            b2 -= self.learning_rate * db2;
        }

        self.w1 = Some(w1);
        self.b1 = Some(b1);
        self.w2 = Some(w2);
        self.b2 = b2;
        Ok(self)
    }

    /// Class-1 probability
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let w1 = self.w1.as_ref().ok_or(DiariskError::ModelNotFitted)?;
        let b1 = self.b1.as_ref().ok_or(DiariskError::ModelNotFitted)?;
        let w2 = self.w2.as_ref().ok_or(DiariskError::ModelNotFitted)?;

        let a1 = (x.dot(w1) + b1).mapv(|v| v.max(0.0));
        let z2 = a1.dot(w2) + self.b2;
        Ok(z2.mapv(Self::sigmoid))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}
