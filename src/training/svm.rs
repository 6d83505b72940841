//! RBF-kernel support vector machine

use crate::error::{DiariskError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Kernel matrices are dense; cap the training size to keep memory bounded
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Binary SVM trained with simplified SMO on an RBF kernel. Labels are
/// mapped to {-1, +1} internally; the class-1 probability is the sigmoid of
/// the decision margin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifier {
    pub c: f64,
    /// RBF width; `None` resolves to 1/n_features at fit time
    pub gamma: Option<f64>,
    pub max_iter: usize,
    pub tol: f64,
    pub random_state: Option<u64>,
    fitted_gamma: f64,
    support_vectors: Option<Array2<f64>>,
    support_coeffs: Option<Array1<f64>>,
    bias: f64,
    is_fitted: bool,
}

impl SvmClassifier {
    pub fn new(c: f64) -> Self {
        Self {
            c,
            gamma: None,
            max_iter: 1000,
            tol: 1e-3,
            random_state: None,
            fitted_gamma: 0.0,
            support_vectors: None,
            support_coeffs: None,
            bias: 0.0,
            is_fitted: false,
        }
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn rbf(gamma: f64, a: &[f64], b: &[f64]) -> f64 {
        let sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
        (-gamma * sq).exp()
    }

    fn kernel_matrix(&self, x: &Array2<f64>, gamma: f64) -> Array2<f64> {
        let n = x.nrows();
        let rows: Vec<Vec<f64>> = x
            .rows()
            .into_iter()
            .map(|r| r.iter().copied().collect())
            .collect();
        Array2::from_shape_fn((n, n), |(i, j)| Self::rbf(gamma, &rows[i], &rows[j]))
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n = x.nrows();
        if n != y.len() {
            return Err(DiariskError::ShapeError {
                expected: format!("y length = {n}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n < 2 {
            return Err(DiariskError::TrainingError(
                "SVM needs at least 2 samples".to_string(),
            ));
        }
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(DiariskError::TrainingError(format!(
                "dataset has {n} samples, exceeding the {MAX_KERNEL_MATRIX_SAMPLES} kernel-matrix cap"
            )));
        }

        let gamma = self.gamma.unwrap_or(1.0 / x.ncols() as f64);
        self.fitted_gamma = gamma;

        let y_signed: Array1<f64> =
            y.iter().map(|&v| if v >= 0.5 { 1.0 } else { -1.0 }).collect();

        let kernel = self.kernel_matrix(x, gamma);
        let mut alphas: Array1<f64> = Array1::zeros(n);
        let mut bias = 0.0;

        let decision = |alphas: &Array1<f64>, bias: f64, i: usize| -> f64 {
            (0..n)
                .map(|t| alphas[t] * y_signed[t] * kernel[[t, i]])
                .sum::<f64>()
                + bias
        };

        let mut rng = match self.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::seed_from_u64(42),
        };

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.max_iter {
            let mut num_changed = 0;

            for i in 0..n {
                let e_i = decision(&alphas, bias, i) - y_signed[i];

                if (y_signed[i] * e_i < -self.tol && alphas[i] < self.c)
                    || (y_signed[i] * e_i > self.tol && alphas[i] > 0.0)
                {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = decision(&alphas, bias, j) - y_signed[j];
                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y_signed[i] != y_signed[j] {
                        (
                            (alphas[j] - alphas[i]).max(0.0),
                            (self.c + alphas[j] - alphas[i]).min(self.c),
                        )
                    } else {
                        (
                            (alphas[i] + alphas[j] - self.c).max(0.0),
                            (alphas[i] + alphas[j]).min(self.c),
                        )
                    };
                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta = 2.0 * kernel[[i, j]] - kernel[[i, i]] - kernel[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] -= y_signed[j] * (e_i - e_j) / eta;
                    alphas[j] = alphas[j].clamp(l, h);
                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }

                    alphas[i] += y_signed[i] * y_signed[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y_signed[i] * (alphas[i] - alpha_i_old) * kernel[[i, i]]
                        - y_signed[j] * (alphas[j] - alpha_j_old) * kernel[[i, j]];
                    let b2 = bias
                        - e_j
                        - y_signed[i] * (alphas[i] - alpha_i_old) * kernel[[i, j]]
                        - y_signed[j] * (alphas[j] - alpha_j_old) * kernel[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < self.c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < self.c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        // Retain support vectors only
        let support: Vec<usize> = (0..n).filter(|&i| alphas[i] > 1e-8).collect();
        if support.is_empty() {
            return Err(DiariskError::TrainingError(
                "SMO produced no support vectors".to_string(),
            ));
        }

        let n_features = x.ncols();
        let sv = Array2::from_shape_fn((support.len(), n_features), |(i, j)| x[[support[i], j]]);
        let coeffs = Array1::from_iter(support.iter().map(|&i| alphas[i] * y_signed[i]));

        self.support_vectors = Some(sv);
        self.support_coeffs = Some(coeffs);
        self.bias = bias;
        self.is_fitted = true;
        Ok(self)
    }

    fn decision_one(&self, sample: &[f64]) -> f64 {
        let sv = self.support_vectors.as_ref().unwrap();
        let coeffs = self.support_coeffs.as_ref().unwrap();
        sv.rows()
            .into_iter()
            .zip(coeffs.iter())
            .map(|(row, &c)| {
                let row_vec: Vec<f64> = row.iter().copied().collect();
                c * Self::rbf(self.fitted_gamma, &row_vec, sample)
            })
            .sum::<f64>()
            + self.bias
    }

    /// Class-1 probability: sigmoid of the decision margin
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(DiariskError::ModelNotFitted);
        }
        let probs: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let sample: Vec<f64> = row.iter().copied().collect();
                let d = self.decision_one(&sample);
                1.0 / (1.0 + (-d).exp())
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

    fn clusters() -> (Array2<f64>, Array1<f64>) {
        (
            array![
                [0.0, 0.0],
                [0.3, 0.2],
                [0.1, 0.4],
                [0.2, 0.1],
                [4.0, 4.2],
                [4.3, 4.0],
                [4.1, 4.4],
                [4.2, 4.1],
            ],
            array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
        )
    }

    #[test]
    fn test_svm_separable() {
        let (x, y) = clusters();
        let mut model = SvmClassifier::new(1.0).with_random_state(42);
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        let correct = preds
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| (*p - *t).abs() < 0.5)
            .count();
        assert!(correct >= 7, "SVM accuracy too low: {correct}/8");
    }

    #[test]
    fn test_seeded_fit_is_deterministic() {
        let (x, y) = clusters();
        let fit = || {
            let mut m = SvmClassifier::new(1.0).with_random_state(42);
            m.fit(&x, &y).unwrap();
            m.predict_proba(&x).unwrap()
        };
        assert_eq!(fit(), fit());
    }

    #[test]
    fn test_proba_in_unit_interval() {
        let (x, y) = clusters();
        let mut model = SvmClassifier::new(1.0).with_random_state(42);
        model.fit(&x, &y).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}
