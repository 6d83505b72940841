//! AdaBoost over decision stumps

use crate::error::{DiariskError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Single-feature threshold stump predicting in {-1, +1}
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stump {
    feature_idx: usize,
    threshold: f64,
    /// +1.0 if `value <= threshold` predicts the positive class, else -1.0
    polarity: f64,
}

impl Stump {
    fn predict_sample(&self, sample: &[f64]) -> f64 {
        if sample[self.feature_idx] <= self.threshold {
            self.polarity
        } else {
            -self.polarity
        }
    }
}

/// Boosted decision stumps. Labels are mapped to {-1, +1} internally; the
/// class-1 probability is the sigmoid of the weighted stump margin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostClassifier {
    pub n_estimators: usize,
    pub learning_rate: f64,
    stumps: Vec<Stump>,
    alphas: Vec<f64>,
}

impl AdaBoostClassifier {
    pub fn new(n_estimators: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            learning_rate,
            stumps: Vec::new(),
            alphas: Vec::new(),
        }
    }

    /// Weighted-error-minimizing stump over all features and thresholds
    fn fit_stump(x: &Array2<f64>, y_signed: &[f64], weights: &Array1<f64>) -> Stump {
        let n_features = x.ncols();
        let n_samples = x.nrows();

        let mut best_stump = Stump {
            feature_idx: 0,
            threshold: 0.0,
            polarity: 1.0,
        };
        let mut best_error = f64::MAX;

        for f in 0..n_features {
            let col = x.column(f);
            let mut vals: Vec<f64> = col.to_vec();
            vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            vals.dedup();

            for w in vals.windows(2) {
                let threshold = (w[0] + w[1]) / 2.0;

                for polarity in [1.0, -1.0] {
                    let mut error = 0.0;
                    for i in 0..n_samples {
                        let pred = if col[i] <= threshold {
                            polarity
                        } else {
                            -polarity
                        };
                        if pred != y_signed[i] {
                            error += weights[i];
                        }
                    }
                    if error < best_error {
                        best_error = error;
                        best_stump = Stump {
                            feature_idx: f,
                            threshold,
                            polarity,
                        };
                    }
                }
            }
        }
        best_stump
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
                "cannot fit AdaBoost on zero samples".to_string(),
            ));
        }

        let y_signed: Vec<f64> = y.iter().map(|&v| if v >= 0.5 { 1.0 } else { -1.0 }).collect();
        let mut weights = Array1::from_elem(n_samples, 1.0 / n_samples as f64);

        self.stumps.clear();
        self.alphas.clear();

        for _round in 0..self.n_estimators {
            let stump = Self::fit_stump(x, &y_signed, &weights);

            let predictions: Vec<f64> = (0..n_samples)
                .map(|i| {
                    let row: Vec<f64> = x.row(i).iter().copied().collect();
                    stump.predict_sample(&row)
                })
                .collect();

            let mut error = 0.0;
            for i in 0..n_samples {
                if predictions[i] != y_signed[i] {
                    error += weights[i];
                }
            }
            let error = error.clamp(1e-15, 1.0 - 1e-15);

            let alpha = 0.5 * self.learning_rate * ((1.0 - error) / error).ln();

            for i in 0..n_samples {
                weights[i] *= (-alpha * y_signed[i] * predictions[i]).exp();
            }
            let w_sum = weights.sum();
            if w_sum > 0.0 {
                weights /= w_sum;
            }

            self.stumps.push(stump);
            self.alphas.push(alpha);
        }

        Ok(self)
    }

    fn margin(&self, sample: &[f64]) -> f64 {
        self.stumps
            .iter()
            .zip(self.alphas.iter())
            .map(|(stump, &alpha)| alpha * stump.predict_sample(sample))
            .sum()
    }

    /// Class-1 probability: sigmoid of the boosted margin
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.stumps.is_empty() {
            return Err(DiariskError::ModelNotFitted);
        }

        let probs: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let sample: Vec<f64> = row.iter().copied().collect();
                let m = self.margin(&sample);
                1.0 / (1.0 + (-2.0 * m).exp())
            })
            .collect();

        Ok(Array1::from_vec(probs))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Weighted stump usage per feature
    pub fn feature_importances(&self, n_features: usize) -> Option<Array1<f64>> {
        if self.stumps.is_empty() || n_features == 0 {
            return None;
        }
        let mut importances = vec![0.0f64; n_features];
        for (stump, &alpha) in self.stumps.iter().zip(self.alphas.iter()) {
            if stump.feature_idx < n_features {
                importances[stump.feature_idx] += alpha.abs();
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in importances.iter_mut() {
                *v /= total;
            }
        }
        Some(Array1::from_vec(importances))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_adaboost_separable() {
        let x = array![
            [1.0, 2.0],
            [2.0, 3.0],
            [3.0, 4.0],
            [6.0, 7.0],
            [7.0, 8.0],
            [8.0, 9.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = AdaBoostClassifier::new(10, 1.0);
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        assert_eq!(preds, y);
    }

    #[test]
    fn test_margin_sign_matches_prediction() {
        let x = array![[0.0], [1.0], [5.0], [6.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = AdaBoostClassifier::new(20, 0.1);
        model.fit(&x, &y).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba[0] < 0.5);
        assert!(proba[3] > 0.5);
    }

    #[test]
    fn test_importances_sum_to_one() {
        let x = array![[0.0, 9.0], [1.0, 8.0], [5.0, 1.0], [6.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = AdaBoostClassifier::new(5, 1.0);
        model.fit(&x, &y).unwrap();
        let imp = model.feature_importances(2).unwrap();
        assert!((imp.sum() - 1.0).abs() < 1e-9);
    }
}
