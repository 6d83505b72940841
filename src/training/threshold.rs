//! Decision threshold tuning

use super::accuracy_of;
use super::bank::CandidateModel;
use crate::error::Result;
use ndarray::{Array1, Array2};

/// Threshold used when no scan is performed
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Scan cutoffs 0.30..0.70 in steps of 0.01 and keep the one with the
/// highest validation accuracy; the first-found cutoff wins ties.
pub fn tune_threshold(
    model: &CandidateModel,
    x_valid: &Array2<f64>,
    y_valid: &Array1<f64>,
) -> Result<f64> {
    let probs = model.predict_proba(x_valid)?;

    let mut best_th = DEFAULT_THRESHOLD;
    let mut best_acc = -1.0;

    for step in 30..70 {
        let th = step as f64 / 100.0;
        let preds: Array1<f64> = probs.mapv(|p| if p >= th { 1.0 } else { 0.0 });
        let acc = accuracy_of(y_valid, &preds);
        if acc > best_acc {
            best_acc = acc;
            best_th = th;
        }
    }

    Ok(best_th)
}
