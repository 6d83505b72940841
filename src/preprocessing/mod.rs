//! Mode-specific preprocessing
//!
//! Detailed mode: quartile clip bounds → standardization → KNN imputation.
//! Simple mode: ordinal 1..=4 grading by training-set quantiles.
//!
//! Every transform is fit on the training subset only and applied unchanged
//! to the validation and test subsets.

mod grader;
mod outlier;
mod scaler;

pub use grader::QuantileGrader;
pub use outlier::ClipBounds;
pub use scaler::StandardScaler;

/// Linear-interpolation percentile over the non-missing values of a slice.
/// Matches the pandas/numpy `linear` method used to derive the original
/// clip bounds and grade cuts.
pub(crate) fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * q;
    let lo = h.floor() as usize;
    let frac = h - lo as f64;
    if lo + 1 < n {
        sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
    } else {
        sorted[n - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_linear_interpolation() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&v, 0.25) - 1.75).abs() < 1e-12);
        assert!((percentile(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!((percentile(&v, 0.75) - 3.25).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_ignores_nan() {
        let v = [1.0, f64::NAN, 3.0];
        assert!((percentile(&v, 0.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_empty_is_nan() {
        assert!(percentile(&[f64::NAN], 0.5).is_nan());
    }
}
