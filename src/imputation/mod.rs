//! Missing value imputation

mod knn;

pub use knn::KnnImputer;

/// Missing-cell sentinel check shared by the imputer and its callers
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}
