//! Dataset loading and matrix extraction
//!
//! The training CSV carries the fixed Korean column schema. Zeros in the
//! clinical measurement columns are recording sentinels and are recoded to
//! NaN before any statistic is computed; NaN then flows through the
//! preprocessing pipelines (clip passthrough, NaN-ignoring scaler fit, KNN
//! imputation, grade-4 fallthrough).

mod split;

pub use split::{stratified_three_way, SplitIndices};

use crate::error::{DiariskError, Result};
use crate::scenario::{SENTINEL_ZERO_COLUMNS, TARGET_COLUMN};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::Path;

/// Load the source CSV and recode sentinel zeros to missing.
///
/// Fails fast if the file or the target column is absent — nothing may be
/// written before the input is known to be usable.
pub fn load_training_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(DiariskError::DataError(format!(
            "source CSV not found: {}",
            path.display()
        )));
    }

    let mut df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    if df.column(TARGET_COLUMN).is_err() {
        return Err(DiariskError::FeatureNotFound(format!(
            "target column '{TARGET_COLUMN}' missing from {}",
            path.display()
        )));
    }

    for col_name in SENTINEL_ZERO_COLUMNS {
        if let Ok(column) = df.column(col_name) {
            let ca = column
                .cast(&DataType::Float64)
                .map_err(|e| DiariskError::DataError(e.to_string()))?;
            let recoded: Float64Chunked = ca
                .f64()
                .map_err(|e| DiariskError::DataError(e.to_string()))?
                .into_iter()
                .map(|opt| opt.filter(|&v| v != 0.0))
                .collect();
            df.with_column(recoded.with_name((*col_name).into()).into_series())?;
        }
    }

    Ok(df)
}

/// Extract named columns into a row-major `Array2<f64>`, preserving missing
/// cells as NaN.
pub fn feature_matrix(df: &DataFrame, col_names: &[&str]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| DiariskError::FeatureNotFound(col_name.to_string()))?;
            let series_f64 = series
                .cast(&DataType::Float64)
                .map_err(|e| DiariskError::DataError(e.to_string()))?;
            let values: Vec<f64> = series_f64
                .f64()
                .map_err(|e| DiariskError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

/// Extract the binary target column as an `Array1<f64>` of 0.0/1.0.
pub fn target_vector(df: &DataFrame) -> Result<Array1<f64>> {
    let series = df
        .column(TARGET_COLUMN)
        .map_err(|_| DiariskError::FeatureNotFound(TARGET_COLUMN.to_string()))?;
    let series_f64 = series
        .cast(&DataType::Float64)
        .map_err(|e| DiariskError::DataError(e.to_string()))?;

    let y: Array1<f64> = series_f64
        .f64()
        .map_err(|e| DiariskError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| match v {
            Some(v) => Ok(v),
            None => Err(DiariskError::DataError(format!(
                "target column '{TARGET_COLUMN}' contains missing values"
            ))),
        })
        .collect::<Result<Vec<f64>>>()?
        .into();

    Ok(y)
}

/// Select rows of a matrix by index
pub fn take_rows(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    let n_cols = x.ncols();
    Array2::from_shape_fn((indices.len(), n_cols), |(i, j)| x[[indices[i], j]])
}

/// Select elements of a vector by index
pub fn take_values(y: &Array1<f64>, indices: &[usize]) -> Array1<f64> {
    Array1::from_iter(indices.iter().map(|&i| y[i]))
}
