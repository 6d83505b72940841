//! Single-row prediction

use super::features::feature_range;
use super::registry::ModelRegistry;
use crate::error::{DiariskError, Result};
use crate::scenario::Mode;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One prediction request. Every field is optional; features the resolved
/// scenario does not use are ignored, and absent scenario features are left
/// missing for the scenario's own preprocessing to handle (imputation in
/// detailed mode, the grade-4 fallthrough in simple mode).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    pub pregnancies: Option<f64>,
    pub glucose: Option<f64>,
    pub blood_pressure: Option<f64>,
    pub skin_thickness: Option<f64>,
    pub insulin: Option<f64>,
    pub bmi: Option<f64>,
    pub pedigree: Option<f64>,
    pub age: Option<f64>,
}

impl PredictRequest {
    fn get(&self, name: &str) -> Option<f64> {
        match name {
            "pregnancies" => self.pregnancies,
            "glucose" => self.glucose,
            "blood_pressure" => self.blood_pressure,
            "skin_thickness" => self.skin_thickness,
            "insulin" => self.insulin,
            "bmi" => self.bmi,
            "pedigree" => self.pedigree,
            "age" => self.age,
            _ => None,
        }
    }

    /// All user-supplied (name, value) pairs
    fn provided(&self) -> Vec<(&'static str, f64)> {
        super::features::FEATURE_NAMES
            .iter()
            .filter_map(|&name| self.get(name).map(|v| (name, v)))
            .collect()
    }
}

/// Prediction outcome returned to the (out-of-scope) transport layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    /// 1 = at risk, 0 = within normal range
    pub prediction: u8,
    /// Class-1 probability, rounded to 4 decimals
    pub probability: f64,
    pub label: String,
    pub scenario: String,
    pub threshold: f64,
    /// Echo of the user-supplied inputs
    pub input: BTreeMap<String, f64>,
}

/// Run one inference pass: validate ranges, resolve the scenario from
/// (mode, glucose present), apply the persisted preprocessing to the single
/// row, compare the class-1 probability against the scenario threshold.
pub fn predict(
    registry: &ModelRegistry,
    mode: Mode,
    request: &PredictRequest,
) -> Result<PredictResponse> {
    let provided = request.provided();
    if provided.is_empty() {
        return Err(DiariskError::InvalidInput(
            "at least one input feature is required".to_string(),
        ));
    }

    for (name, value) in &provided {
        if let Some((min_v, max_v)) = feature_range(name) {
            if *value < min_v || *value > max_v {
                return Err(DiariskError::InvalidInput(format!(
                    "{name} must be within {min_v} ~ {max_v}, got {value}"
                )));
            }
        }
    }

    let record = registry.resolve(mode, request.glucose.is_some())?;

    // At least one of the scenario's own features must be supplied
    let active = record
        .features_eng
        .iter()
        .filter(|f| request.get(f).is_some())
        .count();
    if active == 0 {
        return Err(DiariskError::InvalidInput(format!(
            "none of the scenario's features were provided (expected one of: {})",
            record.features_eng.join(", ")
        )));
    }

    let n_features = record.features_eng.len();
    let mut row = Array2::from_elem((1, n_features), f64::NAN);
    for (j, feature) in record.features_eng.iter().enumerate() {
        if let Some(v) = request.get(feature) {
            row[[0, j]] = v;
        }
    }

    let preprocessed = record.artifacts.transform(&row)?;
    let proba = record.model.predict_proba(&preprocessed)?;
    let probability = proba[0];
    let prediction = u8::from(probability >= record.threshold);

    let label = if prediction == 1 {
        "당뇨 위험".to_string()
    } else {
        "정상 범위".to_string()
    };

    let input: BTreeMap<String, f64> = provided
        .into_iter()
        .map(|(name, v)| (name.to_string(), v))
        .collect();

    Ok(PredictResponse {
        prediction,
        probability: (probability * 10_000.0).round() / 10_000.0,
        label,
        scenario: record.key.as_str().to_string(),
        threshold: record.threshold,
        input,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_is_rejected_shape() {
        let request = PredictRequest::default();
        assert!(request.provided().is_empty());
    }

    #[test]
    fn test_provided_collects_set_fields() {
        let request = PredictRequest {
            glucose: Some(120.0),
            age: Some(40.0),
            ..Default::default()
        };
        let provided = request.provided();
        assert_eq!(provided.len(), 2);
        assert!(provided.contains(&("glucose", 120.0)));
    }
}
