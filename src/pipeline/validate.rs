//! Post-training validation
//!
//! Re-derives the seed-fixed splits from the source CSV, reapplies each
//! scenario's persisted preprocessing, and checks test accuracy against
//! fixed per-scenario pass bars.

use crate::data::{
    feature_matrix, load_training_csv, stratified_three_way, take_rows, take_values,
};
use crate::error::{DiariskError, Result};
use crate::export::{load_artifacts, load_manifest, load_model};
use crate::scenario::ScenarioKey;
use crate::training::metrics::ClassificationMetrics;
use crate::training::RANDOM_SEED;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Validation report file name
pub const REPORT_FILE: &str = "model_validation_report.json";

/// Minimum test accuracy per scenario
pub fn pass_bar(key: ScenarioKey) -> f64 {
    match key {
        ScenarioKey::A => 0.70,
        ScenarioKey::B => 0.65,
        ScenarioKey::C => 0.70,
        ScenarioKey::CNs => 0.65,
    }
}

/// One scenario's validation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioValidation {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub test_precision: f64,
    pub test_recall: f64,
    pub test_f1: f64,
    pub pass_accuracy_threshold: f64,
    pub passed: bool,
}

/// The persisted pass/fail report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed_all: bool,
    pub results: BTreeMap<String, ScenarioValidation>,
}

/// Validate every trained scenario against its pass bar and write the
/// report into the artifact directory.
pub fn run_validation(csv: &Path, artifacts_dir: &Path) -> Result<ValidationReport> {
    let df = load_training_csv(csv)?;
    let y = crate::data::target_vector(&df)?;
    let manifest = load_manifest(artifacts_dir)?;

    let mut results = BTreeMap::new();
    let mut passed_all = true;

    for key in ScenarioKey::ALL {
        let entry = manifest.scenarios.get(key.as_str()).ok_or_else(|| {
            DiariskError::NotConfigured(
                key.as_str().to_string(),
                "missing from the training manifest".to_string(),
            )
        })?;

        let kor: Vec<&str> = entry.features_kor.iter().map(String::as_str).collect();
        let x = feature_matrix(&df, &kor)?;
        let split = stratified_three_way(&y, RANDOM_SEED)?;

        let model = load_model(artifacts_dir, &entry.artifact_name)?;
        let artifacts = load_artifacts(artifacts_dir, &entry.artifact_name, entry.mode)?;

        let x_train = artifacts.transform(&take_rows(&x, &split.train))?;
        let x_test = artifacts.transform(&take_rows(&x, &split.test))?;
        let y_train = take_values(&y, &split.train);
        let y_test = take_values(&y, &split.test);

        let train_m = ClassificationMetrics::evaluate(&model, &x_train, &y_train, entry.threshold)?;
        let test_m = ClassificationMetrics::evaluate(&model, &x_test, &y_test, entry.threshold)?;

        let bar = pass_bar(key);
        let passed = test_m.accuracy >= bar;
        passed_all = passed_all && passed;

        info!(
            scenario = %key,
            test_accuracy = test_m.accuracy,
            bar,
            passed,
            "scenario validated"
        );

        results.insert(
            key.as_str().to_string(),
            ScenarioValidation {
                train_accuracy: train_m.accuracy,
                test_accuracy: test_m.accuracy,
                test_precision: test_m.precision,
                test_recall: test_m.recall,
                test_f1: test_m.f1,
                pass_accuracy_threshold: bar,
                passed,
            },
        );
    }

    let report = ValidationReport {
        passed_all,
        results,
    };

    let json = serde_json::to_string_pretty(&report)?;
    fs::write(artifacts_dir.join(REPORT_FILE), json)?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_bars() {
        assert_eq!(pass_bar(ScenarioKey::A), 0.70);
        assert_eq!(pass_bar(ScenarioKey::B), 0.65);
        assert_eq!(pass_bar(ScenarioKey::C), 0.70);
        assert_eq!(pass_bar(ScenarioKey::CNs), 0.65);
    }
}
