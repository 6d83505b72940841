//! Integration test: end-to-end training, validation, registry, predictor

use diarisk::export::{load_artifacts, load_manifest, load_model};
use diarisk::inference::{predict, ModelRegistry, PredictRequest};
use diarisk::pipeline::{run_validation, train_scenarios, TrainOptions};
use diarisk::scenario::{Mode, ScenarioKey};
use ndarray::Array2;
use std::fs;
use std::path::PathBuf;

/// Deterministic 160-row source CSV in the fixed Korean schema. Glucose,
/// BMI, and age separate the classes; a few zero glucose readings exercise
/// the sentinel-missing path.
fn write_source_csv(dir: &PathBuf) -> PathBuf {
    let n = 160;
    let mut csv = String::from("임신횟수,혈당,혈압,피부두께,인슐린,BMI,나이,당뇨\n");
    for i in 0..n {
        let label = usize::from(i >= n / 2);
        let pregnancies = (i % 9) as f64;
        let glucose = if i % 23 == 0 {
            0.0 // sentinel: recoded to missing by the loader
        } else {
            85.0 + 45.0 * label as f64 + (i % 13) as f64
        };
        let blood_pressure = 65.0 + (i % 20) as f64;
        let skin_thickness = 18.0 + (i % 15) as f64;
        let insulin = 70.0 + (i % 90) as f64;
        let bmi = 23.0 + 7.0 * label as f64 + (i % 7) as f64 * 0.4;
        let age = 25.0 + (i % 25) as f64 + 12.0 * label as f64;
        csv.push_str(&format!(
            "{pregnancies},{glucose},{blood_pressure},{skin_thickness},{insulin},{bmi},{age},{label}\n"
        ));
    }

    let path = dir.join("source.csv");
    fs::write(&path, csv).unwrap();
    path
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("diarisk_e2e_{tag}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_train_validate_serve_roundtrip() {
    let dir = temp_dir("main");
    let csv = write_source_csv(&dir);
    let out_dir = dir.join("artifacts");

    // ── Train ──────────────────────────────────────────────────────────
    let manifest = train_scenarios(&TrainOptions {
        csv: csv.clone(),
        out_dir: out_dir.clone(),
        overwrite_runtime: true,
    })
    .unwrap();

    assert_eq!(manifest.scenarios.len(), 4);
    for key in ScenarioKey::ALL {
        let entry = manifest.scenarios.get(key.as_str()).unwrap();
        assert!((0.30..0.70).contains(&entry.threshold), "{key}");
        assert!(!entry.candidates_valid_accuracy.is_empty());
        // Ranking is descending and the winner heads it
        assert_eq!(entry.candidates_valid_accuracy[0].score, {
            entry
                .candidates_valid_accuracy
                .iter()
                .map(|r| r.score)
                .fold(f64::NEG_INFINITY, f64::max)
        });
        assert_eq!(entry.winner_model, entry.candidates_valid_accuracy[0].name);
    }

    // compat map recorded when --overwrite-runtime is set
    let compat = manifest.compat.as_ref().unwrap();
    assert_eq!(compat.get("model_sugar.json").map(String::as_str), Some("A"));
    assert!(out_dir.join("model_sugar.json").exists());
    assert!(out_dir.join("model_no_sugar.json").exists());

    // Persisted manifest reloads identically in shape
    let reloaded = load_manifest(&out_dir).unwrap();
    assert_eq!(reloaded.scenarios.len(), 4);

    // ── Artifact round trip: identical predictions after reload ────────
    let entry = manifest.scenarios.get("A").unwrap();
    let model = load_model(&out_dir, &entry.artifact_name).unwrap();
    let artifacts = load_artifacts(&out_dir, &entry.artifact_name, entry.mode).unwrap();

    let held_out = Array2::from_shape_vec((1, 4), vec![2.0, 130.0, 29.0, 45.0]).unwrap();
    let pre = artifacts.transform(&held_out).unwrap();
    let p_before = model.predict_proba(&pre).unwrap();

    let model2 = load_model(&out_dir, &entry.artifact_name).unwrap();
    let artifacts2 = load_artifacts(&out_dir, &entry.artifact_name, entry.mode).unwrap();
    let pre2 = artifacts2.transform(&held_out).unwrap();
    let p_after = model2.predict_proba(&pre2).unwrap();
    assert_eq!(p_before, p_after, "round-tripped predictions must match bit-for-bit");

    // ── Validation CLI: re-derived splits, persisted report ────────────
    let report = run_validation(&csv, &out_dir).unwrap();
    assert_eq!(report.results.len(), 4);
    assert!(out_dir.join("model_validation_report.json").exists());
    // Clean synthetic clusters should clear every pass bar
    assert!(report.passed_all, "validation failed: {report:?}");

    // ── Registry + single-row predictor ────────────────────────────────
    let registry = ModelRegistry::load(&out_dir).unwrap();
    assert_eq!(registry.len(), 4);

    let record = registry.resolve(Mode::Detailed, true).unwrap();
    assert_eq!(record.key, ScenarioKey::A);
    let record = registry.resolve(Mode::Simple, false).unwrap();
    assert_eq!(record.key, ScenarioKey::CNs);

    let request = PredictRequest {
        pregnancies: Some(3.0),
        glucose: Some(150.0),
        bmi: Some(32.0),
        age: Some(55.0),
        ..Default::default()
    };
    let response = predict(&registry, Mode::Detailed, &request).unwrap();
    assert_eq!(response.scenario, "A");
    assert!((0.0..=1.0).contains(&response.probability));
    assert!(response.prediction == 0 || response.prediction == 1);
    assert_eq!(response.input.len(), 4);

    // Simple mode with a missing feature: the grade-4 fallthrough handles it
    let sparse = PredictRequest {
        age: Some(60.0),
        bmi: Some(35.0),
        ..Default::default()
    };
    let response = predict(&registry, Mode::Simple, &sparse).unwrap();
    assert_eq!(response.scenario, "C_NS");

    // No inputs at all is rejected
    assert!(predict(&registry, Mode::Detailed, &PredictRequest::default()).is_err());

    // Out-of-range input is rejected before inference
    let bad = PredictRequest {
        glucose: Some(5000.0),
        ..Default::default()
    };
    assert!(predict(&registry, Mode::Detailed, &bad).is_err());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_training_is_deterministic_across_runs() {
    let dir = temp_dir("determinism");
    let csv = write_source_csv(&dir);

    let run = |out: &str| {
        let out_dir = dir.join(out);
        train_scenarios(&TrainOptions {
            csv: csv.clone(),
            out_dir,
            overwrite_runtime: false,
        })
        .unwrap()
    };

    let a = run("run_a");
    let b = run("run_b");

    for key in ScenarioKey::ALL {
        let ea = a.scenarios.get(key.as_str()).unwrap();
        let eb = b.scenarios.get(key.as_str()).unwrap();
        assert_eq!(ea.winner_model, eb.winner_model, "{key}");
        assert_eq!(ea.threshold, eb.threshold, "{key}");
        assert_eq!(ea.metrics.test.accuracy, eb.metrics.test.accuracy, "{key}");
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_csv_fails_before_writing_artifacts() {
    let dir = temp_dir("missing_csv");
    let out_dir = dir.join("artifacts");

    let result = train_scenarios(&TrainOptions {
        csv: dir.join("nope.csv"),
        out_dir: out_dir.clone(),
        overwrite_runtime: false,
    });

    assert!(result.is_err());
    assert!(!out_dir.exists(), "no partial artifacts may be written");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_target_column_is_fatal() {
    let dir = temp_dir("missing_target");
    let path = dir.join("no_target.csv");
    fs::write(&path, "혈당,BMI\n100,25\n120,30\n").unwrap();

    let result = train_scenarios(&TrainOptions {
        csv: path,
        out_dir: dir.join("artifacts"),
        overwrite_runtime: false,
    });
    assert!(result.is_err());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_registry_reports_not_configured_for_missing_scenario() {
    let dir = temp_dir("not_configured");
    let csv = write_source_csv(&dir);
    let out_dir = dir.join("artifacts");

    train_scenarios(&TrainOptions {
        csv,
        out_dir: out_dir.clone(),
        overwrite_runtime: false,
    })
    .unwrap();

    // Remove scenario C's model and quantiles: no legacy fallback exists
    // for simple mode, so the registry must skip it and resolve() must
    // report a clear not-configured condition.
    fs::remove_file(out_dir.join("c_simple_sugar_model.json")).unwrap();
    fs::remove_file(out_dir.join("c_simple_sugar_quantiles.json")).unwrap();

    let registry = ModelRegistry::load(&out_dir).unwrap();
    assert_eq!(registry.len(), 3);

    let err = registry.resolve(Mode::Simple, true).unwrap_err();
    assert!(err.to_string().contains("not configured"), "{err}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_registry_legacy_fallback_for_detailed_scenario() {
    let dir = temp_dir("legacy");
    let csv = write_source_csv(&dir);
    let out_dir = dir.join("artifacts");

    train_scenarios(&TrainOptions {
        csv,
        out_dir: out_dir.clone(),
        overwrite_runtime: true,
    })
    .unwrap();

    // Drop scenario A's own model; its preprocessing files remain and the
    // legacy model_sugar artifact exists, so A stays servable at the
    // default threshold.
    fs::remove_file(out_dir.join("a_detail_sugar_model.json")).unwrap();

    let registry = ModelRegistry::load(&out_dir).unwrap();
    let record = registry.resolve(Mode::Detailed, true).unwrap();
    assert_eq!(record.winner_model, "legacy default");
    assert_eq!(record.threshold, 0.5);

    let _ = fs::remove_dir_all(&dir);
}
