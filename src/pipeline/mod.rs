//! Scenario training pipeline
//!
//! Offline, run-to-completion orchestration of the four scenarios: split →
//! mode-specific preprocessing → candidate bank → winner selection →
//! threshold tuning → metrics → artifact persistence. Scenarios share no
//! mutable state and run sequentially.

pub mod validate;

pub use validate::{run_validation, ScenarioValidation, ValidationReport};

use crate::data::{
    feature_matrix, load_training_csv, stratified_three_way, take_rows, take_values,
};
use crate::error::Result;
use crate::export::{ArtifactWriter, Manifest, ManifestEntry, ScenarioArtifacts, SplitMetrics};
use crate::imputation::KnnImputer;
use crate::preprocessing::{ClipBounds, QuantileGrader, StandardScaler};
use crate::scenario::{scenarios, Mode, Scenario};
use crate::training::metrics::ClassificationMetrics;
use crate::training::{fit_candidates, select_winner, tune_threshold, RANDOM_SEED};
use ndarray::{Array1, Array2};
use std::path::PathBuf;
use tracing::info;

/// Training CLI inputs
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub csv: PathBuf,
    pub out_dir: PathBuf,
    pub overwrite_runtime: bool,
}

/// Three preprocessed matrices plus the fitted artifacts for reuse
struct PreprocessedSplits {
    train: Array2<f64>,
    valid: Array2<f64>,
    test: Array2<f64>,
    artifacts: ScenarioArtifacts,
}

/// Detailed mode: clip by training-quartile fences, standardize, impute.
/// Everything is fit on the training subset only.
fn preprocess_detailed(
    x_train: &Array2<f64>,
    x_valid: &Array2<f64>,
    x_test: &Array2<f64>,
) -> Result<PreprocessedSplits> {
    let clip_bounds = ClipBounds::fit(x_train)?;
    let train_clipped = clip_bounds.transform(x_train)?;
    let valid_clipped = clip_bounds.transform(x_valid)?;
    let test_clipped = clip_bounds.transform(x_test)?;

    let mut scaler = StandardScaler::new();
    let train_scaled = scaler.fit_transform(&train_clipped)?;
    let valid_scaled = scaler.transform(&valid_clipped)?;
    let test_scaled = scaler.transform(&test_clipped)?;

    let mut imputer = KnnImputer::new(5);
    let train = imputer.fit_transform(&train_scaled)?;
    let valid = imputer.transform(&valid_scaled)?;
    let test = imputer.transform(&test_scaled)?;

    Ok(PreprocessedSplits {
        train,
        valid,
        test,
        artifacts: ScenarioArtifacts::Detailed {
            clip_bounds,
            scaler,
            imputer,
        },
    })
}

/// Simple mode: grade every cell by training-subset quantiles
fn preprocess_simple(
    x_train: &Array2<f64>,
    x_valid: &Array2<f64>,
    x_test: &Array2<f64>,
) -> Result<PreprocessedSplits> {
    let quantiles = QuantileGrader::fit(x_train)?;
    let train = quantiles.transform(x_train)?;
    let valid = quantiles.transform(x_valid)?;
    let test = quantiles.transform(x_test)?;

    Ok(PreprocessedSplits {
        train,
        valid,
        test,
        artifacts: ScenarioArtifacts::Simple { quantiles },
    })
}

fn train_one_scenario(
    scenario: &Scenario,
    x: &Array2<f64>,
    y: &Array1<f64>,
    writer: &ArtifactWriter,
) -> Result<ManifestEntry> {
    let split = stratified_three_way(y, RANDOM_SEED)?;
    info!(
        scenario = %scenario.key,
        train = split.train.len(),
        valid = split.valid.len(),
        test = split.test.len(),
        "split derived"
    );

    let x_train = take_rows(x, &split.train);
    let x_valid = take_rows(x, &split.valid);
    let x_test = take_rows(x, &split.test);
    let y_train = take_values(y, &split.train);
    let y_valid = take_values(y, &split.valid);
    let y_test = take_values(y, &split.test);

    let pre = match scenario.mode {
        Mode::Detailed => preprocess_detailed(&x_train, &x_valid, &x_test)?,
        Mode::Simple => preprocess_simple(&x_train, &x_valid, &x_test)?,
    };

    let fitted = fit_candidates(&pre.train, &y_train);
    info!(scenario = %scenario.key, candidates = fitted.len(), "bank fitted");

    let outcome = select_winner(fitted, &pre.train, &y_train, &pre.valid, &y_valid)?;
    let threshold = tune_threshold(&outcome.winner, &pre.valid, &y_valid)?;

    let metrics = SplitMetrics {
        train: ClassificationMetrics::evaluate(&outcome.winner, &pre.train, &y_train, threshold)?,
        valid: ClassificationMetrics::evaluate(&outcome.winner, &pre.valid, &y_valid, threshold)?,
        test: ClassificationMetrics::evaluate(&outcome.winner, &pre.test, &y_test, threshold)?,
    };

    writer.write_scenario(scenario, &outcome.winner, &pre.artifacts)?;

    info!(
        scenario = %scenario.key,
        winner = %outcome.winner_name,
        threshold,
        test_accuracy = metrics.test.accuracy,
        "scenario trained"
    );

    Ok(ManifestEntry {
        artifact_name: scenario.artifact_name.to_string(),
        mode: scenario.mode,
        features_eng: scenario.features_eng.iter().map(|s| s.to_string()).collect(),
        features_kor: scenario.features_kor().iter().map(|s| s.to_string()).collect(),
        winner_model: outcome.winner_name,
        threshold,
        metrics,
        candidates_valid_accuracy: outcome.ranking,
    })
}

/// Train all four scenarios and persist their artifacts plus the manifest.
pub fn train_scenarios(opts: &TrainOptions) -> Result<Manifest> {
    let df = load_training_csv(&opts.csv)?;
    let y = crate::data::target_vector(&df)?;
    let writer = ArtifactWriter::new(&opts.out_dir)?;

    let mut manifest = Manifest::new();

    for scenario in scenarios() {
        let kor = scenario.features_kor();
        let x = feature_matrix(&df, &kor)?;
        let entry = train_one_scenario(&scenario, &x, &y, &writer)?;
        manifest.scenarios.insert(scenario.key.as_str().to_string(), entry);
    }

    if opts.overwrite_runtime {
        manifest.compat = Some(writer.overwrite_runtime()?);
    }

    writer.write_manifest(&manifest)?;
    info!(out_dir = %opts.out_dir.display(), "manifest written");

    Ok(manifest)
}
