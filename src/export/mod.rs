//! Artifact persistence
//!
//! Every fitted object serializes to pretty JSON under a scenario-scoped
//! naming convention, plus one shared manifest consumed read-only by the
//! serving layer.

use crate::error::{DiariskError, Result};
use crate::imputation::KnnImputer;
use crate::preprocessing::{ClipBounds, QuantileGrader, StandardScaler};
use crate::scenario::{Mode, Scenario};
use crate::training::bank::CandidateModel;
use crate::training::metrics::ClassificationMetrics;
use crate::training::selection::RankedCandidate;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Shared manifest file name
pub const MANIFEST_FILE: &str = "model_scenarios_meta.json";
/// Legacy single-pair serving artifacts
pub const LEGACY_SUGAR_MODEL: &str = "model_sugar.json";
pub const LEGACY_NO_SUGAR_MODEL: &str = "model_no_sugar.json";

/// Mode-dependent preprocessing bundle. One tag per mode makes the
/// preprocessing an exhaustive match instead of optional-field probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ScenarioArtifacts {
    Detailed {
        clip_bounds: ClipBounds,
        scaler: StandardScaler,
        imputer: KnnImputer,
    },
    Simple {
        quantiles: QuantileGrader,
    },
}

impl ScenarioArtifacts {
    pub fn mode(&self) -> Mode {
        match self {
            ScenarioArtifacts::Detailed { .. } => Mode::Detailed,
            ScenarioArtifacts::Simple { .. } => Mode::Simple,
        }
    }

    /// Apply the persisted preprocessing to a raw feature matrix:
    /// clip → scale → impute, or grade by quantile.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            ScenarioArtifacts::Detailed {
                clip_bounds,
                scaler,
                imputer,
            } => {
                let clipped = clip_bounds.transform(x)?;
                let scaled = scaler.transform(&clipped)?;
                imputer.transform(&scaled)
            }
            ScenarioArtifacts::Simple { quantiles } => quantiles.transform(x),
        }
    }
}

/// Per-split metrics block of a manifest entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitMetrics {
    pub train: ClassificationMetrics,
    pub valid: ClassificationMetrics,
    pub test: ClassificationMetrics,
}

/// One scenario's manifest record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub artifact_name: String,
    pub mode: Mode,
    pub features_eng: Vec<String>,
    pub features_kor: Vec<String>,
    pub winner_model: String,
    pub threshold: f64,
    pub metrics: SplitMetrics,
    pub candidates_valid_accuracy: Vec<RankedCandidate>,
}

/// The shared training manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub scenarios: BTreeMap<String, ManifestEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compat: Option<BTreeMap<String, String>>,
    pub generated_at: DateTime<Utc>,
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            scenarios: BTreeMap::new(),
            compat: None,
            generated_at: Utc::now(),
        }
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).map_err(|e| {
        DiariskError::SerializationError(format!("cannot read {}: {e}", path.display()))
    })?;
    Ok(serde_json::from_str(&json)?)
}

/// Writes one training run's artifacts under a single output directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    out_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir)?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.out_dir.join(file)
    }

    /// Persist the winning model and whichever preprocessing artifacts apply
    pub fn write_scenario(
        &self,
        scenario: &Scenario,
        model: &CandidateModel,
        artifacts: &ScenarioArtifacts,
    ) -> Result<()> {
        let name = scenario.artifact_name;
        write_json(&self.path(&format!("{name}_model.json")), model)?;

        match artifacts {
            ScenarioArtifacts::Detailed {
                clip_bounds,
                scaler,
                imputer,
            } => {
                write_json(&self.path(&format!("{name}_clip_bounds.json")), clip_bounds)?;
                write_json(&self.path(&format!("{name}_scaler.json")), scaler)?;
                write_json(&self.path(&format!("{name}_imputer.json")), imputer)?;
            }
            ScenarioArtifacts::Simple { quantiles } => {
                write_json(&self.path(&format!("{name}_quantiles.json")), quantiles)?;
            }
        }
        Ok(())
    }

    pub fn write_manifest(&self, manifest: &Manifest) -> Result<()> {
        write_json(&self.path(MANIFEST_FILE), manifest)
    }

    /// Copy the detailed-mode scenarios' models over the legacy single-pair
    /// serving artifacts. Returns the compat map recorded in the manifest.
    pub fn overwrite_runtime(&self) -> Result<BTreeMap<String, String>> {
        let a_model: CandidateModel = read_json(&self.path("a_detail_sugar_model.json"))?;
        let b_model: CandidateModel = read_json(&self.path("b_detail_no_sugar_model.json"))?;
        write_json(&self.path(LEGACY_SUGAR_MODEL), &a_model)?;
        write_json(&self.path(LEGACY_NO_SUGAR_MODEL), &b_model)?;

        let mut compat = BTreeMap::new();
        compat.insert(LEGACY_SUGAR_MODEL.to_string(), "A".to_string());
        compat.insert(LEGACY_NO_SUGAR_MODEL.to_string(), "B".to_string());
        Ok(compat)
    }
}

/// Load a scenario's persisted model
pub fn load_model(dir: &Path, artifact_name: &str) -> Result<CandidateModel> {
    read_json(&dir.join(format!("{artifact_name}_model.json")))
}

/// Load a legacy default model by file name
pub fn load_legacy_model(dir: &Path, file: &str) -> Result<CandidateModel> {
    read_json(&dir.join(file))
}

/// Load a scenario's persisted preprocessing bundle
pub fn load_artifacts(dir: &Path, artifact_name: &str, mode: Mode) -> Result<ScenarioArtifacts> {
    match mode {
        Mode::Detailed => {
            let clip_bounds: ClipBounds =
                read_json(&dir.join(format!("{artifact_name}_clip_bounds.json")))?;
            let scaler: StandardScaler =
                read_json(&dir.join(format!("{artifact_name}_scaler.json")))?;
            let imputer: KnnImputer =
                read_json(&dir.join(format!("{artifact_name}_imputer.json")))?;
            Ok(ScenarioArtifacts::Detailed {
                clip_bounds,
                scaler,
                imputer,
            })
        }
        Mode::Simple => {
            let quantiles: QuantileGrader =
                read_json(&dir.join(format!("{artifact_name}_quantiles.json")))?;
            Ok(ScenarioArtifacts::Simple { quantiles })
        }
    }
}

/// Load the shared manifest
pub fn load_manifest(dir: &Path) -> Result<Manifest> {
    read_json(&dir.join(MANIFEST_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::logistic::LogisticRegression;
    use ndarray::array;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("diarisk_export_{tag}_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fitted_detailed_artifacts() -> ScenarioArtifacts {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let clip_bounds = ClipBounds::fit(&x).unwrap();
        let clipped = clip_bounds.transform(&x).unwrap();
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&clipped).unwrap();
        let mut imputer = KnnImputer::new(2);
        imputer.fit(&scaled).unwrap();
        ScenarioArtifacts::Detailed {
            clip_bounds,
            scaler,
            imputer,
        }
    }

    #[test]
    fn test_scenario_roundtrip() {
        let dir = temp_dir("roundtrip");
        let writer = ArtifactWriter::new(&dir).unwrap();

        let scenario = crate::scenario::scenarios().remove(0);
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = CandidateModel::Logistic(LogisticRegression::new());
        model.fit(&x, &y).unwrap();

        let artifacts = fitted_detailed_artifacts();
        writer.write_scenario(&scenario, &model, &artifacts).unwrap();

        let reloaded = load_model(&dir, scenario.artifact_name).unwrap();
        let before = model.predict_proba(&x).unwrap();
        let after = reloaded.predict_proba(&x).unwrap();
        assert_eq!(before, after);

        let reloaded_artifacts =
            load_artifacts(&dir, scenario.artifact_name, Mode::Detailed).unwrap();
        let t_before = artifacts.transform(&x).unwrap();
        let t_after = reloaded_artifacts.transform(&x).unwrap();
        assert_eq!(t_before, t_after);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = temp_dir("manifest");
        let writer = ArtifactWriter::new(&dir).unwrap();

        let mut manifest = Manifest::new();
        manifest.scenarios.insert(
            "A".to_string(),
            ManifestEntry {
                artifact_name: "a_detail_sugar".to_string(),
                mode: Mode::Detailed,
                features_eng: vec!["age".to_string()],
                features_kor: vec!["나이".to_string()],
                winner_model: "LR".to_string(),
                threshold: 0.42,
                metrics: SplitMetrics {
                    train: ClassificationMetrics::from_predictions(
                        &array![1.0, 0.0],
                        &array![1.0, 0.0],
                    ),
                    valid: ClassificationMetrics::from_predictions(
                        &array![1.0, 0.0],
                        &array![1.0, 0.0],
                    ),
                    test: ClassificationMetrics::from_predictions(
                        &array![1.0, 0.0],
                        &array![1.0, 1.0],
                    ),
                },
                candidates_valid_accuracy: vec![RankedCandidate {
                    name: "LR".to_string(),
                    score: 0.9,
                }],
            },
        );

        writer.write_manifest(&manifest).unwrap();
        let reloaded = load_manifest(&dir).unwrap();
        assert_eq!(reloaded.scenarios.len(), 1);
        let entry = &reloaded.scenarios["A"];
        assert_eq!(entry.winner_model, "LR");
        assert!((entry.threshold - 0.42).abs() < 1e-12);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_model_errors() {
        let dir = temp_dir("missing");
        assert!(load_model(&dir, "nope").is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
