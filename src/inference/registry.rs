//! Immutable model registry

use crate::error::{DiariskError, Result};
use crate::export::{
    load_artifacts, load_legacy_model, load_manifest, load_model, ScenarioArtifacts,
    LEGACY_NO_SUGAR_MODEL, LEGACY_SUGAR_MODEL,
};
use crate::scenario::{Mode, ScenarioKey};
use crate::training::bank::CandidateModel;
use crate::training::threshold::DEFAULT_THRESHOLD;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// One scenario's serving record. The feature-importance capability is a
/// tag resolved at load time; handlers check the tag, never the model shape.
#[derive(Debug, Clone)]
pub struct ModelRecord {
    pub key: ScenarioKey,
    pub artifact_name: String,
    pub mode: Mode,
    pub features_eng: Vec<String>,
    pub model: CandidateModel,
    pub artifacts: ScenarioArtifacts,
    pub threshold: f64,
    pub winner_model: String,
    pub supports_feature_importance: bool,
}

/// Registry of every configured scenario, built once from the artifact
/// directory at process start and passed by reference into request
/// handlers. Read-only after construction.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    records: BTreeMap<ScenarioKey, ModelRecord>,
}

impl ModelRegistry {
    /// Build the registry from a trained artifact directory.
    ///
    /// A scenario whose model file is missing falls back to the legacy
    /// single-pair artifact (`model_sugar` / `model_no_sugar`, threshold
    /// 0.5) when its preprocessing files still exist; otherwise the
    /// scenario is simply absent and `resolve` reports it as not
    /// configured.
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest = load_manifest(dir)?;
        let mut records = BTreeMap::new();

        for key in ScenarioKey::ALL {
            let Some(entry) = manifest.scenarios.get(key.as_str()) else {
                warn!(scenario = %key, "not present in manifest; skipping");
                continue;
            };

            let artifacts = match load_artifacts(dir, &entry.artifact_name, entry.mode) {
                Ok(a) => a,
                Err(e) => {
                    warn!(scenario = %key, error = %e, "preprocessing artifacts unavailable; skipping");
                    continue;
                }
            };

            let (model, threshold, winner_model) = match load_model(dir, &entry.artifact_name) {
                Ok(m) => (m, entry.threshold, entry.winner_model.clone()),
                Err(e) => {
                    let legacy_file = match key {
                        ScenarioKey::A => Some(LEGACY_SUGAR_MODEL),
                        ScenarioKey::B => Some(LEGACY_NO_SUGAR_MODEL),
                        _ => None,
                    };
                    match legacy_file.and_then(|f| load_legacy_model(dir, f).ok()) {
                        Some(m) => {
                            warn!(scenario = %key, "scenario model missing; using legacy default");
                            (m, DEFAULT_THRESHOLD, "legacy default".to_string())
                        }
                        None => {
                            warn!(scenario = %key, error = %e, "no model available; skipping");
                            continue;
                        }
                    }
                }
            };

            let supports_feature_importance = model.supports_feature_importance();
            records.insert(
                key,
                ModelRecord {
                    key,
                    artifact_name: entry.artifact_name.clone(),
                    mode: entry.mode,
                    features_eng: entry.features_eng.clone(),
                    model,
                    artifacts,
                    threshold,
                    winner_model,
                    supports_feature_importance,
                },
            );
        }

        info!(configured = records.len(), "model registry loaded");
        Ok(Self { records })
    }

    /// Look up the scenario for an input mode and glucose availability.
    pub fn resolve(&self, mode: Mode, has_glucose: bool) -> Result<&ModelRecord> {
        let key = match (mode, has_glucose) {
            (Mode::Detailed, true) => ScenarioKey::A,
            (Mode::Detailed, false) => ScenarioKey::B,
            (Mode::Simple, true) => ScenarioKey::C,
            (Mode::Simple, false) => ScenarioKey::CNs,
        };
        self.records.get(&key).ok_or_else(|| {
            DiariskError::NotConfigured(
                key.as_str().to_string(),
                "no artifact bundle loaded for this scenario".to_string(),
            )
        })
    }

    pub fn get(&self, key: ScenarioKey) -> Option<&ModelRecord> {
        self.records.get(&key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
