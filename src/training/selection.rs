//! Winner selection

use super::bank::{CandidateModel, FittedCandidate};
use crate::ensemble::SoftVotingEnsemble;
use crate::error::{DiariskError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Display name of the top-3 soft-voting ensemble in rankings and manifests
pub const ENSEMBLE_NAME: &str = "Voting Ensemble (Top 3 Mix)";

/// One row of the manifest's candidate ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub name: String,
    pub score: f64,
}

/// The scenario's chosen model plus the full ranking for the manifest
#[derive(Debug)]
pub struct SelectionOutcome {
    pub winner: CandidateModel,
    pub winner_name: String,
    pub ranking: Vec<RankedCandidate>,
}

/// Score every fitted candidate by validation accuracy, add a soft-voting
/// ensemble of the top 3 refit on the training matrix, and pick the single
/// best. Ties resolve to the earliest-discovered entry (the sort is stable
/// over discovery order, ensemble last).
pub fn select_winner(
    fitted: Vec<FittedCandidate>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_valid: &Array2<f64>,
    y_valid: &Array1<f64>,
) -> Result<SelectionOutcome> {
    if fitted.is_empty() {
        return Err(DiariskError::TrainingError(
            "no candidate survived fitting".to_string(),
        ));
    }

    let mut scored: Vec<(String, CandidateModel, f64)> = Vec::with_capacity(fitted.len() + 1);
    for candidate in fitted {
        let score = candidate.model.score(x_valid, y_valid)?;
        scored.push((candidate.name, candidate.model, score));
    }

    // Rank the individuals to pick the ensemble's members
    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by(|&a, &b| {
        scored[b]
            .2
            .partial_cmp(&scored[a].2)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let top_n = order.len().min(3);
    let members: Vec<(String, CandidateModel)> = order[..top_n]
        .iter()
        .map(|&i| (scored[i].0.clone(), scored[i].1.clone()))
        .collect();

    let mut ensemble = SoftVotingEnsemble::new(members);
    ensemble.fit(x_train, y_train)?;
    let ensemble_model = CandidateModel::Voting(ensemble);
    let ensemble_score = ensemble_model.score(x_valid, y_valid)?;
    scored.push((ENSEMBLE_NAME.to_string(), ensemble_model, ensemble_score));

    // Final ranking; stable sort keeps discovery order on ties
    scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    let ranking: Vec<RankedCandidate> = scored
        .iter()
        .map(|(name, _, score)| RankedCandidate {
            name: name.clone(),
            score: *score,
        })
        .collect();

    let (winner_name, winner, winner_score) = {
        let (name, model, score) = scored.swap_remove(0);
        (name, model, score)
    };

    info!(winner = %winner_name, score = winner_score, "winner selected");

    Ok(SelectionOutcome {
        winner,
        winner_name,
        ranking,
    })
}
