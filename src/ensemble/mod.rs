//! Ensemble methods

mod voting;

pub use voting::SoftVotingEnsemble;
