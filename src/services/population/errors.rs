use crate::models::{IndividualId, SelectionError, SettingsError};
use crate::services::evaluation;

/// Errors that abort a generation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No fitness function configured")]
    FitnessNotConfigured,
    #[error("Individual {id} has {found} phenotypes, but {expected} objectives are configured")]
    PhenotypeCount {
        id: IndividualId,
        expected: usize,
        found: usize,
    },
    #[error("Population has {found} individuals, expected {expected}")]
    PopulationSize { expected: usize, found: usize },
    #[error("Variation changed the id of individual {expected} to {found}")]
    IdentityChanged {
        expected: IndividualId,
        found: IndividualId,
    },
    #[error("Missing strategy: {0}")]
    MissingStrategy(&'static str),
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] evaluation::Error),
    #[error("Experiment error: {0}")]
    Experiment(#[from] anyhow::Error),
}
