use crate::models::IndividualId;

/// Errors raised when the persisted state of an experiment cannot be resumed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Snapshot of generation {generation} holds {found} individuals, expected {expected}")]
    SnapshotSize {
        generation: u32,
        expected: usize,
        found: usize,
    },
    #[error("Individual {id} in snapshot of generation {generation} was created after it (roster ends at {roster})")]
    SnapshotFromFuture {
        generation: u32,
        id: IndividualId,
        roster: i64,
    },
    #[error("Generation {generation} expects {roster} individuals, but the last exported id is {last:?}")]
    MissingIndividuals {
        generation: u32,
        roster: i64,
        last: Option<IndividualId>,
    },
    #[error("Individual {last} was exported, but the generation after {generation:?} ends at id {limit}")]
    UnexpectedIndividuals {
        generation: Option<u32>,
        limit: i64,
        last: IndividualId,
    },
    #[error("Record {expected} holds the genotype of individual {found}")]
    MismatchedRecord {
        expected: IndividualId,
        found: IndividualId,
    },
    #[error("Experiment error: {0}")]
    Experiment(#[from] anyhow::Error),
}
