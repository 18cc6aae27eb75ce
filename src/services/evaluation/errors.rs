use crate::models::EvaluationConfigError;

/// Errors that abort an evaluation instead of degrading it to a failed outcome.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid robot name: {name:?}")]
    InvalidName { name: String },
    #[error("Could not describe robot {name}: {source}")]
    Description {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Evaluation client is stopped")]
    Stopped,
    #[error("Invalid evaluation config: {0}")]
    Config(#[from] EvaluationConfigError),
}
