use crate::models::IndividualId;

/// Errors that can occur in experiment bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Individual not found: {0}")]
    NotFound(IndividualId),
    #[error("Could not describe individual {id}: {source}")]
    Description {
        id: IndividualId,
        #[source]
        source: anyhow::Error,
    },
}
