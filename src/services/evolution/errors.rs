use crate::services::{lock, population, recovery};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("A run needs at least one generation")]
    NoGenerations,
    #[error("Population error: {0}")]
    Population(#[from] population::Error),
    #[error("Recovery error: {0}")]
    Recovery(#[from] recovery::Error),
    #[error("Lock error: {0}")]
    Lock(#[from] lock::Error),
    #[error("Experiment error: {0}")]
    Experiment(#[from] anyhow::Error),
}
