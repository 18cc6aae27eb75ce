#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Lock error: {0}")]
    Database(#[from] sqlx::Error),
}
