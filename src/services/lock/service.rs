use sqlx::{PgPool, postgres::PgAdvisoryLock};
use tracing::instrument;

/// Postgres advisory locks keyed by experiment, so that only one process drives a run.
#[derive(Clone)]
pub struct Service {
    pool: PgPool,
}

impl Service {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs `f` while holding the lock on `key`, waiting for other holders to release it.
    #[instrument(level = "debug", skip(self, f))]
    pub async fn lock_while<F, Fut, T>(&self, key: &str, f: F) -> Result<T, super::Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lock = PgAdvisoryLock::new(key);
        let conn = self.pool.acquire().await?;
        let acquired = lock.acquire(conn).await?;
        tracing::debug!("Acquired experiment lock");

        let ret = f().await;

        acquired.release_now().await?;
        Ok(ret)
    }
}
