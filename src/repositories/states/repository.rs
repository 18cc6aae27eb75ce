use super::Error;
use super::queries::{get_states, insert_state};
use crate::models::{StateSample, Trajectory};
use crate::services::evaluation::{RemoteId, ResultStore};
use futures::future::BoxFuture;
use sqlx::PgPool;
use tracing::instrument;

/// Samples recorded by the simulator, keyed by the evaluation robot id and run marker.
#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
}

impl Repository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reads one evaluation run on a dedicated connection, released on every path.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_trajectory(
        &self,
        evaluation_robot_id: i64,
        run_marker: i32,
    ) -> Result<Trajectory, Error> {
        let mut conn = self.pool.acquire().await?;
        let samples = get_states(&mut *conn, evaluation_robot_id, run_marker).await?;
        Ok(Trajectory::new(samples))
    }

    pub async fn record_states(
        &self,
        evaluation_robot_id: i64,
        run_marker: i32,
        samples: &[StateSample],
    ) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        for sample in samples {
            insert_state(&mut *tx, evaluation_robot_id, run_marker, sample).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

impl ResultStore for Repository {
    fn query(
        &self,
        remote_id: RemoteId,
        run_marker: i32,
    ) -> BoxFuture<'_, Result<Trajectory, anyhow::Error>> {
        Box::pin(async move { Ok(self.get_trajectory(remote_id, run_marker).await?) })
    }
}
