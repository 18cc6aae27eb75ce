use super::queries::{acknowledge_task, claim_task, get_acknowledgement, insert_task};
use super::{Error, Task};
use crate::services::evaluation::{Broker, RemoteId};
use futures::future::BoxFuture;
use sqlx::PgPool;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Task queue shared with the simulator workers.
///
/// The evolution side inserts tasks and polls for their acknowledgement. Workers claim
/// tasks, run them and acknowledge them with the id under which they recorded samples.
#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
    run_id: Uuid,
    poll_interval: Duration,
}

impl Repository {
    pub fn new(pool: PgPool, run_id: Uuid) -> Self {
        Self {
            pool,
            run_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub async fn submit_task(
        &self,
        robot_name: &str,
        description: &str,
        life_timeout: f64,
    ) -> Result<i64, Error> {
        insert_task(&self.pool, self.run_id, robot_name, description, life_timeout).await
    }

    /// Waits until a worker acknowledged the task. Never returns for a task nobody claims.
    #[instrument(level = "debug", skip(self))]
    pub async fn wait_for_acknowledgement(&self, task_id: i64) -> Result<RemoteId, Error> {
        loop {
            if let Some(evaluation_robot_id) = get_acknowledgement(&self.pool, task_id).await? {
                return Ok(evaluation_robot_id);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    pub async fn claim_task(&self) -> Result<Option<Task>, Error> {
        claim_task(&self.pool).await
    }

    pub async fn acknowledge_task(
        &self,
        task_id: i64,
        evaluation_robot_id: i64,
    ) -> Result<(), Error> {
        acknowledge_task(&self.pool, task_id, evaluation_robot_id).await
    }
}

impl Broker for Repository {
    fn submit<'a>(
        &'a self,
        robot_name: &'a str,
        description: String,
        life_timeout: f64,
    ) -> BoxFuture<'a, Result<RemoteId, anyhow::Error>> {
        Box::pin(async move {
            let task_id = self
                .submit_task(robot_name, &description, life_timeout)
                .await?;
            tracing::debug!(task_id, "Submitted robot {robot_name}");
            Ok(self.wait_for_acknowledgement(task_id).await?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn it_hands_tasks_to_a_single_worker(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repository = Repository::new(pool, Uuid::now_v7());

        let task_id = repository.submit_task("robot_1", "<robot/>", 30.0).await?;
        let claimed = repository.claim_task().await?.expect("a pending task");
        assert_eq!(claimed.id, task_id);
        assert_eq!(claimed.robot_name, "robot_1");
        assert_eq!(claimed.run_id, repository.run_id());

        assert!(repository.claim_task().await?.is_none());
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn it_resolves_submissions_on_acknowledgement(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repository =
            Repository::new(pool, Uuid::now_v7()).with_poll_interval(Duration::from_millis(10));

        let worker = {
            let repository = repository.clone();
            tokio::spawn(async move {
                loop {
                    if let Some(task) = repository.claim_task().await? {
                        repository.acknowledge_task(task.id, 77).await?;
                        return Ok::<_, Error>(());
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            })
        };

        let remote_id = repository
            .submit("robot_1", "<robot/>".to_string(), 30.0)
            .await?;
        worker.await??;

        assert_eq!(remote_id, 77);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn it_errors_on_unknown_tasks(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repository = Repository::new(pool, Uuid::now_v7());

        let result = repository.acknowledge_task(404, 1).await;

        assert!(matches!(result, Err(Error::NotFound(404))));
        Ok(())
    }
}
