use crate::models::Genotype;
use crate::repositories::{experiments, states, tasks};
use crate::services::{evaluation, lock};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

pub struct Configuration {
    pub database_url: String,
    pub max_connections: u32,
}

impl Configuration {
    /// Reads `DATABASE_URL` and, optionally, `DATABASE_MAX_CONNECTIONS` from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value.parse()?,
            Err(_) => 10,
        };
        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

/// Everything a run needs from Postgres, sharing one connection pool.
pub struct Bootstrap {
    pool: PgPool,
    run_id: Uuid,
}

impl Bootstrap {
    pub async fn connect(config: Configuration) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            run_id: Uuid::now_v7(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Identifies the tasks this process submits.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Evaluation client wired to the task queue and the simulator's state table.
    pub fn evaluation(&self) -> evaluation::EvaluationClientBuilder {
        let broker = tasks::Repository::new(self.pool.clone(), self.run_id);
        let results = states::Repository::new(self.pool.clone());
        evaluation::EvaluationClient::builder(broker, results)
    }

    pub fn experiment<G>(&self, name: impl Into<String>) -> experiments::Repository<G>
    where
        G: Genotype + Serialize + DeserializeOwned,
    {
        experiments::Repository::new(self.pool.clone(), name)
    }

    pub fn lock(&self) -> lock::Service {
        lock::Service::new(self.pool.clone())
    }
}
