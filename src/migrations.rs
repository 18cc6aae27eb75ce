use sqlx::{Acquire, Postgres};
use tracing::instrument;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

pub const SCHEMA_NAME: &str = "fx_durable_evolution";

/// Runs database migrations for the fx_durable_evolution schema.
///
/// Creates the schema if it doesn't exist and runs all embedded migrations with the
/// migration bookkeeping kept inside that schema.
///
/// # Errors
///
/// Returns `sqlx::Error` if schema creation or migration execution fails.
#[instrument(level = "debug", skip(conn))]
pub async fn run_migrations<'a, A>(conn: A) -> Result<(), sqlx::Error>
where
    A: Acquire<'a, Database = Postgres>,
{
    let mut tx = conn.begin().await?;

    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {SCHEMA_NAME};"))
        .execute(&mut *tx)
        .await?;

    sqlx::query(&format!("SET LOCAL search_path TO {SCHEMA_NAME};"))
        .execute(&mut *tx)
        .await?;

    MIGRATOR.run(&mut *tx).await?;

    tx.commit().await?;

    Ok(())
}
