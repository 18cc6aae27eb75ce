use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::Level;

// Runs the migrations against DATABASE_URL, read from .env.local when present.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::from_filename(".env.local").ok();
    tracing_subscriber::fmt()
        .pretty()
        .with_thread_ids(true)
        .with_max_level(Level::INFO)
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    fx_durable_evolution::migrations::run_migrations(&pool).await?;
    tracing::info!("Migrations applied");

    Ok(())
}
