use super::Error;
use super::models::DbIndividual;
use sqlx::PgExecutor;
use tracing::instrument;

/// Inserts an individual, replacing the row of a previous run under the same id.
#[instrument(level = "debug", skip(tx, genotype, parents))]
pub(super) async fn upsert_individual<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
    id: i64,
    genotype: serde_json::Value,
    parents: &[i64],
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO fx_durable_evolution.individuals (experiment, id, genotype, parents)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (experiment, id) DO UPDATE
        SET genotype = EXCLUDED.genotype,
            parents = EXCLUDED.parents,
            outcomes = NULL,
            exported_at = NOW()
        "#,
    )
    .bind(experiment)
    .bind(id)
    .bind(genotype)
    .bind(parents)
    .execute(tx)
    .await?;

    Ok(())
}

/// Returns the number of updated rows.
pub(super) async fn update_outcomes<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
    id: i64,
    outcomes: serde_json::Value,
) -> Result<u64, Error> {
    let result = sqlx::query(
        r#"
        UPDATE fx_durable_evolution.individuals
        SET outcomes = $3
        WHERE experiment = $1 AND id = $2
        "#,
    )
    .bind(experiment)
    .bind(id)
    .bind(outcomes)
    .execute(tx)
    .await?;

    Ok(result.rows_affected())
}

pub(super) async fn upsert_phenotype<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
    individual_id: i64,
    objective: i32,
    description: &str,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO fx_durable_evolution.phenotypes (experiment, individual_id, objective, description)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (experiment, individual_id, objective) DO UPDATE
        SET description = EXCLUDED.description
        "#,
    )
    .bind(experiment)
    .bind(individual_id)
    .bind(objective)
    .bind(description)
    .execute(tx)
    .await?;

    Ok(())
}

pub(super) async fn upsert_behavior<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
    individual_id: i64,
    objective: i32,
    measurements: Option<serde_json::Value>,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO fx_durable_evolution.behaviors (experiment, individual_id, objective, measurements)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (experiment, individual_id, objective) DO UPDATE
        SET measurements = EXCLUDED.measurements
        "#,
    )
    .bind(experiment)
    .bind(individual_id)
    .bind(objective)
    .bind(measurements)
    .execute(tx)
    .await?;

    Ok(())
}

pub(super) async fn delete_snapshot<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
    generation: i32,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        DELETE FROM fx_durable_evolution.snapshots
        WHERE experiment = $1 AND generation = $2
        "#,
    )
    .bind(experiment)
    .bind(generation)
    .execute(tx)
    .await?;

    Ok(())
}

/// Stores the survivors of a generation, keeping the order of `ids`.
#[instrument(level = "debug", skip(tx, ids), fields(num_ids = ids.len()))]
pub(super) async fn insert_snapshot<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
    generation: i32,
    ids: &[i64],
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO fx_durable_evolution.snapshots (experiment, generation, individual_id, position)
        SELECT $1, $2, survivor.id, (survivor.ord - 1)::INTEGER
        FROM UNNEST($3::BIGINT[]) WITH ORDINALITY AS survivor(id, ord)
        "#,
    )
    .bind(experiment)
    .bind(generation)
    .bind(ids)
    .execute(tx)
    .await?;

    Ok(())
}

pub(super) async fn get_snapshot<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
    generation: i32,
) -> Result<Vec<DbIndividual>, Error> {
    let individuals = sqlx::query_as::<_, DbIndividual>(
        r#"
        SELECT
            i.id,
            i.genotype,
            i.parents,
            i.outcomes
        FROM fx_durable_evolution.snapshots s
        JOIN fx_durable_evolution.individuals i
            ON i.experiment = s.experiment AND i.id = s.individual_id
        WHERE s.experiment = $1 AND s.generation = $2
        ORDER BY s.position
        "#,
    )
    .bind(experiment)
    .bind(generation)
    .fetch_all(tx)
    .await?;

    Ok(individuals)
}

pub(super) async fn get_individual<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
    id: i64,
) -> Result<Option<DbIndividual>, Error> {
    let individual = sqlx::query_as::<_, DbIndividual>(
        r#"
        SELECT
            id,
            genotype,
            parents,
            outcomes
        FROM fx_durable_evolution.individuals
        WHERE experiment = $1 AND id = $2
        "#,
    )
    .bind(experiment)
    .bind(id)
    .fetch_optional(tx)
    .await?;

    Ok(individual)
}

pub(super) async fn get_last_snapshot<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
) -> Result<Option<i32>, Error> {
    let generation = sqlx::query_scalar::<_, Option<i32>>(
        r#"
        SELECT MAX(generation)
        FROM fx_durable_evolution.snapshots
        WHERE experiment = $1
        "#,
    )
    .bind(experiment)
    .fetch_one(tx)
    .await?;

    Ok(generation)
}

pub(super) async fn get_last_individual_id<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
) -> Result<Option<i64>, Error> {
    let id = sqlx::query_scalar::<_, Option<i64>>(
        r#"
        SELECT MAX(id)
        FROM fx_durable_evolution.individuals
        WHERE experiment = $1
        "#,
    )
    .bind(experiment)
    .fetch_one(tx)
    .await?;

    Ok(id)
}

/// Deletes every row of `experiment` in one statement.
#[instrument(level = "debug", skip(tx))]
pub(super) async fn delete_experiment<'tx, E: PgExecutor<'tx>>(
    tx: E,
    experiment: &str,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        WITH deleted_snapshots AS (
            DELETE FROM fx_durable_evolution.snapshots WHERE experiment = $1
        ), deleted_behaviors AS (
            DELETE FROM fx_durable_evolution.behaviors WHERE experiment = $1
        ), deleted_phenotypes AS (
            DELETE FROM fx_durable_evolution.phenotypes WHERE experiment = $1
        )
        DELETE FROM fx_durable_evolution.individuals WHERE experiment = $1
        "#,
    )
    .bind(experiment)
    .execute(tx)
    .await?;

    Ok(())
}
