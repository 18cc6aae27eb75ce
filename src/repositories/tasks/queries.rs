use super::Error;
use super::models::DbTask;
use super::Task;
use sqlx::PgExecutor;
use tracing::instrument;
use uuid::Uuid;

#[instrument(level = "debug", skip(tx, description), fields(run_id = %run_id))]
pub(super) async fn insert_task<'tx, E: PgExecutor<'tx>>(
    tx: E,
    run_id: Uuid,
    robot_name: &str,
    description: &str,
    life_timeout: f64,
) -> Result<i64, Error> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO fx_durable_evolution.evaluation_tasks (
            run_id,
            robot_name,
            description,
            life_timeout
        )
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(run_id)
    .bind(robot_name)
    .bind(description)
    .bind(life_timeout)
    .fetch_one(tx)
    .await?;

    Ok(id)
}

/// The simulator id of an acknowledged task, `None` while it is pending.
pub(super) async fn get_acknowledgement<'tx, E: PgExecutor<'tx>>(
    tx: E,
    task_id: i64,
) -> Result<Option<i64>, Error> {
    sqlx::query_scalar::<_, Option<i64>>(
        r#"
        SELECT evaluation_robot_id
        FROM fx_durable_evolution.evaluation_tasks
        WHERE id = $1
        "#,
    )
    .bind(task_id)
    .fetch_optional(tx)
    .await?
    .ok_or(Error::NotFound(task_id))
}

/// Claims the oldest unclaimed task. Concurrent workers never claim the same task.
#[instrument(level = "debug", skip(tx))]
pub(super) async fn claim_task<'tx, E: PgExecutor<'tx>>(tx: E) -> Result<Option<Task>, Error> {
    let task = sqlx::query_as::<_, DbTask>(
        r#"
        UPDATE fx_durable_evolution.evaluation_tasks
        SET claimed_at = NOW()
        WHERE id = (
            SELECT id
            FROM fx_durable_evolution.evaluation_tasks
            WHERE claimed_at IS NULL
            ORDER BY submitted_at, id
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        RETURNING
            id,
            run_id,
            robot_name,
            description,
            life_timeout,
            submitted_at
        "#,
    )
    .fetch_optional(tx)
    .await?;

    Ok(task.map(Task::from))
}

#[instrument(level = "debug", skip(tx))]
pub(super) async fn acknowledge_task<'tx, E: PgExecutor<'tx>>(
    tx: E,
    task_id: i64,
    evaluation_robot_id: i64,
) -> Result<(), Error> {
    let result = sqlx::query(
        r#"
        UPDATE fx_durable_evolution.evaluation_tasks
        SET evaluation_robot_id = $2, acknowledged_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(task_id)
    .bind(evaluation_robot_id)
    .execute(tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(task_id));
    }
    Ok(())
}
