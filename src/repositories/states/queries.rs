use super::Error;
use super::models::DbRobotState;
use crate::models::StateSample;
use sqlx::PgExecutor;
use tracing::instrument;

#[instrument(level = "debug", skip(tx))]
pub(super) async fn get_states<'tx, E: PgExecutor<'tx>>(
    tx: E,
    evaluation_robot_id: i64,
    evaluation_n: i32,
) -> Result<Vec<StateSample>, Error> {
    let states = sqlx::query_as::<_, DbRobotState>(
        r#"
        SELECT
            time_sec,
            time_nsec,
            pos_x,
            pos_y,
            pos_z
        FROM fx_durable_evolution.robot_states
        WHERE evaluation_robot_id = $1 AND evaluation_n = $2
        ORDER BY time_sec, time_nsec, id
        "#,
    )
    .bind(evaluation_robot_id)
    .bind(evaluation_n)
    .fetch_all(tx)
    .await?;

    Ok(states.into_iter().map(StateSample::from).collect())
}

pub(super) async fn insert_state<'tx, E: PgExecutor<'tx>>(
    tx: E,
    evaluation_robot_id: i64,
    evaluation_n: i32,
    sample: &StateSample,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO fx_durable_evolution.robot_states (
            evaluation_robot_id,
            evaluation_n,
            time_sec,
            time_nsec,
            pos_x,
            pos_y,
            pos_z
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(evaluation_robot_id)
    .bind(evaluation_n)
    .bind(sample.time.sec)
    .bind(sample.time.nsec)
    .bind(sample.position.x)
    .bind(sample.position.y)
    .bind(sample.position.z)
    .execute(tx)
    .await?;

    Ok(())
}
