use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub(super) struct DbTask {
    pub(super) id: i64,
    pub(super) run_id: Uuid,
    pub(super) robot_name: String,
    pub(super) description: String,
    pub(super) life_timeout: f64,
    pub(super) submitted_at: DateTime<Utc>,
}

/// A robot waiting to be simulated.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub run_id: Uuid,
    pub robot_name: String,
    pub description: String,
    pub life_timeout: f64,
    pub submitted_at: DateTime<Utc>,
}

impl From<DbTask> for Task {
    fn from(task: DbTask) -> Self {
        Task {
            id: task.id,
            run_id: task.run_id,
            robot_name: task.robot_name,
            description: task.description,
            life_timeout: task.life_timeout,
            submitted_at: task.submitted_at,
        }
    }
}
