use crate::models::{SimTime, StateSample, Vector3};

#[derive(Debug, sqlx::FromRow)]
pub(super) struct DbRobotState {
    pub(super) time_sec: i64,
    pub(super) time_nsec: i32,
    pub(super) pos_x: f64,
    pub(super) pos_y: f64,
    pub(super) pos_z: f64,
}

impl From<DbRobotState> for StateSample {
    fn from(state: DbRobotState) -> Self {
        StateSample::new(
            SimTime::new(state.time_sec, state.time_nsec),
            Vector3::new(state.pos_x, state.pos_y, state.pos_z),
        )
    }
}
