use crate::models::{BoundingBox, Trajectory};
use futures::future::BoxFuture;

/// Id the simulator assigns to an acknowledged submission.
pub type RemoteId = i64;

/// Transport that hands robot descriptions to the simulator.
///
/// `submit` resolves once the simulator acknowledged the robot and returns the id under
/// which its samples are recorded. It may never resolve; the caller bounds the wait.
pub trait Broker: Send + Sync {
    fn submit<'a>(
        &'a self,
        robot_name: &'a str,
        description: String,
        life_timeout: f64,
    ) -> BoxFuture<'a, Result<RemoteId, anyhow::Error>>;
}

/// Store of the samples recorded by the simulator.
pub trait ResultStore: Send + Sync {
    /// Samples of one evaluation run, ordered by simulated time. Empty when none were
    /// recorded.
    fn query(
        &self,
        remote_id: RemoteId,
        run_marker: i32,
    ) -> BoxFuture<'_, Result<Trajectory, anyhow::Error>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyAnalysis {
    pub collisions: u32,
    pub bounding_box: Option<BoundingBox>,
}

/// Static analysis of a body before it is sent to the simulator.
pub trait BodyAnalyzer: Send + Sync {
    fn analyze<'a>(&'a self, description: &'a str)
    -> BoxFuture<'a, Result<BodyAnalysis, anyhow::Error>>;
}
