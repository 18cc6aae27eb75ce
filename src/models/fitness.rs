use super::{Phenotype, Trajectory, Vector3};
use tracing::instrument;

/// Objective function computing the fitness of a phenotype from its recorded trajectory.
///
/// Implementations must be pure: the same trajectory and phenotype give the same value.
pub trait FitnessFunction<P>: Send + Sync {
    fn fitness(&self, trajectory: &Trajectory, phenotype: &P) -> f64;
}

/// Planar displacement divided by the elapsed simulated time.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplacementVelocity;

impl<P> FitnessFunction<P> for DisplacementVelocity {
    fn fitness(&self, trajectory: &Trajectory, _: &P) -> f64 {
        let elapsed = trajectory.elapsed();
        if elapsed <= 0.0 {
            return 0.0;
        }
        trajectory.displacement().planar_norm() / elapsed
    }
}

/// Directed locomotion towards the target set on the phenotype's controller.
///
/// `F = e3 * (e1 / (delta + 1) - penalty * e2)` where `e1` is the distance travelled along
/// the target, `e2` the distance of the end point from the target line, `e3 = e1 / path`
/// and `delta` the angle between target and displacement. Robots that move less than
/// `min_progress` along the target score zero.
#[derive(Debug, Clone, Copy)]
pub struct DirectedLocomotion {
    penalty_factor: f64,
    min_progress: f64,
}

impl Default for DirectedLocomotion {
    fn default() -> Self {
        Self {
            penalty_factor: 0.01,
            min_progress: 0.01,
        }
    }
}

impl DirectedLocomotion {
    pub fn new(penalty_factor: f64, min_progress: f64) -> Self {
        Self {
            penalty_factor,
            min_progress,
        }
    }
}

impl<P: Phenotype> FitnessFunction<P> for DirectedLocomotion {
    #[instrument(level = "debug", skip_all, fields(samples = trajectory.samples().len()))]
    fn fitness(&self, trajectory: &Trajectory, phenotype: &P) -> f64 {
        let target = phenotype.target().unwrap_or(Vector3::new(1.0, 0.0, 0.0));
        let displacement = trajectory.displacement();

        let progress = displacement.planar_dot(&target);
        if progress < self.min_progress {
            return 0.0;
        }

        let length = displacement.planar_norm();
        let cos_delta = (progress / length).clamp(-1.0, 1.0);
        let delta = cos_delta.acos();

        let off_line = Vector3::new(
            progress * target.x - displacement.x,
            progress * target.y - displacement.y,
            0.0,
        )
        .planar_norm();

        let path_length = trajectory.path_length();
        (progress / (f64::EPSILON + path_length))
            * (progress / (delta + 1.0) - self.penalty_factor * off_line)
    }
}

/// The fitness configuration of a run: one function, or one function per objective.
pub enum Objectives<P> {
    Single(Box<dyn FitnessFunction<P>>),
    Multiple(Vec<Box<dyn FitnessFunction<P>>>),
}

impl<P> Objectives<P> {
    pub fn single(fitness: impl FitnessFunction<P> + 'static) -> Self {
        Self::Single(Box::new(fitness))
    }

    /// Number of phenotypes every individual must carry.
    pub fn count(&self) -> usize {
        match self {
            Objectives::Single(_) => 1,
            Objectives::Multiple(functions) => functions.len(),
        }
    }

    pub fn get(&self, objective: usize) -> Option<&dyn FitnessFunction<P>> {
        match self {
            Objectives::Single(function) if objective == 0 => Some(function.as_ref()),
            Objectives::Single(_) => None,
            Objectives::Multiple(functions) => functions.get(objective).map(|f| f.as_ref()),
        }
    }

    pub fn is_multi_objective(&self) -> bool {
        matches!(self, Objectives::Multiple(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SimTime, StateSample};
    use crate::testing::TestPhenotype;

    fn straight(dx: f64, dy: f64, seconds: i64) -> Trajectory {
        Trajectory::new(vec![
            StateSample::new(SimTime::new(0, 0), Vector3::zero()),
            StateSample::new(SimTime::new(seconds, 0), Vector3::new(dx, dy, 0.0)),
        ])
    }

    #[test]
    fn it_computes_displacement_velocity() {
        let phenotype = TestPhenotype::new("robot", 0.0);
        let fitness = DisplacementVelocity.fitness(&straight(3.0, 4.0, 10), &phenotype);
        assert_eq!(fitness, 0.5);
    }

    #[test]
    fn it_rewards_moving_along_the_target() {
        let mut phenotype = TestPhenotype::new("robot", 0.0);
        phenotype.set_target(Vector3::new(1.0, 0.0, 0.0));

        let fitness = DirectedLocomotion::default().fitness(&straight(2.0, 0.0, 10), &phenotype);
        // e3 = 1, delta = 0, no lateral error
        assert!((fitness - 2.0).abs() < 1e-9);
    }

    #[test]
    fn it_scores_zero_when_moving_away_from_the_target() {
        let mut phenotype = TestPhenotype::new("robot", 0.0);
        phenotype.set_target(Vector3::new(0.0, 1.0, 0.0));

        let fitness = DirectedLocomotion::default().fitness(&straight(0.0, -2.0, 10), &phenotype);
        assert_eq!(fitness, 0.0);
    }

    #[test]
    fn it_penalizes_lateral_drift() {
        let mut phenotype = TestPhenotype::new("robot", 0.0);
        phenotype.set_target(Vector3::new(1.0, 0.0, 0.0));

        let straight_ahead =
            DirectedLocomotion::default().fitness(&straight(2.0, 0.0, 10), &phenotype);
        let drifting = DirectedLocomotion::default().fitness(&straight(2.0, 1.0, 10), &phenotype);
        assert!(drifting < straight_ahead);
    }

    #[test]
    fn it_counts_objectives() {
        let single: Objectives<TestPhenotype> = Objectives::single(DisplacementVelocity);
        assert_eq!(single.count(), 1);
        assert!(single.get(0).is_some());
        assert!(single.get(1).is_none());

        let multiple: Objectives<TestPhenotype> = Objectives::Multiple(vec![
            Box::new(DisplacementVelocity),
            Box::new(DirectedLocomotion::default()),
        ]);
        assert_eq!(multiple.count(), 2);
        assert!(multiple.is_multi_objective());
        assert!(multiple.get(1).is_some());
    }
}
