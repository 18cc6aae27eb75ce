use super::BehaviorMeasurements;
use serde::{Deserialize, Serialize};

/// Fitness reported for a run that was acknowledged but left no usable telemetry.
pub const NO_TELEMETRY_FITNESS: f64 = -1.0;

/// Fitness reported for a body discarded by the collision pre-check.
pub const DISCARDED_FITNESS: f64 = 0.0;

/// Result of evaluating one phenotype.
///
/// The variants keep apart the cases that a single number would conflate: a measured
/// fitness, a run without telemetry, a deliberately skipped body and an evaluation that
/// never completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// The simulator ran the phenotype and recorded a trajectory.
    Measured {
        fitness: f64,
        behavior: BehaviorMeasurements,
    },
    /// The simulator acknowledged the run but no samples were found.
    NoTelemetry,
    /// The body analyzer found self collisions; the simulator was never asked.
    Discarded { collisions: u32 },
    /// Every attempt timed out or failed.
    Failed,
}

impl Outcome {
    pub fn measured(fitness: f64, behavior: BehaviorMeasurements) -> Self {
        Self::Measured { fitness, behavior }
    }

    /// Numeric fitness used for ranking. `None` only when the evaluation never completed.
    pub fn fitness(&self) -> Option<f64> {
        match self {
            Outcome::Measured { fitness, .. } => Some(*fitness),
            Outcome::NoTelemetry => Some(NO_TELEMETRY_FITNESS),
            Outcome::Discarded { .. } => Some(DISCARDED_FITNESS),
            Outcome::Failed => None,
        }
    }

    /// Behavior measurements, `None` in lockstep with a `None` fitness.
    pub fn behavior(&self) -> Option<BehaviorMeasurements> {
        match self {
            Outcome::Measured { behavior, .. } => Some(*behavior),
            Outcome::NoTelemetry | Outcome::Discarded { .. } => Some(BehaviorMeasurements::zero()),
            Outcome::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed)
    }

    /// Reduces the outcomes of several trials of the same phenotype into one.
    ///
    /// Every trial counts in the denominator. Trials without a measurement contribute a
    /// fitness of zero and zero behavior. When no trial was measured the result is
    /// `Failed` if any trial failed, otherwise `NoTelemetry`.
    pub fn mean(trials: &[Outcome]) -> Outcome {
        if trials.is_empty() {
            return Outcome::Failed;
        }

        let mut fitness_sum = 0.0;
        let mut behavior_sum = BehaviorMeasurements::zero();
        let mut measured = 0;

        for trial in trials {
            if let Outcome::Measured { fitness, behavior } = trial {
                fitness_sum += fitness;
                behavior_sum = behavior_sum + *behavior;
                measured += 1;
            }
        }

        if measured == 0 {
            if trials.iter().any(Outcome::is_failed) {
                return Outcome::Failed;
            }
            if let Some(discarded) = trials
                .iter()
                .find(|t| matches!(t, Outcome::Discarded { .. }))
            {
                return discarded.clone();
            }
            return Outcome::NoTelemetry;
        }

        let n = trials.len() as f64;
        Outcome::Measured {
            fitness: fitness_sum / n,
            behavior: behavior_sum / n,
        }
    }
}
